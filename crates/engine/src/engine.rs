use frameline_assets::AssetManager;
use frameline_kernel::World;
use frameline_render::{
    FrameReport, LevelResourceDesc, PipelineStrategy, RenderConfig, RenderDevice, RenderSystem,
};

use crate::bridge::{Published, publish_events};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::timing::FpsCounter;

/// The engine context: the world, the render system and the frame loop.
///
/// One frame is a logic tick, one swap, then one render tick, all on the
/// calling thread.
#[derive(Debug)]
pub struct Engine<D> {
    world: World,
    render: RenderSystem<D>,
    assets: AssetManager,
    level_resource: LevelResourceDesc,
    fps: FpsCounter,
}

impl<D: RenderDevice> Engine<D> {
    /// Start from a config file's settings. Configuration errors are fatal.
    pub fn start(config: &EngineConfig, device: D) -> Result<Self, EngineError> {
        let assets = config.asset_manager();
        let render_config = config.render_config(&assets)?;
        Self::with_render_config(render_config, assets, device)
    }

    pub fn with_render_config(
        config: RenderConfig,
        assets: AssetManager,
        device: D,
    ) -> Result<Self, EngineError> {
        let level_resource = config.global.level_resource_desc(&assets);
        let render = RenderSystem::new(config, &assets, device)?;
        tracing::info!(root = %assets.root().display(), "engine started");
        Ok(Self {
            world: World::new(),
            render,
            assets,
            level_resource,
            fps: FpsCounter::new(),
        })
    }

    /// Run one full frame. `delta_time` is in seconds.
    pub fn tick_one_frame(&mut self, delta_time: f32) -> FrameReport {
        let _span = tracing::info_span!("frame", tick = self.world.tick()).entered();
        self.logical_tick();
        self.fps.update(delta_time);
        if !self.render.swap_logic_render_data() {
            tracing::debug!("swap deferred, logic changes carried to next frame");
        }
        self.render.tick()
    }

    /// Step the world and publish its changes to the producer side.
    pub fn logical_tick(&mut self) -> Published {
        self.world.step();
        let events = self.world.drain_events();
        publish_events(&self.world, &events, self.render.logic_swap_data())
    }

    /// Unload the world and every render-side level resource, then queue
    /// the level resource for re-upload.
    pub fn reload_level(&mut self) {
        self.world.unload();
        self.world.drain_events();
        self.render.clear_for_level_reloading();
        self.render
            .logic_swap_data()
            .set_level_resource(self.level_resource.clone());
        tracing::info!("level reloaded");
    }

    pub fn set_pipeline_strategy(&mut self, strategy: PipelineStrategy) {
        self.render.set_pipeline_strategy(strategy);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn render(&self) -> &RenderSystem<D> {
        &self.render
    }

    pub fn render_mut(&mut self) -> &mut RenderSystem<D> {
        &mut self.render
    }

    pub fn assets(&self) -> &AssetManager {
        &self.assets
    }

    pub fn fps(&self) -> u32 {
        self.fps.fps()
    }

    /// Release level resources and hand back the device.
    pub fn shutdown(mut self) -> D {
        self.render.clear_for_level_reloading();
        tracing::info!(frames = self.fps.frame_count(), "engine shut down");
        self.render.into_device()
    }
}
