use frameline_assets::AssetManager;
use frameline_common::ObjectId;

use crate::camera::RenderCamera;
use crate::config::RenderConfig;
use crate::device::{PassId, RenderDevice};
use crate::error::RenderError;
use crate::guid::Guid;
use crate::pipeline::{PipelineStrategy, RenderPipeline};
use crate::resource::RenderResource;
use crate::scene::{DirectionalLight, RenderScene};
use crate::swap::{FrameDelta, SwapBuffer};
use crate::uploader::{DrainStats, FrameUploader};

/// Screen rectangle the engine content is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Outcome of one render tick.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameReport {
    pub frame_index: u64,
    pub strategy: PipelineStrategy,
    pub drain: DrainStats,
    pub entity_count: usize,
    pub visible: usize,
    pub passes: Vec<PassId>,
}

/// The render side of the engine.
///
/// Generic over the device chosen at startup. The logic side only ever
/// touches [`logic_swap_data`](Self::logic_swap_data); everything else is
/// mutated inside [`tick`](Self::tick).
#[derive(Debug)]
pub struct RenderSystem<D> {
    device: D,
    swap: SwapBuffer,
    scene: RenderScene,
    camera: RenderCamera,
    resource: RenderResource,
    pipeline: RenderPipeline,
    viewport: Viewport,
    frame_index: u64,
}

impl<D: RenderDevice> RenderSystem<D> {
    /// Start the render system and upload the global rendering resource.
    pub fn new(config: RenderConfig, assets: &AssetManager, mut device: D) -> Result<Self, RenderError> {
        let global = &config.global;
        global.validate()?;

        let camera = RenderCamera::from_config(&global.camera_config);
        let light = DirectionalLight {
            direction: global.directional_light.direction.normalize(),
            color: global.directional_light.color,
        };
        let scene = RenderScene::new(global.ambient_light, light);
        let mut resource = RenderResource::new(assets.clone());
        resource.upload_global_resource(&mut device, global.level_resource_desc(assets))?;

        tracing::info!(
            strategy = %config.strategy,
            fxaa = config.enable_fxaa,
            root = %assets.root().display(),
            "render system started"
        );
        Ok(Self {
            device,
            swap: SwapBuffer::new(),
            scene,
            camera,
            resource,
            pipeline: RenderPipeline::new(config.strategy, config.enable_fxaa),
            viewport: Viewport::default(),
            frame_index: 0,
        })
    }

    /// Drain the render side, then run every pass of the active strategy.
    pub fn tick(&mut self) -> FrameReport {
        let _span = tracing::info_span!("render_tick", frame = self.frame_index).entered();

        let drain = FrameUploader {
            scene: &mut self.scene,
            resource: &mut self.resource,
            camera: &mut self.camera,
            particles: self.pipeline.particle_pass_mut(),
            device: &mut self.device,
        }
        .drain(self.swap.readable());

        self.device.begin_frame();
        self.scene.update_visible_objects(&self.camera);
        self.resource.update_per_frame_buffer(&self.scene, &self.camera);
        self.device.upload_per_frame(self.resource.per_frame());

        let data = self.pipeline.prepare_pass_data(&self.scene, &self.resource);
        let passes = self.pipeline.render(&mut self.device, &data);
        self.pipeline.end_frame();

        let report = FrameReport {
            frame_index: self.frame_index,
            strategy: self.pipeline.strategy(),
            drain,
            entity_count: self.scene.entity_count(),
            visible: self.scene.visible().main_camera.len(),
            passes,
        };
        self.frame_index += 1;
        report
    }

    /// Exchange the logic and render sides. `false` if the render side still
    /// holds undrained payloads.
    pub fn swap_logic_render_data(&mut self) -> bool {
        self.swap.swap()
    }

    /// The producer side of the swap buffer.
    pub fn logic_swap_data(&mut self) -> &mut FrameDelta {
        self.swap.writable()
    }

    /// Read-only view of what the next tick will drain.
    pub fn pending_swap_data(&self) -> &FrameDelta {
        self.swap.pending()
    }

    pub fn set_pipeline_strategy(&mut self, strategy: PipelineStrategy) {
        self.pipeline.set_strategy(strategy);
    }

    pub fn update_engine_content_viewport(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.viewport = Viewport {
            x,
            y,
            width,
            height,
        };
        self.camera.set_aspect(width / height);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Object that owns a drawn instance, for picking.
    pub fn object_id_of_instance(&self, instance_id: Guid) -> Option<ObjectId> {
        self.scene.object_id_of(instance_id)
    }

    /// Drop every level-scoped entity, identity and resource.
    pub fn clear_for_level_reloading(&mut self) {
        self.scene.clear_for_level_reloading();
        self.resource.clear_level();
        self.pipeline.particle_pass_mut().clear();
        self.device.release_level_resources();
        self.swap.clear();
        tracing::info!("render system cleared for level reload");
    }

    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }

    pub fn camera(&self) -> &RenderCamera {
        &self.camera
    }

    pub fn resource(&self) -> &RenderResource {
        &self.resource
    }

    pub fn pipeline(&self) -> &RenderPipeline {
        &self.pipeline
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn into_device(self) -> D {
        self.device
    }
}
