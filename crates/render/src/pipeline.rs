//! Pass orchestration for the forward and deferred strategies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::desc::LevelResourceDesc;
use crate::device::{MaterialHandle, MeshHandle, PassId, RenderDevice};
use crate::entity::RenderEntity;
use crate::error::ConfigError;
use crate::guid::Guid;
use crate::particle::{ParticleFrameData, ParticlePass};
use crate::resource::{PerFrameUniforms, RenderResource};
use crate::scene::RenderScene;

/// Rendering strategy, fixed at startup and switchable at runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStrategy {
    Forward,
    #[default]
    Deferred,
}

impl FromStr for PipelineStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(Self::Forward),
            "deferred" => Ok(Self::Deferred),
            _ => Err(ConfigError::UnknownPipeline(s.to_owned())),
        }
    }
}

impl fmt::Display for PipelineStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forward => f.write_str("forward"),
            Self::Deferred => f.write_str("deferred"),
        }
    }
}

/// Instances sharing one material and one mesh, drawn together.
#[derive(Debug, Clone)]
pub struct DrawBatch<'a> {
    pub material: Guid,
    pub mesh: Guid,
    pub mesh_handle: MeshHandle,
    pub material_handle: MaterialHandle,
    pub instances: Vec<&'a RenderEntity>,
}

/// Read-only inputs every pass of one frame draws from.
#[derive(Debug, Clone)]
pub struct FramePassData<'a> {
    pub per_frame: &'a PerFrameUniforms,
    pub opaque: Vec<DrawBatch<'a>>,
    pub translucent: Vec<DrawBatch<'a>>,
    pub shadow_casters: Vec<DrawBatch<'a>>,
    pub particles: ParticleFrameData,
    pub global: Option<&'a LevelResourceDesc>,
}

impl FramePassData<'_> {
    /// Geometry batches a pass consumes. Screen-space passes get none.
    pub fn batches_for(&self, pass: PassId) -> &[DrawBatch<'_>] {
        match pass {
            PassId::DirectionalShadow => &self.shadow_casters,
            PassId::ForwardLighting | PassId::GBuffer => &self.opaque,
            PassId::TransparentForward => &self.translucent,
            _ => &[],
        }
    }

    pub fn instance_count(&self, pass: PassId) -> usize {
        self.batches_for(pass).iter().map(|b| b.instances.len()).sum()
    }
}

type BatchKey = (Guid, Guid);

fn collect_batches<'a>(
    entities: impl Iterator<Item = &'a RenderEntity>,
    resource: &RenderResource,
) -> Vec<DrawBatch<'a>> {
    let mut batches: BTreeMap<BatchKey, DrawBatch<'a>> = BTreeMap::new();
    for entity in entities {
        let key = (entity.material_asset_id, entity.mesh_asset_id);
        if let Some(batch) = batches.get_mut(&key) {
            batch.instances.push(entity);
            continue;
        }
        let (Some(mesh_handle), Some(material_handle)) = (
            resource.mesh_handle(entity.mesh_asset_id),
            resource.material_handle(entity.material_asset_id),
        ) else {
            tracing::warn!(instance = %entity.instance_id, "entity without resident resources, not drawn");
            continue;
        };
        batches.insert(
            key,
            DrawBatch {
                material: entity.material_asset_id,
                mesh: entity.mesh_asset_id,
                mesh_handle,
                material_handle,
                instances: vec![entity],
            },
        );
    }
    batches.into_values().collect()
}

/// Orders the passes of a frame for the active strategy.
#[derive(Debug)]
pub struct RenderPipeline {
    strategy: PipelineStrategy,
    enable_fxaa: bool,
    particle: ParticlePass,
}

impl RenderPipeline {
    pub fn new(strategy: PipelineStrategy, enable_fxaa: bool) -> Self {
        Self {
            strategy,
            enable_fxaa,
            particle: ParticlePass::default(),
        }
    }

    pub fn strategy(&self) -> PipelineStrategy {
        self.strategy
    }

    /// Takes effect on the next frame.
    pub fn set_strategy(&mut self, strategy: PipelineStrategy) {
        if self.strategy != strategy {
            tracing::info!(from = %self.strategy, to = %strategy, "pipeline strategy changed");
        }
        self.strategy = strategy;
    }

    pub fn fxaa_enabled(&self) -> bool {
        self.enable_fxaa
    }

    pub fn particle_pass(&self) -> &ParticlePass {
        &self.particle
    }

    pub fn particle_pass_mut(&mut self) -> &mut ParticlePass {
        &mut self.particle
    }

    /// Batch the culled scene by `(material, mesh)`.
    pub fn prepare_pass_data<'a>(
        &self,
        scene: &'a RenderScene,
        resource: &'a RenderResource,
    ) -> FramePassData<'a> {
        let visible = scene.visible();
        let main: Vec<&RenderEntity> = visible
            .main_camera
            .iter()
            .filter_map(|guid| scene.entity(*guid))
            .collect();
        let opaque = collect_batches(main.iter().copied().filter(|e| !e.translucent), resource);
        let translucent = collect_batches(main.iter().copied().filter(|e| e.translucent), resource);
        let shadow_casters = collect_batches(
            visible
                .directional_light
                .iter()
                .filter_map(|guid| scene.entity(*guid))
                .filter(|e| !e.translucent),
            resource,
        );
        FramePassData {
            per_frame: resource.per_frame(),
            opaque,
            translucent,
            shadow_casters,
            particles: self.particle.frame_data(),
            global: resource.global(),
        }
    }

    /// Passes of one frame, in execution order.
    pub fn pass_sequence(&self) -> Vec<PassId> {
        self.passes_for(self.strategy)
    }

    fn passes_for(&self, strategy: PipelineStrategy) -> Vec<PassId> {
        let mut passes = vec![PassId::DirectionalShadow];
        match strategy {
            PipelineStrategy::Forward => passes.push(PassId::ForwardLighting),
            PipelineStrategy::Deferred => {
                passes.extend([PassId::GBuffer, PassId::DeferredLighting])
            }
        }
        passes.extend([
            PassId::Skybox,
            PassId::TransparentForward,
            PassId::Particle,
            PassId::ToneMapping,
            PassId::ColorGrading,
        ]);
        if self.enable_fxaa {
            passes.push(PassId::Fxaa);
        }
        passes
    }

    fn execute<D: RenderDevice>(
        &self,
        device: &mut D,
        data: &FramePassData<'_>,
        passes: Vec<PassId>,
    ) -> Vec<PassId> {
        for pass in &passes {
            tracing::trace!(?pass, instances = data.instance_count(*pass), "executing pass");
            device.execute_pass(*pass, data);
        }
        passes
    }

    fn forward_render<D: RenderDevice>(&self, device: &mut D, data: &FramePassData<'_>) -> Vec<PassId> {
        self.execute(device, data, self.passes_for(PipelineStrategy::Forward))
    }

    fn deferred_render<D: RenderDevice>(&self, device: &mut D, data: &FramePassData<'_>) -> Vec<PassId> {
        self.execute(device, data, self.passes_for(PipelineStrategy::Deferred))
    }

    /// Run the passes of the active strategy.
    pub fn render<D: RenderDevice>(&self, device: &mut D, data: &FramePassData<'_>) -> Vec<PassId> {
        match self.strategy {
            PipelineStrategy::Forward => self.forward_render(device, data),
            PipelineStrategy::Deferred => self.deferred_render(device, data),
        }
    }

    pub fn end_frame(&mut self) {
        self.particle.end_frame();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingDevice;
    use frameline_assets::AssetManager;

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!("forward".parse::<PipelineStrategy>().unwrap(), PipelineStrategy::Forward);
        assert_eq!("Deferred".parse::<PipelineStrategy>().unwrap(), PipelineStrategy::Deferred);
        assert!(matches!(
            "clustered".parse::<PipelineStrategy>(),
            Err(ConfigError::UnknownPipeline(_))
        ));
    }

    #[test]
    fn strategy_serde_uses_lowercase() {
        let json = serde_json::to_string(&PipelineStrategy::Forward).unwrap();
        assert_eq!(json, "\"forward\"");
        assert_eq!(PipelineStrategy::Deferred.to_string(), "deferred");
    }

    #[test]
    fn forward_sequence() {
        let pipeline = RenderPipeline::new(PipelineStrategy::Forward, false);
        assert_eq!(
            pipeline.pass_sequence(),
            vec![
                PassId::DirectionalShadow,
                PassId::ForwardLighting,
                PassId::Skybox,
                PassId::TransparentForward,
                PassId::Particle,
                PassId::ToneMapping,
                PassId::ColorGrading,
            ]
        );
    }

    #[test]
    fn deferred_sequence_with_fxaa() {
        let pipeline = RenderPipeline::new(PipelineStrategy::Deferred, true);
        let passes = pipeline.pass_sequence();
        assert_eq!(&passes[..3], &[PassId::DirectionalShadow, PassId::GBuffer, PassId::DeferredLighting]);
        assert_eq!(passes.last(), Some(&PassId::Fxaa));
        assert!(!passes.contains(&PassId::ForwardLighting));
    }

    #[test]
    fn render_runs_configured_strategy_only() {
        let scene = RenderScene::default();
        let resource = RenderResource::new(AssetManager::new("/game"));
        let pipeline = RenderPipeline::new(PipelineStrategy::Forward, false);
        let data = pipeline.prepare_pass_data(&scene, &resource);
        let mut device = RecordingDevice::new();

        let passes = pipeline.render(&mut device, &data);
        assert_eq!(passes, pipeline.pass_sequence());
        assert_eq!(device.passes(), passes.as_slice());
        assert!(!device.passes().contains(&PassId::GBuffer));
        assert_eq!(pipeline.strategy(), PipelineStrategy::Forward);
    }

    #[test]
    fn strategy_switch_changes_sequence() {
        let mut pipeline = RenderPipeline::new(PipelineStrategy::Deferred, false);
        pipeline.set_strategy(PipelineStrategy::Forward);
        assert!(pipeline.pass_sequence().contains(&PassId::ForwardLighting));
    }
}
