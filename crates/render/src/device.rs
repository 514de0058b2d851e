use frameline_common::Aabb;
use serde::{Deserialize, Serialize};

use crate::desc::LevelResourceDesc;
use crate::entity::RenderEntity;
use crate::error::DeviceError;
use crate::pipeline::FramePassData;
use crate::resource::{MaterialSourceDesc, MeshSourceDesc, PerFrameUniforms};

/// Device-side handle of an uploaded mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MeshHandle(pub u32);

/// Device-side handle of an uploaded material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialHandle(pub u32);

/// Result of a mesh upload: the handle plus the mesh-local bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshUpload {
    pub handle: MeshHandle,
    pub bounding_box: Aabb,
}

/// Render passes, in the order they may appear within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassId {
    DirectionalShadow,
    /// Forward strategy: lighting and shading in one pass.
    ForwardLighting,
    /// Deferred strategy: geometry into the G-buffer.
    GBuffer,
    /// Deferred strategy: lighting resolve over the G-buffer.
    DeferredLighting,
    Skybox,
    /// Translucent geometry, always forward shaded.
    TransparentForward,
    Particle,
    ToneMapping,
    ColorGrading,
    Fxaa,
}

/// Capability interface of a graphics backend.
///
/// The render system is generic over one implementation chosen at startup;
/// it never inspects which backend it drives.
pub trait RenderDevice {
    /// Upload level-wide textures (IBL, color grading).
    fn upload_global_resource(&mut self, desc: &LevelResourceDesc) -> Result<(), DeviceError>;

    /// Load and upload a mesh, reporting its bounds.
    fn upload_mesh(&mut self, source: &MeshSourceDesc) -> Result<MeshUpload, DeviceError>;

    fn upload_material(&mut self, source: &MaterialSourceDesc)
    -> Result<MaterialHandle, DeviceError>;

    /// Per-instance data (model matrix, joint matrices) of one entity.
    fn upload_per_instance(&mut self, entity: &RenderEntity);

    fn upload_per_frame(&mut self, uniforms: &PerFrameUniforms);

    /// Prepare the command context for a new frame.
    fn begin_frame(&mut self);

    fn execute_pass(&mut self, pass: PassId, data: &FramePassData<'_>);

    /// Drop every mesh and material uploaded for the current level.
    fn release_level_resources(&mut self) {}
}
