//! Render core: logic/render hand-off, resource dedup and pass orchestration.
//!
//! # Invariants
//! - The swap buffer is the only state both sides touch, and only
//!   [`SwapBuffer::swap`] touches both of its halves.
//! - The scene table and the identity allocators are mutated only while the
//!   render side drains its delta, strictly before any pass runs.
//! - A mesh or material key is uploaded to the device at most once per level.
//! - Identities are never reused within a process run.

pub mod camera;
pub mod config;
pub mod desc;
pub mod device;
pub mod entity;
pub mod error;
pub mod guid;
pub mod particle;
pub mod pipeline;
pub mod recording;
pub mod resource;
pub mod scene;
pub mod swap;
pub mod system;
pub mod uploader;

pub use camera::{Frustum, RenderCamera};
pub use config::{CameraConfig, CameraPose, DirectionalLightDesc, GlobalRenderingRes, RenderConfig};
pub use desc::{
    CameraSwapData, EmitterTickRequest, EmitterTransformDesc, EmitterTransformRequest,
    GameObjectDesc, GameObjectPartDesc, GameObjectPartId, LevelResourceDesc,
    ParticleSubmitRequest,
};
pub use device::{MaterialHandle, MeshHandle, MeshUpload, PassId, RenderDevice};
pub use entity::RenderEntity;
pub use error::{ConfigError, DeviceError, RenderError};
pub use guid::{Guid, GuidAllocator};
pub use pipeline::{DrawBatch, FramePassData, PipelineStrategy, RenderPipeline};
pub use recording::{DeviceCall, DeviceStats, RecordingDevice};
pub use resource::{MaterialSourceDesc, MeshSourceDesc, PerFrameUniforms, RenderResource};
pub use scene::{DirectionalLight, RenderScene};
pub use swap::{FrameDelta, SwapBuffer, SwapDomain};
pub use system::{FrameReport, RenderSystem, Viewport};
pub use uploader::{DrainStats, FrameUploader};

pub fn crate_info() -> &'static str {
    "frameline-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
