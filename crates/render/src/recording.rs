use frameline_common::Aabb;
use std::collections::HashMap;
use std::fmt::Write as _;

use crate::desc::LevelResourceDesc;
use crate::device::{MaterialHandle, MeshHandle, MeshUpload, PassId, RenderDevice};
use crate::entity::RenderEntity;
use crate::error::DeviceError;
use crate::pipeline::FramePassData;
use crate::resource::{MaterialSourceDesc, MeshSourceDesc, PerFrameUniforms};

/// One call made against a [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    UploadGlobal { brdf_map: String },
    UploadMesh { file: String, ok: bool },
    UploadMaterial { base_color: String, ok: bool },
    UploadInstance { instance: u64 },
    UploadPerFrame { entity_count: u32 },
    BeginFrame,
    Pass { pass: PassId, instances: usize },
    ReleaseLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceStats {
    pub frames: u64,
    pub meshes: usize,
    pub materials: usize,
    pub instance_uploads: usize,
    pub failed_uploads: usize,
}

/// Headless render device that records every call.
///
/// Stands in for a GPU backend in the CLI and in tests. Uploads succeed
/// unless a file matches a suffix registered with [`fail_on`](Self::fail_on).
#[derive(Debug, Default)]
pub struct RecordingDevice {
    calls: Vec<DeviceCall>,
    failing: Vec<String>,
    mesh_bounds: HashMap<String, Aabb>,
    uploads: HashMap<String, usize>,
    stats: DeviceStats,
    last_frame: Vec<PassId>,
    next_handle: u32,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report `bounds` for meshes whose file ends with `suffix`.
    pub fn with_mesh_bounds(mut self, suffix: impl Into<String>, bounds: Aabb) -> Self {
        self.mesh_bounds.insert(suffix.into(), bounds);
        self
    }

    /// Fail uploads of any file ending with `suffix`.
    pub fn fail_on(mut self, suffix: impl Into<String>) -> Self {
        self.failing.push(suffix.into());
        self
    }

    /// Successful uploads of files ending with `suffix`.
    pub fn upload_count_for(&self, suffix: &str) -> usize {
        self.uploads
            .iter()
            .filter(|(file, _)| file.ends_with(suffix))
            .map(|(_, count)| count)
            .sum()
    }

    pub fn calls(&self) -> &[DeviceCall] {
        &self.calls
    }

    pub fn stats(&self) -> DeviceStats {
        self.stats
    }

    /// Passes executed since the last `begin_frame`.
    pub fn passes(&self) -> &[PassId] {
        &self.last_frame
    }

    fn fails(&self, file: &str) -> bool {
        self.failing.iter().any(|suffix| file.ends_with(suffix.as_str()))
    }

    fn handle(&mut self) -> u32 {
        self.next_handle += 1;
        self.next_handle
    }

    fn record_upload(&mut self, file: &str) {
        *self.uploads.entry(file.to_owned()).or_default() += 1;
    }

    /// Human-readable report of what the device has seen.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=== Device (frames={}) ===", self.stats.frames);
        let _ = writeln!(
            out,
            "Meshes: {}  Materials: {}  Instance uploads: {}  Failed: {}",
            self.stats.meshes,
            self.stats.materials,
            self.stats.instance_uploads,
            self.stats.failed_uploads
        );
        let passes: Vec<String> = self.last_frame.iter().map(|p| format!("{p:?}")).collect();
        let _ = writeln!(out, "Last frame: {}", passes.join(" > "));
        out
    }
}

impl RenderDevice for RecordingDevice {
    fn upload_global_resource(&mut self, desc: &LevelResourceDesc) -> Result<(), DeviceError> {
        self.calls.push(DeviceCall::UploadGlobal {
            brdf_map: desc.ibl.brdf_map.clone(),
        });
        if self.fails(&desc.ibl.brdf_map) {
            self.stats.failed_uploads += 1;
            return Err(DeviceError::AssetMissing(desc.ibl.brdf_map.clone()));
        }
        Ok(())
    }

    fn upload_mesh(&mut self, source: &MeshSourceDesc) -> Result<MeshUpload, DeviceError> {
        let ok = !self.fails(&source.mesh_file);
        self.calls.push(DeviceCall::UploadMesh {
            file: source.mesh_file.clone(),
            ok,
        });
        if !ok {
            self.stats.failed_uploads += 1;
            return Err(DeviceError::AssetMissing(source.mesh_file.clone()));
        }
        self.record_upload(&source.mesh_file);
        self.stats.meshes += 1;
        let bounding_box = self
            .mesh_bounds
            .iter()
            .find(|(suffix, _)| source.mesh_file.ends_with(suffix.as_str()))
            .map(|(_, bounds)| *bounds)
            .unwrap_or(Aabb::UNIT_CUBE);
        Ok(MeshUpload {
            handle: MeshHandle(self.handle()),
            bounding_box,
        })
    }

    fn upload_material(
        &mut self,
        source: &MaterialSourceDesc,
    ) -> Result<MaterialHandle, DeviceError> {
        let failed = source.texture_files().find(|f| self.fails(f)).map(str::to_owned);
        self.calls.push(DeviceCall::UploadMaterial {
            base_color: source.base_color_file.clone(),
            ok: failed.is_none(),
        });
        if let Some(file) = failed {
            self.stats.failed_uploads += 1;
            return Err(DeviceError::Upload {
                resource: source.base_color_file.clone(),
                reason: format!("texture {file} missing"),
            });
        }
        self.record_upload(&source.base_color_file);
        self.stats.materials += 1;
        Ok(MaterialHandle(self.handle()))
    }

    fn upload_per_instance(&mut self, entity: &RenderEntity) {
        self.stats.instance_uploads += 1;
        self.calls.push(DeviceCall::UploadInstance {
            instance: entity.instance_id.0,
        });
    }

    fn upload_per_frame(&mut self, uniforms: &PerFrameUniforms) {
        self.calls.push(DeviceCall::UploadPerFrame {
            entity_count: uniforms.entity_count,
        });
    }

    fn begin_frame(&mut self) {
        self.stats.frames += 1;
        self.last_frame.clear();
        self.calls.push(DeviceCall::BeginFrame);
    }

    fn execute_pass(&mut self, pass: PassId, data: &FramePassData<'_>) {
        self.last_frame.push(pass);
        self.calls.push(DeviceCall::Pass {
            pass,
            instances: data.instance_count(pass),
        });
    }

    fn release_level_resources(&mut self) {
        self.calls.push(DeviceCall::ReleaseLevel);
    }
}
