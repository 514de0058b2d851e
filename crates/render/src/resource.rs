//! Device-resident resource bookkeeping.
//!
//! Meshes and materials are uploaded once per distinct source key. A key
//! whose asset cannot be loaded is mapped to an engine placeholder instead,
//! so it is still never uploaded twice.

use bytemuck::{Pod, Zeroable};
use frameline_assets::AssetManager;
use frameline_common::{Aabb, MaterialDesc, MeshDesc};
use std::collections::HashMap;

use crate::camera::RenderCamera;
use crate::desc::LevelResourceDesc;
use crate::device::{MaterialHandle, MeshHandle, MeshUpload, RenderDevice};
use crate::error::DeviceError;
use crate::guid::Guid;
use crate::scene::RenderScene;

const PLACEHOLDER_MESH: &str = "asset/mesh/default/cube.obj";
const DEFAULT_BASE_COLOR: &str = "asset/texture/default/albedo.jpg";
const DEFAULT_METALLIC_ROUGHNESS: &str = "asset/texture/default/mr.jpg";
const DEFAULT_NORMAL: &str = "asset/texture/default/normal.jpg";

/// Content key of a mesh resource: the resolved mesh file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshSourceDesc {
    pub mesh_file: String,
}

/// Content key of a material resource: the resolved texture paths.
///
/// Empty strings mark unused slots. Translucency is a per-entity draw flag
/// and stays out of the key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialSourceDesc {
    pub base_color_file: String,
    pub metallic_roughness_file: String,
    pub normal_file: String,
    pub occlusion_file: String,
    pub emissive_file: String,
}

impl MaterialSourceDesc {
    pub fn texture_files(&self) -> impl Iterator<Item = &str> {
        [
            &self.base_color_file,
            &self.metallic_roughness_file,
            &self.normal_file,
            &self.occlusion_file,
            &self.emissive_file,
        ]
        .into_iter()
        .map(String::as_str)
        .filter(|f| !f.is_empty())
    }
}

/// Uniform block uploaded once per frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PerFrameUniforms {
    pub proj_view: [[f32; 4]; 4],
    pub camera_position: [f32; 3],
    pub _padding_camera: f32,
    pub ambient_light: [f32; 3],
    pub entity_count: u32,
    pub directional_light_direction: [f32; 3],
    pub _padding_direction: f32,
    pub directional_light_color: [f32; 3],
    pub _padding_color: f32,
}

impl Default for PerFrameUniforms {
    fn default() -> Self {
        Self::zeroed()
    }
}

/// Outcome of a first-time resource load.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadedMesh {
    pub bounding_box: Aabb,
    /// The requested asset failed and the placeholder stands in for it.
    pub placeholder: bool,
}

/// Caches of everything uploaded to the device for the current level.
#[derive(Debug)]
pub struct RenderResource {
    assets: AssetManager,
    default_material: MaterialSourceDesc,
    placeholder_mesh_source: MeshSourceDesc,
    placeholder_mesh: Option<MeshUpload>,
    placeholder_material: Option<MaterialHandle>,
    mesh_handles: HashMap<Guid, MeshHandle>,
    material_handles: HashMap<Guid, MaterialHandle>,
    bounding_boxes: HashMap<MeshSourceDesc, Aabb>,
    global: Option<LevelResourceDesc>,
    per_frame: PerFrameUniforms,
}

impl RenderResource {
    pub fn new(assets: AssetManager) -> Self {
        let default_material = MaterialSourceDesc {
            base_color_file: assets.full_path_string(DEFAULT_BASE_COLOR),
            metallic_roughness_file: assets.full_path_string(DEFAULT_METALLIC_ROUGHNESS),
            normal_file: assets.full_path_string(DEFAULT_NORMAL),
            ..MaterialSourceDesc::default()
        };
        let placeholder_mesh_source = MeshSourceDesc {
            mesh_file: assets.full_path_string(PLACEHOLDER_MESH),
        };
        Self {
            assets,
            default_material,
            placeholder_mesh_source,
            placeholder_mesh: None,
            placeholder_material: None,
            mesh_handles: HashMap::new(),
            material_handles: HashMap::new(),
            bounding_boxes: HashMap::new(),
            global: None,
            per_frame: PerFrameUniforms::default(),
        }
    }

    pub fn default_material(&self) -> &MaterialSourceDesc {
        &self.default_material
    }

    pub fn mesh_source(&self, mesh: &MeshDesc) -> MeshSourceDesc {
        MeshSourceDesc {
            mesh_file: self.assets.full_path_string(&mesh.mesh_file),
        }
    }

    /// Material key for a part. Parts without a texture set share the
    /// default material.
    pub fn material_source(&self, material: &MaterialDesc) -> MaterialSourceDesc {
        let Some(textures) = &material.textures else {
            return self.default_material.clone();
        };
        let resolve = |url: &str| {
            if url.is_empty() {
                String::new()
            } else {
                self.assets.full_path_string(url)
            }
        };
        MaterialSourceDesc {
            base_color_file: resolve(&textures.base_color),
            metallic_roughness_file: resolve(&textures.metallic_roughness),
            normal_file: resolve(&textures.normal),
            occlusion_file: resolve(&textures.occlusion),
            emissive_file: resolve(&textures.emissive),
        }
    }

    pub fn upload_global_resource<D: RenderDevice>(
        &mut self,
        device: &mut D,
        desc: LevelResourceDesc,
    ) -> Result<(), DeviceError> {
        device.upload_global_resource(&desc)?;
        tracing::debug!(brdf = %desc.ibl.brdf_map, "global resource uploaded");
        self.global = Some(desc);
        Ok(())
    }

    pub fn global(&self) -> Option<&LevelResourceDesc> {
        self.global.as_ref()
    }

    /// Upload a mesh seen for the first time and cache its bounds.
    ///
    /// Falls back to the placeholder mesh when the asset fails; errors only
    /// if the placeholder cannot be uploaded either.
    pub fn load_mesh<D: RenderDevice>(
        &mut self,
        device: &mut D,
        mesh_id: Guid,
        source: &MeshSourceDesc,
    ) -> Result<LoadedMesh, DeviceError> {
        let is_placeholder = *source == self.placeholder_mesh_source;
        let uploaded = match self.placeholder_mesh {
            Some(upload) if is_placeholder => Ok(upload),
            _ => device.upload_mesh(source),
        };
        let (upload, placeholder) = match uploaded {
            Ok(upload) => {
                tracing::debug!(mesh = %source.mesh_file, %mesh_id, "mesh resident");
                if is_placeholder {
                    self.placeholder_mesh = Some(upload);
                }
                (upload, false)
            }
            Err(err) if !is_placeholder => {
                tracing::warn!(mesh = %source.mesh_file, %err, "mesh failed to load, using placeholder");
                (self.placeholder_mesh(device)?, true)
            }
            Err(err) => return Err(err),
        };
        self.mesh_handles.insert(mesh_id, upload.handle);
        self.bounding_boxes
            .insert(source.clone(), upload.bounding_box);
        Ok(LoadedMesh {
            bounding_box: upload.bounding_box,
            placeholder,
        })
    }

    fn placeholder_mesh<D: RenderDevice>(&mut self, device: &mut D) -> Result<MeshUpload, DeviceError> {
        if let Some(upload) = self.placeholder_mesh {
            return Ok(upload);
        }
        let upload = device.upload_mesh(&self.placeholder_mesh_source)?;
        self.placeholder_mesh = Some(upload);
        Ok(upload)
    }

    /// Upload a material seen for the first time. Returns `true` when the
    /// default material was substituted.
    pub fn load_material<D: RenderDevice>(
        &mut self,
        device: &mut D,
        material_id: Guid,
        source: &MaterialSourceDesc,
    ) -> Result<bool, DeviceError> {
        let is_default = *source == self.default_material;
        let uploaded = match self.placeholder_material {
            Some(handle) if is_default => Ok(handle),
            _ => device.upload_material(source),
        };
        let (handle, placeholder) = match uploaded {
            Ok(handle) => {
                tracing::debug!(base_color = %source.base_color_file, %material_id, "material resident");
                if is_default {
                    self.placeholder_material = Some(handle);
                }
                (handle, false)
            }
            Err(err) if !is_default => {
                tracing::warn!(base_color = %source.base_color_file, %err, "material failed to load, using default");
                (self.placeholder_material(device)?, true)
            }
            Err(err) => return Err(err),
        };
        self.material_handles.insert(material_id, handle);
        Ok(placeholder)
    }

    fn placeholder_material<D: RenderDevice>(
        &mut self,
        device: &mut D,
    ) -> Result<MaterialHandle, DeviceError> {
        if let Some(handle) = self.placeholder_material {
            return Ok(handle);
        }
        let handle = device.upload_material(&self.default_material)?;
        self.placeholder_material = Some(handle);
        Ok(handle)
    }

    /// Bounds cached when the mesh was first uploaded.
    pub fn cached_bounding_box(&self, source: &MeshSourceDesc) -> Option<Aabb> {
        self.bounding_boxes.get(source).copied()
    }

    pub fn mesh_handle(&self, mesh_id: Guid) -> Option<MeshHandle> {
        self.mesh_handles.get(&mesh_id).copied()
    }

    pub fn material_handle(&self, material_id: Guid) -> Option<MaterialHandle> {
        self.material_handles.get(&material_id).copied()
    }

    pub fn resident_mesh_count(&self) -> usize {
        self.mesh_handles.len()
    }

    pub fn resident_material_count(&self) -> usize {
        self.material_handles.len()
    }

    /// Refresh the per-frame uniform block from the scene and camera.
    pub fn update_per_frame_buffer(&mut self, scene: &RenderScene, camera: &RenderCamera) {
        let light = &scene.directional_light;
        self.per_frame = PerFrameUniforms {
            proj_view: camera.proj_view().to_cols_array_2d(),
            camera_position: camera.eye_position().to_array(),
            ambient_light: scene.ambient_light.to_array(),
            entity_count: u32::try_from(scene.entity_count()).unwrap_or(u32::MAX),
            directional_light_direction: light.direction.to_array(),
            directional_light_color: light.color.to_array(),
            ..PerFrameUniforms::default()
        };
    }

    pub fn per_frame(&self) -> &PerFrameUniforms {
        &self.per_frame
    }

    /// Forget every level resource. The global bundle stays.
    pub fn clear_level(&mut self) {
        self.mesh_handles.clear();
        self.material_handles.clear();
        self.bounding_boxes.clear();
        self.placeholder_mesh = None;
        self.placeholder_material = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::RecordingDevice;
    use frameline_common::TextureSet;
    use glam::Vec3;

    fn resource() -> RenderResource {
        RenderResource::new(AssetManager::new("/game"))
    }

    #[test]
    fn untextured_materials_share_default_key() {
        let res = resource();
        let a = res.material_source(&MaterialDesc::untextured());
        let b = res.material_source(&MaterialDesc::untextured());
        assert_eq!(a, b);
        assert_eq!(&a, res.default_material());
        assert_eq!(a.base_color_file, "/game/asset/texture/default/albedo.jpg");
        assert_eq!(a.texture_files().count(), 3);
    }

    #[test]
    fn textured_material_resolves_paths() {
        let res = resource();
        let source = res.material_source(&MaterialDesc::textured(TextureSet {
            base_color: "asset/texture/rock/albedo.png".into(),
            normal: "asset/texture/rock/normal.png".into(),
            ..TextureSet::default()
        }));
        assert_eq!(source.base_color_file, "/game/asset/texture/rock/albedo.png");
        assert!(source.metallic_roughness_file.is_empty());
        assert_eq!(source.texture_files().count(), 2);
    }

    #[test]
    fn load_mesh_caches_bounds() {
        let mut res = resource();
        let bounds = Aabb::new(Vec3::ZERO, Vec3::splat(2.0));
        let mut device = RecordingDevice::new().with_mesh_bounds("rock.obj", bounds);
        let source = res.mesh_source(&MeshDesc::new("asset/mesh/rock.obj"));

        let loaded = res.load_mesh(&mut device, Guid(1), &source).unwrap();
        assert!(!loaded.placeholder);
        assert_eq!(loaded.bounding_box, bounds);
        assert_eq!(res.cached_bounding_box(&source), Some(bounds));
        assert!(res.mesh_handle(Guid(1)).is_some());
    }

    #[test]
    fn failed_mesh_falls_back_to_placeholder_once() {
        let mut res = resource();
        let mut device = RecordingDevice::new().fail_on("broken.obj");
        let a = res.mesh_source(&MeshDesc::new("broken.obj"));
        let b = res.mesh_source(&MeshDesc::new("other/broken.obj"));

        assert!(res.load_mesh(&mut device, Guid(1), &a).unwrap().placeholder);
        assert!(res.load_mesh(&mut device, Guid(2), &b).unwrap().placeholder);
        assert_eq!(res.mesh_handle(Guid(1)), res.mesh_handle(Guid(2)));
        assert_eq!(device.upload_count_for("cube.obj"), 1);
    }

    #[test]
    fn failed_placeholder_is_an_error() {
        let mut res = resource();
        let mut device = RecordingDevice::new()
            .fail_on("broken.obj")
            .fail_on("default/cube.obj");
        let source = res.mesh_source(&MeshDesc::new("broken.obj"));
        assert!(res.load_mesh(&mut device, Guid(1), &source).is_err());
        assert!(res.mesh_handle(Guid(1)).is_none());
    }

    #[test]
    fn failed_material_uses_default() {
        let mut res = resource();
        let mut device = RecordingDevice::new().fail_on("missing.png");
        let source = res.material_source(&MaterialDesc::textured(TextureSet {
            base_color: "missing.png".into(),
            ..TextureSet::default()
        }));
        assert!(res.load_material(&mut device, Guid(5), &source).unwrap());
        assert!(res.material_handle(Guid(5)).is_some());
    }

    #[test]
    fn default_material_reused_after_fallback() {
        let mut res = resource();
        let mut device = RecordingDevice::new().fail_on("missing.png");
        let broken = res.material_source(&MaterialDesc::textured(TextureSet {
            base_color: "missing.png".into(),
            ..TextureSet::default()
        }));
        let default = res.material_source(&MaterialDesc::untextured());

        assert!(res.load_material(&mut device, Guid(1), &broken).unwrap());
        assert!(!res.load_material(&mut device, Guid(2), &default).unwrap());
        assert_eq!(res.material_handle(Guid(1)), res.material_handle(Guid(2)));
        assert_eq!(device.upload_count_for("default/albedo.jpg"), 1);
    }

    #[test]
    fn placeholder_mesh_reused_after_fallback() {
        let mut res = resource();
        let mut device = RecordingDevice::new().fail_on("missing.obj");
        let broken = res.mesh_source(&MeshDesc::new("asset/mesh/missing.obj"));
        let placeholder = res.mesh_source(&MeshDesc::new(PLACEHOLDER_MESH));

        assert!(res.load_mesh(&mut device, Guid(1), &broken).unwrap().placeholder);
        assert!(!res.load_mesh(&mut device, Guid(2), &placeholder).unwrap().placeholder);
        assert_eq!(res.mesh_handle(Guid(1)), res.mesh_handle(Guid(2)));
        assert_eq!(device.upload_count_for("default/cube.obj"), 1);
    }

    #[test]
    fn translucency_stays_out_of_material_key() {
        let res = resource();
        let glass = MaterialDesc {
            translucent: true,
            ..MaterialDesc::untextured()
        };
        assert_eq!(res.material_source(&glass), res.material_source(&MaterialDesc::untextured()));
    }

    #[test]
    fn per_frame_block_is_plain_bytes() {
        let uniforms = PerFrameUniforms::default();
        assert_eq!(bytemuck::bytes_of(&uniforms).len(), 128);
    }

    #[test]
    fn clear_level_drops_handles() {
        let mut res = resource();
        let mut device = RecordingDevice::new();
        let source = res.mesh_source(&MeshDesc::new("cube.obj"));
        res.load_mesh(&mut device, Guid(1), &source).unwrap();
        res.clear_level();
        assert_eq!(res.resident_mesh_count(), 0);
        assert!(res.cached_bounding_box(&source).is_none());
    }
}
