//! Plain value payloads the logic side hands to the render side.

use frameline_common::{
    CameraMode, MaterialDesc, MeshDesc, ObjectId, ParticleEmitterDesc, SkeletonPose,
};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Identity of one part of one game object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameObjectPartId {
    pub object_id: ObjectId,
    pub part_index: usize,
}

/// One renderable part of an object upsert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObjectPartDesc {
    /// World-space model matrix.
    pub transform: Mat4,
    pub mesh: MeshDesc,
    pub material: MaterialDesc,
    pub pose: SkeletonPose,
}

impl GameObjectPartDesc {
    pub fn new(transform: Mat4, mesh: MeshDesc, material: MaterialDesc) -> Self {
        Self {
            transform,
            mesh,
            material,
            pose: SkeletonPose::default(),
        }
    }
}

/// Full description of an object, sent whenever the object changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObjectDesc {
    id: ObjectId,
    parts: Vec<GameObjectPartDesc>,
}

impl GameObjectDesc {
    pub fn new(id: ObjectId, parts: Vec<GameObjectPartDesc>) -> Self {
        Self { id, parts }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn parts(&self) -> &[GameObjectPartDesc] {
        &self.parts
    }
}

/// Camera fields to overwrite. Absent fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraSwapData {
    pub fov_x: Option<f32>,
    pub view_matrix: Option<Mat4>,
    pub camera_type: Option<CameraMode>,
}

impl CameraSwapData {
    /// Overlay `newer` on top of `self`, field by field.
    pub fn merge(&mut self, newer: CameraSwapData) {
        if newer.fov_x.is_some() {
            self.fov_x = newer.fov_x;
        }
        if newer.view_matrix.is_some() {
            self.view_matrix = newer.view_matrix;
        }
        if newer.camera_type.is_some() {
            self.camera_type = newer.camera_type;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fov_x.is_none() && self.view_matrix.is_none() && self.camera_type.is_none()
    }
}

/// Replaces the full set of particle emitters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParticleSubmitRequest {
    pub emitters: Vec<ParticleEmitterDesc>,
}

impl ParticleSubmitRequest {
    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }
}

/// Emitters to simulate this frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitterTickRequest {
    pub emitter_indices: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmitterTransformDesc {
    pub index: usize,
    pub position: Vec3,
    pub rotation: Quat,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmitterTransformRequest {
    pub transforms: Vec<EmitterTransformDesc>,
}

/// The six faces of a cube map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkyBoxMaps {
    pub negative_x: String,
    pub positive_x: String,
    pub negative_y: String,
    pub positive_y: String,
    pub negative_z: String,
    pub positive_z: String,
}

impl SkyBoxMaps {
    pub fn faces(&self) -> [&str; 6] {
        [
            &self.negative_x,
            &self.positive_x,
            &self.negative_y,
            &self.positive_y,
            &self.negative_z,
            &self.positive_z,
        ]
    }

    pub fn map_faces(&self, mut f: impl FnMut(&str) -> String) -> Self {
        Self {
            negative_x: f(&self.negative_x),
            positive_x: f(&self.positive_x),
            negative_y: f(&self.negative_y),
            positive_y: f(&self.positive_y),
            negative_z: f(&self.negative_z),
            positive_z: f(&self.positive_z),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IblResourceDesc {
    pub skybox_irradiance_map: SkyBoxMaps,
    pub skybox_specular_map: SkyBoxMaps,
    pub brdf_map: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorGradingResourceDesc {
    pub color_grading_map: String,
}

/// Level-wide textures: image based lighting and the color grading lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelResourceDesc {
    pub ibl: IblResourceDesc,
    pub color_grading: ColorGradingResourceDesc,
}
