use glam::{Mat4, Quat, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::ObjectId;

/// Reference to a mesh asset by file path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MeshDesc {
    pub mesh_file: String,
}

impl MeshDesc {
    pub fn new(mesh_file: impl Into<String>) -> Self {
        Self {
            mesh_file: mesh_file.into(),
        }
    }
}

/// The five texture slots of a PBR material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureSet {
    pub base_color: String,
    pub metallic_roughness: String,
    pub normal: String,
    pub occlusion: String,
    pub emissive: String,
}

/// Material reference carried by an object part.
///
/// `textures: None` means the object supplies no texture set and the render
/// side substitutes its default material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialDesc {
    pub textures: Option<TextureSet>,
    #[serde(default)]
    pub translucent: bool,
}

impl MaterialDesc {
    pub fn untextured() -> Self {
        Self::default()
    }

    pub fn textured(textures: TextureSet) -> Self {
        Self {
            textures: Some(textures),
            translucent: false,
        }
    }
}

/// Result of skeletal animation for one part: one matrix per joint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkeletonPose {
    pub joints: Vec<Mat4>,
}

impl SkeletonPose {
    pub fn joint_count(&self) -> usize {
        self.joints.len()
    }
}

/// Parameters of one particle emitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticleEmitterDesc {
    /// Object the emitter is attached to, if any.
    pub owner: Option<ObjectId>,
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub size: Vec3,
    pub emit_count: u32,
    /// Particle lifetime in seconds.
    pub life: f32,
    pub color: Vec4,
}

impl Default for ParticleEmitterDesc {
    fn default() -> Self {
        Self {
            owner: None,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            velocity: Vec3::Y,
            acceleration: Vec3::new(0.0, -9.8, 0.0),
            size: Vec3::splat(0.05),
            emit_count: 64,
            life: 2.0,
            color: Vec4::ONE,
        }
    }
}
