use frameline_common::{Aabb, ObjectId};
use glam::Mat4;

use crate::guid::Guid;

/// Render-side instance of one object part.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEntity {
    pub instance_id: Guid,
    pub object_id: ObjectId,
    pub part_index: usize,
    pub model_matrix: Mat4,
    pub mesh_asset_id: Guid,
    pub material_asset_id: Guid,
    /// Skinned with more than one joint.
    pub enable_vertex_blending: bool,
    pub joint_matrices: Vec<Mat4>,
    /// Mesh-local bounds.
    pub bounding_box: Aabb,
    pub translucent: bool,
    /// Result of the most recent main-camera culling.
    pub visible: bool,
}

impl RenderEntity {
    pub fn world_bounding_box(&self) -> Aabb {
        self.bounding_box.transformed(&self.model_matrix)
    }
}
