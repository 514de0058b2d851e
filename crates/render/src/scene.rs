use frameline_common::ObjectId;
use glam::Vec3;
use std::collections::{BTreeMap, HashMap};

use crate::camera::RenderCamera;
use crate::desc::GameObjectPartId;
use crate::entity::RenderEntity;
use crate::guid::{Guid, GuidAllocator};
use crate::resource::{MaterialSourceDesc, MeshSourceDesc};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Normalized direction the light travels in.
    pub direction: Vec3,
    pub color: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(-1.0, -1.0, -1.0).normalize(),
            color: Vec3::ONE,
        }
    }
}

/// Instance ids that survived culling this frame, per view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibleNodes {
    pub main_camera: Vec<Guid>,
    pub directional_light: Vec<Guid>,
}

/// The scene resource table.
///
/// Owns every render entity and the three identity allocators. Mutated only
/// while the swap buffer is drained; read-only for the passes that follow.
#[derive(Debug, Default)]
pub struct RenderScene {
    pub ambient_light: Vec3,
    pub directional_light: DirectionalLight,
    entities: BTreeMap<Guid, RenderEntity>,
    by_object: HashMap<ObjectId, Vec<Guid>>,
    instance_id_allocator: GuidAllocator<GameObjectPartId>,
    mesh_asset_id_allocator: GuidAllocator<MeshSourceDesc>,
    material_asset_id_allocator: GuidAllocator<MaterialSourceDesc>,
    visible: VisibleNodes,
}

impl RenderScene {
    pub fn new(ambient_light: Vec3, directional_light: DirectionalLight) -> Self {
        Self {
            ambient_light,
            directional_light,
            ..Self::default()
        }
    }

    pub fn instance_id_allocator(&self) -> &GuidAllocator<GameObjectPartId> {
        &self.instance_id_allocator
    }

    pub fn instance_id_allocator_mut(&mut self) -> &mut GuidAllocator<GameObjectPartId> {
        &mut self.instance_id_allocator
    }

    pub fn mesh_asset_id_allocator(&self) -> &GuidAllocator<MeshSourceDesc> {
        &self.mesh_asset_id_allocator
    }

    pub fn mesh_asset_id_allocator_mut(&mut self) -> &mut GuidAllocator<MeshSourceDesc> {
        &mut self.mesh_asset_id_allocator
    }

    pub fn material_asset_id_allocator(&self) -> &GuidAllocator<MaterialSourceDesc> {
        &self.material_asset_id_allocator
    }

    pub fn material_asset_id_allocator_mut(&mut self) -> &mut GuidAllocator<MaterialSourceDesc> {
        &mut self.material_asset_id_allocator
    }

    /// Entities in instance id order.
    pub fn entities(&self) -> impl Iterator<Item = &RenderEntity> {
        self.entities.values()
    }

    pub fn entity(&self, instance_id: Guid) -> Option<&RenderEntity> {
        self.entities.get(&instance_id)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Entities of one object, in part order.
    pub fn entities_of(&self, object_id: ObjectId) -> Vec<&RenderEntity> {
        let mut found: Vec<&RenderEntity> = self
            .by_object
            .get(&object_id)
            .into_iter()
            .flatten()
            .filter_map(|guid| self.entities.get(guid))
            .collect();
        found.sort_by_key(|e| e.part_index);
        found
    }

    /// Owning object of an instance, for picking.
    pub fn object_id_of(&self, instance_id: Guid) -> Option<ObjectId> {
        self.entities.get(&instance_id).map(|e| e.object_id)
    }

    /// Append or replace an entity. `instance_tracked` is whether the
    /// instance id was allocated before this upsert; a tracked id replaces
    /// its entity in place. A tracked id whose entity was deleted is appended
    /// again. Returns `true` if the entity was appended.
    pub fn upsert_entity(&mut self, entity: RenderEntity, instance_tracked: bool) -> bool {
        let instance_id = entity.instance_id;
        let object_id = entity.object_id;
        if instance_tracked {
            if let Some(slot) = self.entities.get_mut(&instance_id) {
                *slot = entity;
                return false;
            }
            tracing::debug!(%instance_id, %object_id, "tracked instance appended after deletion");
        } else {
            debug_assert!(
                !self.entities.contains_key(&instance_id),
                "fresh instance id already in the scene"
            );
        }
        self.entities.insert(instance_id, entity);
        self.by_object.entry(object_id).or_default().push(instance_id);
        true
    }

    /// Remove every entity owned by `object_id`. Unknown ids are a no-op.
    /// Resource identities stay allocated.
    pub fn delete_entities_by_object_id(&mut self, object_id: ObjectId) -> usize {
        let Some(guids) = self.by_object.remove(&object_id) else {
            return 0;
        };
        guids
            .iter()
            .filter(|guid| self.entities.remove(*guid).is_some())
            .count()
    }

    /// Remove entities of `object_id` whose part index is `>= part_count`,
    /// left over when an object comes back with fewer parts.
    pub fn retire_parts_from(&mut self, object_id: ObjectId, part_count: usize) -> usize {
        let Some(guids) = self.by_object.get_mut(&object_id) else {
            return 0;
        };
        let entities = &mut self.entities;
        let before = guids.len();
        guids.retain(|guid| {
            let stale = entities.get(guid).map(|e| e.part_index >= part_count);
            match stale {
                Some(true) => {
                    entities.remove(guid);
                    false
                }
                Some(false) => true,
                None => false,
            }
        });
        let removed = before - guids.len();
        if guids.is_empty() {
            self.by_object.remove(&object_id);
        }
        removed
    }

    /// Cull entities against the camera frustum. Every entity casts a
    /// directional shadow.
    pub fn update_visible_objects(&mut self, camera: &RenderCamera) {
        let frustum = camera.frustum();
        let mut visible = VisibleNodes::default();
        for (guid, entity) in &mut self.entities {
            entity.visible = frustum.intersects_aabb(&entity.world_bounding_box());
            if entity.visible {
                visible.main_camera.push(*guid);
            }
            visible.directional_light.push(*guid);
        }
        tracing::trace!(
            visible = visible.main_camera.len(),
            total = self.entities.len(),
            "visibility updated"
        );
        self.visible = visible;
    }

    pub fn visible(&self) -> &VisibleNodes {
        &self.visible
    }

    /// Full teardown for a level reload: entities and every allocator.
    pub fn clear_for_level_reloading(&mut self) {
        self.entities.clear();
        self.by_object.clear();
        self.instance_id_allocator.clear();
        self.mesh_asset_id_allocator.clear();
        self.material_asset_id_allocator.clear();
        self.visible = VisibleNodes::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frameline_common::Aabb;
    use glam::Mat4;

    fn entity(instance: u64, object: u64, part_index: usize, at: Vec3) -> RenderEntity {
        RenderEntity {
            instance_id: Guid(instance),
            object_id: ObjectId(object),
            part_index,
            model_matrix: Mat4::from_translation(at),
            mesh_asset_id: Guid(1),
            material_asset_id: Guid(1),
            enable_vertex_blending: false,
            joint_matrices: Vec::new(),
            bounding_box: Aabb::UNIT_CUBE,
            translucent: false,
            visible: true,
        }
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut scene = RenderScene::default();
        assert!(scene.upsert_entity(entity(1, 7, 0, Vec3::ZERO), false));
        assert!(!scene.upsert_entity(entity(1, 7, 0, Vec3::X), true));
        assert_eq!(scene.entity_count(), 1);
        let stored = scene.entity(Guid(1)).unwrap();
        assert_eq!(stored.model_matrix, Mat4::from_translation(Vec3::X));
        assert_eq!(scene.entities_of(ObjectId(7)).len(), 1);
    }

    #[test]
    fn tracked_instance_reappended_after_delete() {
        let mut scene = RenderScene::default();
        scene.upsert_entity(entity(1, 7, 0, Vec3::ZERO), false);
        scene.delete_entities_by_object_id(ObjectId(7));

        assert!(scene.upsert_entity(entity(1, 7, 0, Vec3::Y), true));
        assert_eq!(scene.entity_count(), 1);
        assert_eq!(scene.entities_of(ObjectId(7)).len(), 1);
    }

    #[test]
    fn delete_removes_all_parts() {
        let mut scene = RenderScene::default();
        scene.upsert_entity(entity(1, 7, 0, Vec3::ZERO), false);
        scene.upsert_entity(entity(2, 7, 1, Vec3::ZERO), false);
        scene.upsert_entity(entity(3, 8, 0, Vec3::ZERO), false);

        assert_eq!(scene.delete_entities_by_object_id(ObjectId(7)), 2);
        assert_eq!(scene.entity_count(), 1);
        assert_eq!(scene.object_id_of(Guid(3)), Some(ObjectId(8)));
        assert_eq!(scene.object_id_of(Guid(1)), None);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut scene = RenderScene::default();
        scene.upsert_entity(entity(1, 7, 0, Vec3::ZERO), false);
        assert_eq!(scene.delete_entities_by_object_id(ObjectId(7)), 1);
        assert_eq!(scene.delete_entities_by_object_id(ObjectId(7)), 0);
        assert_eq!(scene.delete_entities_by_object_id(ObjectId(42)), 0);
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn retire_parts_drops_trailing_parts() {
        let mut scene = RenderScene::default();
        for part in 0..3 {
            scene.upsert_entity(entity(part as u64 + 1, 7, part, Vec3::ZERO), false);
        }
        assert_eq!(scene.retire_parts_from(ObjectId(7), 1), 2);
        let parts: Vec<usize> = scene
            .entities_of(ObjectId(7))
            .iter()
            .map(|e| e.part_index)
            .collect();
        assert_eq!(parts, vec![0]);
        assert_eq!(scene.retire_parts_from(ObjectId(7), 0), 1);
        assert_eq!(scene.entity_count(), 0);
    }

    #[test]
    fn culling_splits_main_camera_and_shadow_lists() {
        let mut scene = RenderScene::default();
        scene.upsert_entity(entity(1, 1, 0, Vec3::new(0.0, 0.0, -10.0)), false);
        scene.upsert_entity(entity(2, 2, 0, Vec3::new(0.0, 0.0, 10.0)), false);
        let mut camera = RenderCamera::default();
        camera.look_at(Vec3::ZERO, Vec3::NEG_Z, Vec3::Y);

        scene.update_visible_objects(&camera);
        assert_eq!(scene.visible().main_camera, vec![Guid(1)]);
        assert_eq!(scene.visible().directional_light, vec![Guid(1), Guid(2)]);
        assert!(scene.entity(Guid(1)).unwrap().visible);
        assert!(!scene.entity(Guid(2)).unwrap().visible);
    }

    #[test]
    fn level_reload_clears_allocators() {
        let mut scene = RenderScene::default();
        let key = MeshSourceDesc {
            mesh_file: "cube.obj".into(),
        };
        scene.mesh_asset_id_allocator_mut().alloc_guid(&key);
        scene.upsert_entity(entity(1, 7, 0, Vec3::ZERO), false);
        scene.clear_for_level_reloading();
        assert_eq!(scene.entity_count(), 0);
        assert!(!scene.mesh_asset_id_allocator().has_element(&key));
    }
}
