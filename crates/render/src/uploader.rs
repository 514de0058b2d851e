//! Drains the render side of the swap buffer into the scene table.

use frameline_common::ObjectId;

use crate::camera::RenderCamera;
use crate::desc::{GameObjectDesc, GameObjectPartDesc, GameObjectPartId};
use crate::device::RenderDevice;
use crate::entity::RenderEntity;
use crate::error::DeviceError;
use crate::particle::ParticlePass;
use crate::resource::RenderResource;
use crate::scene::RenderScene;
use crate::swap::{FrameDelta, SwapDomain};

/// What one drain did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub objects: usize,
    pub entities_created: usize,
    pub entities_updated: usize,
    pub entities_deleted: usize,
    pub meshes_uploaded: usize,
    pub materials_uploaded: usize,
    pub placeholders: usize,
    pub parts_skipped: usize,
    pub camera_updated: bool,
    pub particles_submitted: bool,
    pub level_resource_uploaded: bool,
}

/// Everything a drain mutates, borrowed for the duration of one drain.
pub struct FrameUploader<'a, D> {
    pub scene: &'a mut RenderScene,
    pub resource: &'a mut RenderResource,
    pub camera: &'a mut RenderCamera,
    pub particles: &'a mut ParticlePass,
    pub device: &'a mut D,
}

impl<D: RenderDevice> FrameUploader<'_, D> {
    /// Apply and clear every payload of `delta`.
    ///
    /// Order: level resource, upserts, camera, particle submit, emitter
    /// tick, emitter transform, deletions.
    pub fn drain(&mut self, delta: &mut FrameDelta) -> DrainStats {
        let _span = tracing::info_span!("drain").entered();
        let mut stats = DrainStats::default();

        self.process_level_resource(delta, &mut stats);
        self.process_upserts(delta, &mut stats);
        self.process_camera(delta, &mut stats);
        self.process_particles(delta, &mut stats);
        self.process_deletions(delta, &mut stats);

        if stats.objects > 0 || stats.entities_deleted > 0 {
            tracing::debug!(
                objects = stats.objects,
                created = stats.entities_created,
                updated = stats.entities_updated,
                deleted = stats.entities_deleted,
                "drained"
            );
        }
        stats
    }

    fn process_level_resource(&mut self, delta: &mut FrameDelta, stats: &mut DrainStats) {
        let Some(desc) = delta.level_resource.clone() else {
            return;
        };
        match self.resource.upload_global_resource(&mut *self.device, desc) {
            Ok(()) => stats.level_resource_uploaded = true,
            Err(err) => tracing::error!(%err, "level resource upload failed"),
        }
        delta.reset_field(SwapDomain::LevelResource);
    }

    fn process_upserts(&mut self, delta: &mut FrameDelta, stats: &mut DrainStats) {
        let Some(queue) = delta.object_upserts.as_mut() else {
            return;
        };
        while let Some(object) = queue.front() {
            self.upsert_object(object, stats);
            queue.pop_front();
        }
        delta.reset_field(SwapDomain::ObjectUpserts);
    }

    fn upsert_object(&mut self, object: &GameObjectDesc, stats: &mut DrainStats) {
        let object_id = object.id();
        stats.objects += 1;
        let restored = self.particles.restore_emitters_owned_by(object_id);
        if restored > 0 {
            tracing::debug!(%object_id, emitters = restored, "owned emitters restored");
        }
        for (part_index, part) in object.parts().iter().enumerate() {
            if let Err(err) = self.upsert_part(object_id, part_index, part, stats) {
                stats.parts_skipped += 1;
                tracing::error!(%object_id, part_index, %err, "part skipped");
            }
        }
        let retired = self.scene.retire_parts_from(object_id, object.parts().len());
        stats.entities_deleted += retired;
    }

    fn upsert_part(
        &mut self,
        object_id: ObjectId,
        part_index: usize,
        part: &GameObjectPartDesc,
        stats: &mut DrainStats,
    ) -> Result<(), DeviceError> {
        let part_id = GameObjectPartId {
            object_id,
            part_index,
        };
        let instance_tracked = self.scene.instance_id_allocator().has_element(&part_id);
        let instance_id = self.scene.instance_id_allocator_mut().alloc_guid(&part_id);

        let mesh_source = self.resource.mesh_source(&part.mesh);
        let mesh_tracked = self.scene.mesh_asset_id_allocator().has_element(&mesh_source);
        let mesh_asset_id = self.scene.mesh_asset_id_allocator_mut().alloc_guid(&mesh_source);
        let bounding_box = if mesh_tracked {
            self.resource
                .cached_bounding_box(&mesh_source)
                .ok_or_else(|| DeviceError::AssetMissing(mesh_source.mesh_file.clone()))?
        } else {
            let loaded = self.resource.load_mesh(&mut *self.device, mesh_asset_id, &mesh_source)?;
            stats.meshes_uploaded += 1;
            stats.placeholders += usize::from(loaded.placeholder);
            loaded.bounding_box
        };

        let material_source = self.resource.material_source(&part.material);
        let material_tracked = self
            .scene
            .material_asset_id_allocator()
            .has_element(&material_source);
        let material_asset_id = self
            .scene
            .material_asset_id_allocator_mut()
            .alloc_guid(&material_source);
        if material_tracked {
            if self.resource.material_handle(material_asset_id).is_none() {
                return Err(DeviceError::AssetMissing(material_source.base_color_file));
            }
        } else {
            let placeholder = self.resource.load_material(
                &mut *self.device,
                material_asset_id,
                &material_source,
            )?;
            stats.materials_uploaded += 1;
            stats.placeholders += usize::from(placeholder);
        }

        let joint_count = part.pose.joint_count();
        let entity = RenderEntity {
            instance_id,
            object_id,
            part_index,
            model_matrix: part.transform,
            mesh_asset_id,
            material_asset_id,
            enable_vertex_blending: joint_count > 1,
            joint_matrices: part.pose.joints.clone(),
            bounding_box,
            translucent: part.material.translucent,
            visible: true,
        };
        self.device.upload_per_instance(&entity);
        if self.scene.upsert_entity(entity, instance_tracked) {
            stats.entities_created += 1;
        } else {
            stats.entities_updated += 1;
        }
        Ok(())
    }

    fn process_camera(&mut self, delta: &mut FrameDelta, stats: &mut DrainStats) {
        let Some(camera) = delta.camera else {
            return;
        };
        if let Some(fov_x) = camera.fov_x {
            self.camera.set_fov_x(fov_x);
        }
        if let Some(view) = camera.view_matrix {
            self.camera.set_main_view_matrix(view);
        }
        if let Some(mode) = camera.camera_type {
            self.camera.set_mode(mode);
        }
        stats.camera_updated = true;
        delta.reset_field(SwapDomain::Camera);
    }

    fn process_particles(&mut self, delta: &mut FrameDelta, stats: &mut DrainStats) {
        if let Some(request) = &delta.particle_submit {
            self.particles.submit(request);
            stats.particles_submitted = true;
            delta.reset_field(SwapDomain::ParticleSubmit);
        }
        if let Some(request) = &delta.emitter_tick {
            self.particles.set_tick_indices(&request.emitter_indices);
            delta.reset_field(SwapDomain::EmitterTick);
        }
        if let Some(request) = &delta.emitter_transform {
            self.particles.set_transforms(&request.transforms);
            delta.reset_field(SwapDomain::EmitterTransform);
        }
    }

    fn process_deletions(&mut self, delta: &mut FrameDelta, stats: &mut DrainStats) {
        let Some(queue) = delta.object_deletions.as_mut() else {
            return;
        };
        while let Some(object_id) = queue.pop_front() {
            stats.entities_deleted += self.scene.delete_entities_by_object_id(object_id);
            let emitters = self.particles.retire_emitters_owned_by(object_id);
            if emitters > 0 {
                tracing::debug!(%object_id, emitters, "owned emitters retired");
            }
        }
        delta.reset_field(SwapDomain::ObjectDeletions);
    }
}
