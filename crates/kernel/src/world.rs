use frameline_common::{
    CameraMode, MaterialDesc, MeshDesc, ObjectId, ParticleEmitterDesc, SkeletonPose, Transform,
};
use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Index of a particle emitter in the world's emitter list.
///
/// Emitters are never removed from the list, so indices stay valid for the
/// lifetime of the level.
pub type EmitterIndex = usize;

/// Errors from world mutations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    #[error("object {0} not found")]
    ObjectNotFound(ObjectId),
    #[error("object {id} has no part {part_index}")]
    PartNotFound { id: ObjectId, part_index: usize },
    #[error("emitter {0} not found")]
    EmitterNotFound(EmitterIndex),
}

/// Field-wise camera change. Absent fields were not touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraChange {
    pub fov_x: Option<f32>,
    pub view: Option<Mat4>,
    pub mode: Option<CameraMode>,
}

/// An event record produced by every mutation to the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    Spawned { id: ObjectId },
    /// Object was removed. Carries its parts count for diagnostics.
    Despawned { id: ObjectId, part_count: usize },
    TransformUpdated {
        id: ObjectId,
        old: Transform,
        new: Transform,
    },
    /// The object's part list was replaced wholesale.
    PartsReplaced { id: ObjectId },
    PoseUpdated { id: ObjectId, part_index: usize },
    CameraChanged(CameraChange),
    EmitterSpawned { index: EmitterIndex },
    EmitterMoved {
        index: EmitterIndex,
        position: Vec3,
        rotation: Quat,
    },
    /// Emitters that should be simulated this tick.
    EmittersTicked { indices: Vec<EmitterIndex> },
    Stepped { tick: u64 },
}

/// One renderable part of a game object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshPart {
    /// Transform relative to the owning object.
    pub local: Transform,
    pub mesh: MeshDesc,
    pub material: MaterialDesc,
    pub pose: SkeletonPose,
}

impl MeshPart {
    pub fn new(mesh: MeshDesc, material: MaterialDesc) -> Self {
        Self {
            local: Transform::default(),
            mesh,
            material,
            pose: SkeletonPose::default(),
        }
    }

    /// World-space model matrix of this part under `object`.
    pub fn world_matrix(&self, object: &Transform) -> Mat4 {
        object.matrix() * self.local.matrix()
    }
}

/// Per-object data stored in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameObject {
    pub name: String,
    pub transform: Transform,
    pub parts: Vec<MeshPart>,
}

impl GameObject {
    pub fn new(name: impl Into<String>, transform: Transform, parts: Vec<MeshPart>) -> Self {
        Self {
            name: name.into(),
            transform,
            parts,
        }
    }
}

/// Logic-side camera state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicCamera {
    pub fov_x: f32,
    pub view: Mat4,
    pub mode: CameraMode,
}

impl Default for LogicCamera {
    fn default() -> Self {
        Self {
            fov_x: 89.0_f32.to_radians(),
            view: Mat4::IDENTITY,
            mode: CameraMode::Editor,
        }
    }
}

/// The logic-owned world.
///
/// All mutations go through explicit operations and are logged. BTreeMap
/// keeps object iteration deterministic across platforms.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct World {
    objects: BTreeMap<ObjectId, GameObject>,
    emitters: Vec<ParticleEmitterDesc>,
    camera: LogicCamera,
    next_object_id: u64,
    tick: u64,
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl World {
    /// Create an empty world at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current logic tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    pub fn objects(&self) -> &BTreeMap<ObjectId, GameObject> {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&GameObject> {
        self.objects.get(&id)
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn camera(&self) -> &LogicCamera {
        &self.camera
    }

    pub fn emitters(&self) -> &[ParticleEmitterDesc] {
        &self.emitters
    }

    /// Spawn a new object. Returns its id.
    pub fn spawn(&mut self, object: GameObject) -> ObjectId {
        let id = ObjectId(self.next_object_id);
        self.spawn_with_id(id, object);
        id
    }

    /// Spawn an object under a caller-chosen id, replacing any object
    /// already stored there.
    pub fn spawn_with_id(&mut self, id: ObjectId, object: GameObject) {
        self.next_object_id = self.next_object_id.max(id.0 + 1);
        self.objects.insert(id, object);
        self.event_log.push(WorldEvent::Spawned { id });
    }

    /// Remove an object. Returns it if it existed.
    pub fn despawn(&mut self, id: ObjectId) -> Option<GameObject> {
        let removed = self.objects.remove(&id);
        if let Some(ref object) = removed {
            self.event_log.push(WorldEvent::Despawned {
                id,
                part_count: object.parts.len(),
            });
        }
        removed
    }

    pub fn set_transform(&mut self, id: ObjectId, new: Transform) -> Result<(), WorldError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(WorldError::ObjectNotFound(id))?;
        let old = object.transform;
        object.transform = new;
        self.event_log
            .push(WorldEvent::TransformUpdated { id, old, new });
        Ok(())
    }

    pub fn set_parts(&mut self, id: ObjectId, parts: Vec<MeshPart>) -> Result<(), WorldError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(WorldError::ObjectNotFound(id))?;
        object.parts = parts;
        self.event_log.push(WorldEvent::PartsReplaced { id });
        Ok(())
    }

    pub fn set_pose(
        &mut self,
        id: ObjectId,
        part_index: usize,
        pose: SkeletonPose,
    ) -> Result<(), WorldError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(WorldError::ObjectNotFound(id))?;
        let part = object
            .parts
            .get_mut(part_index)
            .ok_or(WorldError::PartNotFound { id, part_index })?;
        part.pose = pose;
        self.event_log
            .push(WorldEvent::PoseUpdated { id, part_index });
        Ok(())
    }

    pub fn set_camera_fov(&mut self, fov_x: f32) {
        self.camera.fov_x = fov_x;
        self.event_log.push(WorldEvent::CameraChanged(CameraChange {
            fov_x: Some(fov_x),
            ..CameraChange::default()
        }));
    }

    pub fn set_camera_view(&mut self, view: Mat4) {
        self.camera.view = view;
        self.event_log.push(WorldEvent::CameraChanged(CameraChange {
            view: Some(view),
            ..CameraChange::default()
        }));
    }

    pub fn set_camera_mode(&mut self, mode: CameraMode) {
        self.camera.mode = mode;
        self.event_log.push(WorldEvent::CameraChanged(CameraChange {
            mode: Some(mode),
            ..CameraChange::default()
        }));
    }

    /// Add a particle emitter. Returns its index.
    pub fn spawn_emitter(&mut self, desc: ParticleEmitterDesc) -> EmitterIndex {
        let index = self.emitters.len();
        self.emitters.push(desc);
        self.event_log.push(WorldEvent::EmitterSpawned { index });
        index
    }

    pub fn move_emitter(
        &mut self,
        index: EmitterIndex,
        position: Vec3,
        rotation: Quat,
    ) -> Result<(), WorldError> {
        let emitter = self
            .emitters
            .get_mut(index)
            .ok_or(WorldError::EmitterNotFound(index))?;
        emitter.position = position;
        emitter.rotation = rotation;
        self.event_log.push(WorldEvent::EmitterMoved {
            index,
            position,
            rotation,
        });
        Ok(())
    }

    /// Emitters that are simulated: unowned ones and those whose owner is
    /// still alive.
    pub fn live_emitters(&self) -> Vec<EmitterIndex> {
        self.emitters
            .iter()
            .enumerate()
            .filter(|(_, e)| e.owner.is_none_or(|owner| self.objects.contains_key(&owner)))
            .map(|(i, _)| i)
            .collect()
    }

    /// Advance the logic by one tick.
    pub fn step(&mut self) {
        self.tick += 1;
        let indices = self.live_emitters();
        if !indices.is_empty() {
            self.event_log.push(WorldEvent::EmittersTicked { indices });
        }
        self.event_log.push(WorldEvent::Stepped { tick: self.tick });
        tracing::trace!(tick = self.tick, objects = self.objects.len(), "world stepped");
    }

    /// Drop every object and emitter, as on level unload. Ids keep counting.
    pub fn unload(&mut self) {
        let ids: Vec<ObjectId> = self.objects.keys().copied().collect();
        for id in ids {
            self.despawn(id);
        }
        self.emitters.clear();
        tracing::debug!("world unloaded");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_object() -> GameObject {
        GameObject::new(
            "cube",
            Transform::default(),
            vec![MeshPart::new(
                MeshDesc::new("cube.obj"),
                MaterialDesc::untextured(),
            )],
        )
    }

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.object_count(), 0);
        assert!(w.emitters().is_empty());
    }

    #[test]
    fn spawn_and_despawn() {
        let mut w = World::new();
        let id = w.spawn(cube_object());
        assert_eq!(w.object_count(), 1);
        assert!(w.get(id).is_some());

        let removed = w.despawn(id);
        assert!(removed.is_some());
        assert_eq!(w.object_count(), 0);
        assert!(w.despawn(id).is_none());
    }

    #[test]
    fn spawned_ids_are_unique() {
        let mut w = World::new();
        let a = w.spawn(cube_object());
        let b = w.spawn(cube_object());
        assert_ne!(a, b);
    }

    #[test]
    fn spawn_with_id_advances_counter() {
        let mut w = World::new();
        w.spawn_with_id(ObjectId(7), cube_object());
        let next = w.spawn(cube_object());
        assert_eq!(next, ObjectId(8));
    }

    #[test]
    fn events_are_recorded() {
        let mut w = World::new();
        let id = w.spawn(cube_object());
        w.step();
        w.despawn(id);
        assert_eq!(
            w.events(),
            &[
                WorldEvent::Spawned { id },
                WorldEvent::Stepped { tick: 1 },
                WorldEvent::Despawned { id, part_count: 1 },
            ]
        );
    }

    #[test]
    fn drain_events_clears_log() {
        let mut w = World::new();
        w.spawn(cube_object());
        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        assert!(w.events().is_empty());
    }

    #[test]
    fn set_transform_on_missing_object_fails() {
        let mut w = World::new();
        let err = w.set_transform(ObjectId(3), Transform::default());
        assert!(matches!(err, Err(WorldError::ObjectNotFound(ObjectId(3)))));
        assert!(w.events().is_empty());
    }

    #[test]
    fn set_pose_checks_part_index() {
        let mut w = World::new();
        let id = w.spawn(cube_object());
        let pose = SkeletonPose {
            joints: vec![Mat4::IDENTITY; 4],
        };
        assert!(w.set_pose(id, 0, pose.clone()).is_ok());
        assert_eq!(w.get(id).unwrap().parts[0].pose.joint_count(), 4);
        assert!(matches!(
            w.set_pose(id, 1, pose),
            Err(WorldError::PartNotFound { part_index: 1, .. })
        ));
    }

    #[test]
    fn camera_changes_are_field_wise() {
        let mut w = World::new();
        let view = Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0));
        w.set_camera_view(view);
        assert_eq!(
            w.events(),
            &[WorldEvent::CameraChanged(CameraChange {
                fov_x: None,
                view: Some(view),
                mode: None,
            })]
        );
        assert_eq!(w.camera().view, view);
        assert_eq!(w.camera().mode, CameraMode::Editor);
    }

    #[test]
    fn step_ticks_only_live_emitters() {
        let mut w = World::new();
        let owner = w.spawn(cube_object());
        w.spawn_emitter(ParticleEmitterDesc::default());
        w.spawn_emitter(ParticleEmitterDesc {
            owner: Some(owner),
            ..ParticleEmitterDesc::default()
        });
        w.despawn(owner);
        w.drain_events();

        w.step();
        assert_eq!(
            w.events()[0],
            WorldEvent::EmittersTicked { indices: vec![0] }
        );
    }

    #[test]
    fn move_unknown_emitter_fails() {
        let mut w = World::new();
        assert!(matches!(
            w.move_emitter(4, Vec3::ZERO, Quat::IDENTITY),
            Err(WorldError::EmitterNotFound(4))
        ));
    }

    #[test]
    fn part_world_matrix_composes_object_transform() {
        let mut part = MeshPart::new(MeshDesc::new("a.obj"), MaterialDesc::untextured());
        part.local = Transform::from_position(Vec3::new(0.0, 1.0, 0.0));
        let object = Transform::from_position(Vec3::new(5.0, 0.0, 0.0));
        let p = part.world_matrix(&object).transform_point3(Vec3::ZERO);
        assert_eq!(p, Vec3::new(5.0, 1.0, 0.0));
    }

    #[test]
    fn unload_despawns_everything() {
        let mut w = World::new();
        w.spawn(cube_object());
        w.spawn(cube_object());
        w.spawn_emitter(ParticleEmitterDesc::default());
        w.drain_events();
        w.unload();
        assert_eq!(w.object_count(), 0);
        assert!(w.emitters().is_empty());
        assert_eq!(w.events().len(), 2);
    }
}
