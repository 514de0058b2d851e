//! Translation of world events into the producer side of the swap buffer.

use frameline_common::ObjectId;
use frameline_kernel::{GameObject, World, WorldEvent};
use frameline_render::{
    CameraSwapData, EmitterTickRequest, EmitterTransformDesc, EmitterTransformRequest,
    FrameDelta, GameObjectDesc, GameObjectPartDesc, ParticleSubmitRequest,
};

/// What one publish appended to the frame delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Published {
    pub upserts: usize,
    pub deletions: usize,
}

/// Full render description of an object, parts in world space.
pub fn object_desc(id: ObjectId, object: &GameObject) -> GameObjectDesc {
    let parts = object
        .parts
        .iter()
        .map(|part| GameObjectPartDesc {
            transform: part.world_matrix(&object.transform),
            mesh: part.mesh.clone(),
            material: part.material.clone(),
            pose: part.pose.clone(),
        })
        .collect();
    GameObjectDesc::new(id, parts)
}

/// Append the effect of `events` to `delta`.
///
/// Each touched object is sent once, with its state at publish time, in the
/// order it was first touched. A despawn followed by a respawn of the same id
/// cancels the deletion.
pub fn publish_events(world: &World, events: &[WorldEvent], delta: &mut FrameDelta) -> Published {
    let mut dirty: Vec<ObjectId> = Vec::new();
    let mut deleted: Vec<ObjectId> = Vec::new();
    let mut resubmit_emitters = false;
    let mut transforms = Vec::new();
    let mut ticked = Vec::new();

    for event in events {
        match event {
            WorldEvent::Spawned { id }
            | WorldEvent::TransformUpdated { id, .. }
            | WorldEvent::PartsReplaced { id }
            | WorldEvent::PoseUpdated { id, .. } => {
                deleted.retain(|d| d != id);
                if !dirty.contains(id) {
                    dirty.push(*id);
                }
            }
            WorldEvent::Despawned { id, .. } => {
                dirty.retain(|d| d != id);
                if !deleted.contains(id) {
                    deleted.push(*id);
                }
            }
            WorldEvent::CameraChanged(change) => delta.update_camera(CameraSwapData {
                fov_x: change.fov_x,
                view_matrix: change.view,
                camera_type: change.mode,
            }),
            WorldEvent::EmitterSpawned { .. } => resubmit_emitters = true,
            WorldEvent::EmitterMoved {
                index,
                position,
                rotation,
            } => transforms.push(EmitterTransformDesc {
                index: *index,
                position: *position,
                rotation: *rotation,
            }),
            WorldEvent::EmittersTicked { indices } => ticked.extend_from_slice(indices),
            WorldEvent::Stepped { .. } => {}
        }
    }

    if resubmit_emitters {
        delta.submit_particles(ParticleSubmitRequest {
            emitters: world.emitters().to_vec(),
        });
    }
    if !transforms.is_empty() {
        delta.add_transform_request(EmitterTransformRequest { transforms });
    }
    if !ticked.is_empty() {
        delta.add_tick_request(EmitterTickRequest {
            emitter_indices: ticked,
        });
    }

    let mut published = Published::default();
    for id in dirty {
        match world.get(id) {
            Some(object) => {
                delta.add_dirty_object(object_desc(id, object));
                published.upserts += 1;
            }
            None => tracing::debug!(%id, "touched object no longer in world"),
        }
    }
    for id in deleted {
        delta.add_deleted_object(id);
        published.deletions += 1;
    }
    published
}
