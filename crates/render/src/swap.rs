//! Double-buffered hand-off between the logic tick and the render tick.
//!
//! The logic side appends to the writable [`FrameDelta`]; the render side
//! drains the readable one. [`SwapBuffer::swap`] is the only operation that
//! touches both. Every accessor takes `&mut self`, so holding the writable
//! and the readable side at the same time, or draining while a swap runs,
//! does not compile.

use frameline_common::ObjectId;
use std::collections::VecDeque;

use crate::desc::{
    CameraSwapData, EmitterTickRequest, EmitterTransformRequest, GameObjectDesc,
    LevelResourceDesc, ParticleSubmitRequest,
};

/// One payload field of a [`FrameDelta`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapDomain {
    LevelResource,
    ObjectUpserts,
    ObjectDeletions,
    Camera,
    ParticleSubmit,
    EmitterTick,
    EmitterTransform,
}

impl SwapDomain {
    pub const ALL: [SwapDomain; 7] = [
        SwapDomain::LevelResource,
        SwapDomain::ObjectUpserts,
        SwapDomain::ObjectDeletions,
        SwapDomain::Camera,
        SwapDomain::ParticleSubmit,
        SwapDomain::EmitterTick,
        SwapDomain::EmitterTransform,
    ];
}

/// Changes accumulated by the logic side since the last swap.
///
/// Each field is independently optional; `None` means nothing to do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameDelta {
    pub level_resource: Option<LevelResourceDesc>,
    pub object_upserts: Option<VecDeque<GameObjectDesc>>,
    pub object_deletions: Option<VecDeque<ObjectId>>,
    pub camera: Option<CameraSwapData>,
    pub particle_submit: Option<ParticleSubmitRequest>,
    pub emitter_tick: Option<EmitterTickRequest>,
    pub emitter_transform: Option<EmitterTransformRequest>,
}

impl FrameDelta {
    pub fn set_level_resource(&mut self, desc: LevelResourceDesc) {
        self.level_resource = Some(desc);
    }

    /// Queue an object upsert. Arrival order is kept. A pending deletion of
    /// the same id is cancelled, since deletions drain after upserts.
    pub fn add_dirty_object(&mut self, desc: GameObjectDesc) {
        let id = desc.id();
        if let Some(deletions) = self.object_deletions.as_mut() {
            deletions.retain(|deleted| *deleted != id);
            if deletions.is_empty() {
                self.object_deletions = None;
            }
        }
        self.object_upserts.get_or_insert_default().push_back(desc);
    }

    pub fn add_deleted_object(&mut self, id: ObjectId) {
        self.object_deletions.get_or_insert_default().push_back(id);
    }

    /// Merge a camera change into the pending one, field by field.
    pub fn update_camera(&mut self, data: CameraSwapData) {
        if data.is_empty() {
            return;
        }
        self.camera.get_or_insert_default().merge(data);
    }

    /// Replace any pending emitter submission.
    pub fn submit_particles(&mut self, request: ParticleSubmitRequest) {
        self.particle_submit = Some(request);
    }

    pub fn add_tick_request(&mut self, request: EmitterTickRequest) {
        let pending = self.emitter_tick.get_or_insert_default();
        for index in request.emitter_indices {
            if !pending.emitter_indices.contains(&index) {
                pending.emitter_indices.push(index);
            }
        }
    }

    pub fn add_transform_request(&mut self, request: EmitterTransformRequest) {
        self.emitter_transform
            .get_or_insert_default()
            .transforms
            .extend(request.transforms);
    }

    /// Clear one payload field after it has been fully drained.
    pub fn reset_field(&mut self, domain: SwapDomain) {
        match domain {
            SwapDomain::LevelResource => self.level_resource = None,
            SwapDomain::ObjectUpserts => self.object_upserts = None,
            SwapDomain::ObjectDeletions => self.object_deletions = None,
            SwapDomain::Camera => self.camera = None,
            SwapDomain::ParticleSubmit => self.particle_submit = None,
            SwapDomain::EmitterTick => self.emitter_tick = None,
            SwapDomain::EmitterTransform => self.emitter_transform = None,
        }
    }

    pub fn has_field(&self, domain: SwapDomain) -> bool {
        match domain {
            SwapDomain::LevelResource => self.level_resource.is_some(),
            SwapDomain::ObjectUpserts => self.object_upserts.is_some(),
            SwapDomain::ObjectDeletions => self.object_deletions.is_some(),
            SwapDomain::Camera => self.camera.is_some(),
            SwapDomain::ParticleSubmit => self.particle_submit.is_some(),
            SwapDomain::EmitterTick => self.emitter_tick.is_some(),
            SwapDomain::EmitterTransform => self.emitter_transform.is_some(),
        }
    }

    /// True when every field is absent.
    pub fn is_drained(&self) -> bool {
        SwapDomain::ALL.iter().all(|d| !self.has_field(*d))
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Pair of frame deltas with a logic side and a render side.
#[derive(Debug, Default)]
pub struct SwapBuffer {
    deltas: [FrameDelta; 2],
    logic_index: usize,
}

impl SwapBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn render_index(&self) -> usize {
        1 - self.logic_index
    }

    /// The producer side, for logic-side appends.
    pub fn writable(&mut self) -> &mut FrameDelta {
        &mut self.deltas[self.logic_index]
    }

    /// The consumer side, for render-side draining.
    pub fn readable(&mut self) -> &mut FrameDelta {
        let index = self.render_index();
        &mut self.deltas[index]
    }

    /// Read-only view of the consumer side.
    pub fn pending(&self) -> &FrameDelta {
        &self.deltas[self.render_index()]
    }

    /// Clear one drained field on the consumer side.
    pub fn reset_field(&mut self, domain: SwapDomain) {
        self.readable().reset_field(domain);
    }

    /// A swap is only allowed once the render side is fully drained.
    pub fn is_ready_to_swap(&self) -> bool {
        self.pending().is_drained()
    }

    /// Exchange producer and consumer roles.
    ///
    /// Returns `false` and leaves both sides alone if the render side still
    /// holds undrained payloads; the logic side then keeps accumulating.
    pub fn swap(&mut self) -> bool {
        if !self.is_ready_to_swap() {
            tracing::warn!("render side not drained, swap deferred");
            return false;
        }
        self.logic_index = self.render_index();
        true
    }

    /// Drop everything pending on both sides.
    pub fn clear(&mut self) {
        for delta in &mut self.deltas {
            delta.clear();
        }
    }
}
