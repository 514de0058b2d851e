use frameline_common::{ObjectId, ParticleEmitterDesc};
use std::collections::HashSet;

use crate::desc::{EmitterTransformDesc, ParticleSubmitRequest};

/// One emitter as the particle pass sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmitterState {
    pub desc: ParticleEmitterDesc,
    /// Cleared when the owning object is deleted. Indices stay stable.
    pub active: bool,
}

/// What the particle pass draws this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleFrameData {
    pub active_emitters: usize,
    pub ticked: Vec<usize>,
}

/// Render-side emitter set and the per-frame simulation requests.
#[derive(Debug, Default)]
pub struct ParticlePass {
    emitters: Vec<EmitterState>,
    tick_indices: Vec<usize>,
    /// Owners deleted on the render side. Their emitters stay inactive
    /// across resubmits until the owner is upserted again.
    retired_owners: HashSet<ObjectId>,
}

impl ParticlePass {
    /// Replace every emitter with the submitted set. Emitters of retired
    /// owners come back inactive.
    pub fn submit(&mut self, request: &ParticleSubmitRequest) {
        let retired = &self.retired_owners;
        self.emitters = request
            .emitters
            .iter()
            .map(|desc| EmitterState {
                desc: desc.clone(),
                active: desc.owner.is_none_or(|owner| !retired.contains(&owner)),
            })
            .collect();
        self.tick_indices.clear();
        tracing::debug!(emitters = self.emitters.len(), "particle emitters submitted");
    }

    /// Emitters to simulate this frame. Unknown indices are dropped.
    pub fn set_tick_indices(&mut self, indices: &[usize]) {
        let count = self.emitters.len();
        self.tick_indices = indices
            .iter()
            .copied()
            .filter(|&index| {
                let known = index < count;
                if !known {
                    tracing::warn!(index, count, "tick request for unknown emitter");
                }
                known
            })
            .collect();
    }

    pub fn set_transforms(&mut self, transforms: &[EmitterTransformDesc]) {
        for transform in transforms {
            match self.emitters.get_mut(transform.index) {
                Some(state) => {
                    state.desc.position = transform.position;
                    state.desc.rotation = transform.rotation;
                }
                None => tracing::warn!(index = transform.index, "transform for unknown emitter"),
            }
        }
    }

    /// Deactivate every emitter owned by `owner`.
    pub fn retire_emitters_owned_by(&mut self, owner: ObjectId) -> usize {
        self.retired_owners.insert(owner);
        let mut retired = 0;
        for state in &mut self.emitters {
            if state.active && state.desc.owner == Some(owner) {
                state.active = false;
                retired += 1;
            }
        }
        if retired > 0 {
            self.tick_indices
                .retain(|&i| self.emitters.get(i).is_some_and(|s| s.active));
        }
        retired
    }

    /// Reactivate the emitters of a retired owner that came back. Returns
    /// how many were reactivated.
    pub fn restore_emitters_owned_by(&mut self, owner: ObjectId) -> usize {
        if !self.retired_owners.remove(&owner) {
            return 0;
        }
        let mut restored = 0;
        for state in &mut self.emitters {
            if !state.active && state.desc.owner == Some(owner) {
                state.active = true;
                restored += 1;
            }
        }
        restored
    }

    pub fn emitter_count(&self) -> usize {
        self.emitters.len()
    }

    pub fn emitters(&self) -> &[EmitterState] {
        &self.emitters
    }

    pub fn tick_indices(&self) -> &[usize] {
        &self.tick_indices
    }

    pub fn frame_data(&self) -> ParticleFrameData {
        ParticleFrameData {
            active_emitters: self.emitters.iter().filter(|s| s.active).count(),
            ticked: self.tick_indices.clone(),
        }
    }

    /// Tick requests are per frame.
    pub fn end_frame(&mut self) {
        self.tick_indices.clear();
    }

    pub fn clear(&mut self) {
        self.emitters.clear();
        self.tick_indices.clear();
        self.retired_owners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};

    fn emitter(owner: Option<u64>) -> ParticleEmitterDesc {
        ParticleEmitterDesc {
            owner: owner.map(ObjectId),
            ..ParticleEmitterDesc::default()
        }
    }

    fn pass_with(owners: &[Option<u64>]) -> ParticlePass {
        let mut pass = ParticlePass::default();
        pass.submit(&ParticleSubmitRequest {
            emitters: owners.iter().map(|o| emitter(*o)).collect(),
        });
        pass
    }

    #[test]
    fn submit_replaces_emitters() {
        let mut pass = pass_with(&[None, None, None]);
        assert_eq!(pass.emitter_count(), 3);
        pass.submit(&ParticleSubmitRequest {
            emitters: vec![emitter(None)],
        });
        assert_eq!(pass.emitter_count(), 1);
    }

    #[test]
    fn unknown_tick_indices_are_dropped() {
        let mut pass = pass_with(&[None, None]);
        pass.set_tick_indices(&[0, 1, 5]);
        assert_eq!(pass.tick_indices(), &[0, 1]);
        pass.end_frame();
        assert!(pass.tick_indices().is_empty());
    }

    #[test]
    fn transforms_overwrite_pose() {
        let mut pass = pass_with(&[None]);
        let rotation = Quat::from_rotation_y(1.0);
        pass.set_transforms(&[
            EmitterTransformDesc {
                index: 0,
                position: Vec3::new(1.0, 2.0, 3.0),
                rotation,
            },
            EmitterTransformDesc {
                index: 9,
                position: Vec3::ZERO,
                rotation: Quat::IDENTITY,
            },
        ]);
        let desc = &pass.emitters()[0].desc;
        assert_eq!(desc.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(desc.rotation, rotation);
    }

    #[test]
    fn retiring_owner_deactivates_its_emitters() {
        let mut pass = pass_with(&[Some(7), None, Some(7), Some(8)]);
        pass.set_tick_indices(&[0, 1, 2, 3]);
        assert_eq!(pass.retire_emitters_owned_by(ObjectId(7)), 2);
        assert_eq!(pass.retire_emitters_owned_by(ObjectId(7)), 0);
        assert_eq!(pass.tick_indices(), &[1, 3]);

        let frame = pass.frame_data();
        assert_eq!(frame.active_emitters, 2);
        assert_eq!(pass.emitter_count(), 4);
    }

    #[test]
    fn resubmit_keeps_retired_owner_inactive() {
        let mut pass = pass_with(&[Some(7)]);
        pass.retire_emitters_owned_by(ObjectId(7));
        pass.submit(&ParticleSubmitRequest {
            emitters: vec![emitter(Some(7)), emitter(None)],
        });

        assert!(!pass.emitters()[0].active);
        assert!(pass.emitters()[1].active);
        assert_eq!(pass.frame_data().active_emitters, 1);
    }

    #[test]
    fn returning_owner_restores_emitters() {
        let mut pass = pass_with(&[Some(7), Some(8)]);
        pass.retire_emitters_owned_by(ObjectId(7));
        assert_eq!(pass.restore_emitters_owned_by(ObjectId(8)), 0);
        assert_eq!(pass.restore_emitters_owned_by(ObjectId(7)), 1);
        assert!(pass.emitters()[0].active);

        pass.submit(&ParticleSubmitRequest {
            emitters: vec![emitter(Some(7))],
        });
        assert!(pass.emitters()[0].active);
    }
}
