//! Shared value types for the frameline engine.
//!
//! Everything in this crate is plain data. The logic side builds these values
//! and the render side consumes them; neither side attaches behavior to them
//! beyond small math helpers.

mod bounds;
mod resource;
mod types;

pub use bounds::Aabb;
pub use resource::{MaterialDesc, MeshDesc, ParticleEmitterDesc, SkeletonPose, TextureSet};
pub use types::{CameraMode, ObjectId, Transform};
