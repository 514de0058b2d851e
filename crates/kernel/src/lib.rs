//! World Kernel: the logic-owned domain model.
//!
//! # Invariants
//! - Only the logic tick mutates the world.
//! - Every mutation is appended to the event log; the log is drained exactly
//!   once per logic tick and translated into the render hand-off.
//! - The render side never reads the world directly.

pub mod world;

pub use world::{
    CameraChange, EmitterIndex, GameObject, LogicCamera, MeshPart, World, WorldError, WorldEvent,
};
