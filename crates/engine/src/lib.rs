//! Engine context: owns the world and the render system and runs the frame
//! loop.
//!
//! # Invariants
//! - The world is only read while publishing, after the logic tick.
//! - Exactly one swap per frame, between the logic tick and the render tick.
//! - Configuration errors surface from [`Engine::start`]; nothing inside a
//!   frame is fatal.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod timing;

pub use bridge::{Published, object_desc, publish_events};
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use timing::FpsCounter;

pub fn crate_info() -> &'static str {
    "frameline-engine v0.1.0"
}
