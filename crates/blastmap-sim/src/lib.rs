//! Simulation engine for BLASTMAP.
//!
//! Owns the hecs ECS world of a scene, tests impacts against building
//! footprints, advances blast effects at a fixed tick rate and produces
//! SceneSnapshots for a renderer.

pub mod engine;
pub mod error;
pub mod impact;
pub mod scene;
pub mod systems;

pub use blastmap_core as core;
pub use engine::{SimConfig, SimulationEngine};
pub use error::SimError;

#[cfg(test)]
mod tests;
