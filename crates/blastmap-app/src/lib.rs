//! BLASTMAP headless host.
//!
//! This crate wires the simulation crates to the HTTP data sources and runs
//! the engine on a dedicated game loop thread.

pub mod config;
pub mod game_loop;
pub mod report;
pub mod sources;
pub mod state;

pub use blastmap_core as core;
