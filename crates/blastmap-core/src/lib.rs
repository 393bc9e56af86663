//! Core types and definitions for the BLASTMAP pipeline.
//!
//! This crate defines the vocabulary shared across all other crates:
//! geographic and local types, ECS components, commands, snapshots,
//! events, and constants. It has no dependency on any runtime framework.

pub mod commands;
pub mod components;
pub mod constants;
pub mod enums;
pub mod events;
pub mod state;
pub mod types;
