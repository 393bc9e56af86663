//! Commands sent from a caller to the simulation.
//!
//! Commands are queued and processed at the next tick boundary.

use serde::{Deserialize, Serialize};

use crate::types::Weapon;

/// All caller actions that mutate the impact scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimCommand {
    /// Simulate a weapon impact at a geographic position.
    SimulateImpact { weapon: Weapon, lat: f64, lon: f64 },
    /// Remove every impact and effect, and reset building damage.
    ClearImpacts,
}
