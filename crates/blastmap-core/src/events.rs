//! Events emitted by the simulation for UI feedback.

use serde::{Deserialize, Serialize};

/// Discrete things that happened during a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SimEvent {
    /// An impact was registered.
    ImpactSimulated {
        impact_id: u32,
        buildings_hit: usize,
        total_damage: f64,
    },
    /// A blast effect finished and was removed.
    EffectExpired { impact_id: u32 },
    /// All impacts were cleared.
    ImpactsCleared { count: usize },
    /// A terrain grid replaced the live heightfield.
    TerrainApplied { nx: usize, ny: usize },
    /// A terrain build finished but was not applied.
    TerrainRejected { reason: String },
}
