//! Scene snapshot: the visible state handed to a renderer after each tick.

use serde::{Deserialize, Serialize};

use crate::components::{AffectedBuilding, BuildingId};
use crate::enums::TerrainStatus;
use crate::events::SimEvent;
use crate::types::{GeoPoint, LocalPoint, SimTime, Weapon};

/// Complete scene state after a tick.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub time: SimTime,
    pub origin: Option<GeoPoint>,
    pub terrain: TerrainStatus,
    pub impacts: Vec<ImpactView>,
    pub effects: Vec<EffectView>,
    pub damaged_buildings: Vec<BuildingDamageView>,
    pub events: Vec<SimEvent>,
}

/// A registered impact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactView {
    pub impact_id: u32,
    pub weapon: Weapon,
    pub geo: GeoPoint,
    pub local: LocalPoint,
    pub ground_z: f64,
    pub affected: Vec<AffectedBuilding>,
}

/// Scalar outputs of one blast effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EffectView {
    pub impact_id: u32,
    pub center: [f64; 3],
    pub age: f64,
    pub glow_scale: f64,
    pub glow_opacity: f64,
    pub light_intensity: f64,
    pub particle_opacity: f64,
    pub particles: Vec<[f64; 3]>,
    pub smoke_progress: f64,
    pub smoke_position: [f64; 3],
    pub smoke_scale: f64,
    pub smoke_opacity: f64,
    pub sphere_scale: f64,
    pub sphere_opacity: f64,
    pub label_opacity: f64,
    pub debris: Vec<DebrisView>,
}

/// One debris shard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebrisView {
    pub position: [f64; 3],
    pub rotation: [f64; 3],
    pub opacity: f64,
}

/// Cumulative damage of a building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingDamageView {
    pub building: BuildingId,
    pub total: f64,
    pub hits: u32,
}
