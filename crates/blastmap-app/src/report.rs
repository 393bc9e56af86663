//! JSON summary printed by the CLI after a simulation run.

use std::collections::BTreeMap;

use serde::Serialize;

use blastmap_core::enums::{FeatureCategory, TerrainStatus};
use blastmap_core::events::SimEvent;
use blastmap_core::state::{BuildingDamageView, ImpactView, SceneSnapshot};
use blastmap_core::types::GeoPoint;
use blastmap_features::ClassifiedFeatures;

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub origin: Option<GeoPoint>,
    pub features: BTreeMap<&'static str, usize>,
    pub buildings: usize,
    pub terrain: TerrainStatus,
    pub elapsed_secs: f64,
    pub impacts: Vec<ImpactView>,
    pub damaged_buildings: Vec<BuildingDamageView>,
    pub total_damage: f64,
    pub events: Vec<SimEvent>,
}

impl SimulationReport {
    pub fn new(features: &ClassifiedFeatures, snapshot: SceneSnapshot, events: Vec<SimEvent>) -> Self {
        let total_damage = snapshot.damaged_buildings.iter().map(|b| b.total).sum();
        Self {
            origin: snapshot.origin,
            features: features.counts(),
            buildings: features.get(FeatureCategory::Building).len(),
            terrain: snapshot.terrain,
            elapsed_secs: snapshot.time.elapsed_secs,
            impacts: snapshot.impacts,
            damaged_buildings: snapshot.damaged_buildings,
            total_damage,
            events,
        }
    }
}
