//! ECS components for hecs entities.
//!
//! Components are plain data structs with no methods.
//! Logic lives in the simulation systems, not here.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use crate::enums::FeatureCategory;
use crate::types::{GeoPoint, LocalPoint, Weapon};

/// Stable identifier of a building within a scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BuildingId(pub u32);

/// Base-level ring of an extruded building volume, in scene-local meters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Footprint {
    pub ring: Vec<LocalPoint>,
}

/// Static building properties resolved from source tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildingInfo {
    pub category: FeatureCategory,
    /// Extrusion height in meters.
    pub height: f64,
    /// Terrain height under the footprint centroid (exaggerated meters).
    pub base_elevation: f64,
    pub name: Option<String>,
}

/// Damage accumulated by a building across impacts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BuildingDamage {
    pub total: f64,
    pub hits: u32,
}

/// One building affected by an impact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffectedBuilding {
    pub building: BuildingId,
    pub damage: f64,
}

/// A simulated impact. Lives until the scenario is cleared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Impact {
    pub id: u32,
    pub weapon: Weapon,
    pub geo: GeoPoint,
    pub local: LocalPoint,
    /// Terrain height at the impact point (exaggerated meters).
    pub ground_z: f64,
    pub affected: Vec<AffectedBuilding>,
}

/// Animation parameters of one blast. Mutated every tick by the blast system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectState {
    pub impact_id: u32,
    /// Blast center in local meters (z = up).
    pub center: DVec3,
    /// Seconds since the effect was created.
    pub age: f64,
    /// Main flash duration in seconds.
    pub life: f64,
    /// Smoke column duration in seconds.
    pub smoke_life: f64,
    /// Largest glow scale reached at the end of `life`.
    pub max_scale: f64,
    pub glow_scale: f64,
    pub glow_opacity: f64,
    pub light_intensity: f64,
    pub particle_opacity: f64,
    pub smoke_progress: f64,
    pub smoke_position: DVec3,
    pub smoke_scale: f64,
    pub smoke_opacity: f64,
    pub sphere_scale: f64,
    pub sphere_opacity: f64,
    pub label_opacity: f64,
}

/// Glow particle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Particle {
    pub position: DVec3,
    pub velocity: DVec3,
}

/// Glow particles of one effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticleCloud {
    pub particles: Vec<Particle>,
}

/// Debris shard thrown by a blast.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DebrisShard {
    pub position: DVec3,
    pub velocity: DVec3,
    /// Euler rotation in radians.
    pub rotation: DVec3,
    /// Radians per second around each axis.
    pub angular_velocity: DVec3,
    pub opacity: f64,
    /// Set once the shard has touched the terrain.
    pub grounded: bool,
}

/// Debris shards of one effect.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebrisField {
    pub shards: Vec<DebrisShard>,
}
