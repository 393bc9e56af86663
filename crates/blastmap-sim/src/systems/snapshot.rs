//! Snapshot system: reads the ECS world and builds a SceneSnapshot.
//!
//! This system is read-only. Every list is sorted by id so that two engines
//! with the same inputs produce identical snapshots.

use hecs::World;

use blastmap_core::components::*;
use blastmap_core::enums::TerrainStatus;
use blastmap_core::events::SimEvent;
use blastmap_core::state::*;
use blastmap_core::types::{GeoPoint, SimTime};

/// Build a complete SceneSnapshot from the current world state.
pub fn build_snapshot(
    world: &World,
    time: &SimTime,
    origin: Option<GeoPoint>,
    terrain: TerrainStatus,
    events: Vec<SimEvent>,
) -> SceneSnapshot {
    SceneSnapshot {
        time: *time,
        origin,
        terrain,
        impacts: build_impacts(world),
        effects: build_effects(world),
        damaged_buildings: build_damage(world),
        events,
    }
}

fn build_impacts(world: &World) -> Vec<ImpactView> {
    let mut impacts: Vec<ImpactView> = world
        .query::<&Impact>()
        .iter()
        .map(|(_, impact)| ImpactView {
            impact_id: impact.id,
            weapon: impact.weapon,
            geo: impact.geo,
            local: impact.local,
            ground_z: impact.ground_z,
            affected: impact.affected.clone(),
        })
        .collect();
    impacts.sort_by_key(|i| i.impact_id);
    impacts
}

fn build_effects(world: &World) -> Vec<EffectView> {
    let mut effects: Vec<EffectView> = world
        .query::<(&EffectState, &ParticleCloud, &DebrisField)>()
        .iter()
        .map(|(_, (state, cloud, debris))| EffectView {
            impact_id: state.impact_id,
            center: state.center.to_array(),
            age: state.age,
            glow_scale: state.glow_scale,
            glow_opacity: state.glow_opacity,
            light_intensity: state.light_intensity,
            particle_opacity: state.particle_opacity,
            particles: cloud.particles.iter().map(|p| p.position.to_array()).collect(),
            smoke_progress: state.smoke_progress,
            smoke_position: state.smoke_position.to_array(),
            smoke_scale: state.smoke_scale,
            smoke_opacity: state.smoke_opacity,
            sphere_scale: state.sphere_scale,
            sphere_opacity: state.sphere_opacity,
            label_opacity: state.label_opacity,
            debris: debris
                .shards
                .iter()
                .map(|s| DebrisView {
                    position: s.position.to_array(),
                    rotation: s.rotation.to_array(),
                    opacity: s.opacity,
                })
                .collect(),
        })
        .collect();
    effects.sort_by_key(|e| e.impact_id);
    effects
}

/// Buildings hit at least once since the last clear.
fn build_damage(world: &World) -> Vec<BuildingDamageView> {
    let mut damaged: Vec<BuildingDamageView> = world
        .query::<(&BuildingId, &BuildingDamage)>()
        .iter()
        .filter(|(_, (_, damage))| damage.hits > 0)
        .map(|(_, (id, damage))| BuildingDamageView {
            building: *id,
            total: damage.total,
            hits: damage.hits,
        })
        .collect();
    damaged.sort_by_key(|d| d.building);
    damaged
}
