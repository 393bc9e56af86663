//! Tests for the simulation engine: scene setup, impacts, effects, terrain.

use blastmap_core::commands::SimCommand;
use blastmap_core::components::{BuildingId, BuildingInfo, Impact};
use blastmap_core::constants::EARTH_RADIUS_M;
use blastmap_core::enums::{FeatureCategory, TerrainStatus, WeaponType};
use blastmap_core::events::SimEvent;
use blastmap_core::types::{BoundingBox, GeoPoint, Weapon};
use blastmap_features::osm::{ElementKind, Tags};
use blastmap_features::{ClassifiedFeature, ClassifiedFeatures, FeatureAttributes, FeatureGeometry};
use blastmap_terrain::{TerrainError, TerrainGrid};

use crate::engine::{SimConfig, SimulationEngine};
use crate::error::SimError;

/// Scene centered on (0, 0) so that one degree is the same length on both
/// axes.
fn scene_bbox() -> BoundingBox {
    BoundingBox::new(-0.01, -0.01, 0.01, 0.01)
}

/// Geographic point `x` meters east and `y` meters north of (0, 0).
fn at_meters(x: f64, y: f64) -> GeoPoint {
    let deg_per_m = 180.0 / (std::f64::consts::PI * EARTH_RADIUS_M);
    GeoPoint::new(y * deg_per_m, x * deg_per_m)
}

fn building(id: i64, corners: &[(f64, f64)], levels: Option<f64>) -> ClassifiedFeature {
    ClassifiedFeature {
        id,
        source: ElementKind::Way,
        category: FeatureCategory::Building,
        geometry: FeatureGeometry::Ring(corners.iter().map(|&(x, y)| at_meters(x, y)).collect()),
        attributes: FeatureAttributes {
            levels,
            ..Default::default()
        },
        source_tags: Tags::new(),
    }
}

/// A 10 m square at the origin and a second one 100 m east, plus a road.
fn features() -> ClassifiedFeatures {
    let mut features = ClassifiedFeatures::default();
    features.push(building(
        1,
        &[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)],
        Some(4.0),
    ));
    features.push(building(
        2,
        &[(100.0, 0.0), (110.0, 0.0), (110.0, 10.0), (100.0, 10.0)],
        None,
    ));
    features.push(ClassifiedFeature {
        id: 3,
        source: ElementKind::Way,
        category: FeatureCategory::Highway,
        geometry: FeatureGeometry::Polyline(vec![at_meters(-50.0, -5.0), at_meters(50.0, -5.0)]),
        attributes: FeatureAttributes::default(),
        source_tags: Tags::new(),
    });
    features
}

fn engine_with_scene(seed: u64) -> SimulationEngine {
    let mut engine = SimulationEngine::new(SimConfig {
        seed,
        ..Default::default()
    });
    engine.set_scene(scene_bbox()).unwrap();
    assert_eq!(engine.load_features(&features()).unwrap(), 2);
    engine
}

/// 2×2 grid over `bbox` with elevations [[0, 10], [20, 30]].
fn ramp_grid(bbox: &BoundingBox) -> TerrainGrid {
    let (rows, cols) = TerrainGrid::axes(bbox, 2).unwrap();
    TerrainGrid::from_samples(rows, cols, vec![Some(0.0), Some(10.0), Some(20.0), Some(30.0)])
        .unwrap()
}

// ---- Scene ----

#[test]
fn test_scene_origin_is_bbox_center() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    assert!(engine.origin().is_none());
    let origin = engine
        .set_scene(BoundingBox::new(48.0, 2.0, 48.02, 2.04))
        .unwrap();
    assert!((origin.lat - 48.01).abs() < 1e-12);
    assert!((origin.lon - 2.02).abs() < 1e-12);
    let local = engine.projection().unwrap().to_local(&origin);
    assert_eq!((local.x, local.y), (0.0, 0.0));
}

#[test]
fn test_invalid_scene_rejected() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let err = engine
        .set_scene(BoundingBox::new(1.0, 1.0, 1.0, 2.0))
        .unwrap_err();
    assert!(matches!(err, SimError::Terrain(TerrainError::InvalidBounds)));
}

#[test]
fn test_features_projected_into_scene() {
    let engine = engine_with_scene(1);
    assert_eq!(engine.features().len(), 3);
    let square = engine
        .features()
        .iter()
        .find(|f| f.id == 1)
        .expect("building feature");
    let corner = square.geometry.points()[2];
    assert!((corner.x - 10.0).abs() < 1e-6);
    assert!((corner.y - 10.0).abs() < 1e-6);
}

#[test]
fn test_reloading_features_replaces_buildings() {
    let mut engine = engine_with_scene(1);
    assert_eq!(engine.load_features(&features()).unwrap(), 2);

    assert_eq!(engine.features().len(), 3);
    let mut ids: Vec<BuildingId> = engine
        .world()
        .query::<&BuildingId>()
        .iter()
        .map(|(_, id)| *id)
        .collect();
    ids.sort();
    assert_eq!(ids, vec![BuildingId(2), BuildingId(3)]);

    let geo = at_meters(5.0, 5.0);
    let weapon = Weapon::new(WeaponType::Artillery, 51.0, 1.0);
    let impact = engine.simulate_impact(weapon, geo.lat, geo.lon).unwrap();
    assert_eq!(impact.affected.len(), 1, "square counted once");
    assert_eq!(impact.affected[0].building, BuildingId(2));
    assert!((impact.affected[0].damage - 1.0).abs() < 1e-6);
}

#[test]
fn test_operations_need_a_scene() {
    let mut engine = SimulationEngine::new(SimConfig::default());
    let weapon = Weapon::preset(WeaponType::Missile);
    assert!(matches!(
        engine.simulate_impact(weapon, 0.0, 0.0),
        Err(SimError::NoScene)
    ));
    assert!(matches!(
        engine.load_features(&features()),
        Err(SimError::NoScene)
    ));
    assert!(matches!(engine.begin_terrain_build(), Err(SimError::NoScene)));
}

// ---- Impacts ----

#[test]
fn test_impact_beside_square_building() {
    let mut engine = engine_with_scene(1);
    let geo = at_meters(12.0, 5.0);
    let weapon = Weapon::new(WeaponType::Missile, 300.0, 5.0);
    let impact = engine.simulate_impact(weapon, geo.lat, geo.lon).unwrap();

    assert!((impact.local.x - 12.0).abs() < 1e-6);
    assert_eq!(impact.ground_z, 0.0, "flat terrain before any build");
    assert_eq!(impact.affected.len(), 1);
    assert_eq!(impact.affected[0].building, BuildingId(0));
    assert!((impact.affected[0].damage - 10.0).abs() < 1e-6);
}

#[test]
fn test_damage_accumulates_and_clears() {
    let mut engine = engine_with_scene(1);
    let geo = at_meters(5.0, 5.0);
    let weapon = Weapon::new(WeaponType::Artillery, 51.0, 1.0);
    engine.simulate_impact(weapon, geo.lat, geo.lon).unwrap();
    engine.simulate_impact(weapon, geo.lat, geo.lon).unwrap();

    let damage = engine.building_damage(BuildingId(0)).unwrap();
    assert_eq!(damage.hits, 2);
    assert!((damage.total - 2.0).abs() < 1e-6, "51 / (1 + 50) per hit");
    assert_eq!(engine.building_damage(BuildingId(1)).unwrap().hits, 0);

    let snap = engine.tick();
    assert_eq!(snap.impacts.len(), 2);
    assert_eq!(snap.effects.len(), 2);
    assert_eq!(snap.damaged_buildings.len(), 1);

    assert_eq!(engine.clear_impacts(), 2);
    let snap = engine.tick();
    assert!(snap.impacts.is_empty());
    assert!(snap.effects.is_empty());
    assert!(snap.damaged_buildings.is_empty());
    assert!(snap.events.contains(&SimEvent::ImpactsCleared { count: 2 }));
    assert_eq!(engine.building_damage(BuildingId(0)).unwrap().hits, 0);
}

#[test]
fn test_large_blast_hits_both_buildings() {
    let mut engine = engine_with_scene(1);
    let weapon = Weapon::preset(WeaponType::Tactical);
    let geo = at_meters(50.0, 5.0);
    let impact = engine.simulate_impact(weapon, geo.lat, geo.lon).unwrap();
    let hit: Vec<BuildingId> = impact.affected.iter().map(|a| a.building).collect();
    assert_eq!(hit, vec![BuildingId(0), BuildingId(1)]);
}

#[test]
fn test_commands_processed_at_tick_boundary() {
    let mut engine = engine_with_scene(1);
    let geo = at_meters(0.0, 0.0);
    engine.queue_command(SimCommand::SimulateImpact {
        weapon: Weapon::preset(WeaponType::Missile),
        lat: geo.lat,
        lon: geo.lon,
    });
    assert!(engine.world().query::<&Impact>().iter().next().is_none());

    let snap = engine.tick();
    assert_eq!(snap.impacts.len(), 1);
    assert!(matches!(
        snap.events.as_slice(),
        [SimEvent::ImpactSimulated { impact_id: 0, buildings_hit: 1, .. }]
    ));

    // Events are delivered once.
    assert!(engine.tick().events.is_empty());

    engine.queue_command(SimCommand::ClearImpacts);
    assert!(engine.tick().impacts.is_empty());
}

// ---- Effects ----

#[test]
fn test_effect_expires_but_impact_remains() {
    let mut engine = engine_with_scene(1);
    let geo = at_meters(200.0, 200.0);
    // Artillery: life 1.15 s, smoke 2.875 s, gone after 4.025 s.
    engine
        .simulate_impact(Weapon::preset(WeaponType::Artillery), geo.lat, geo.lon)
        .unwrap();

    let mut expired_at = None;
    for tick in 1..=300u32 {
        let snap = engine.tick();
        if snap.events.contains(&SimEvent::EffectExpired { impact_id: 0 }) {
            expired_at = Some(tick);
            assert!(snap.effects.is_empty());
            assert_eq!(snap.impacts.len(), 1);
            break;
        }
        assert_eq!(snap.effects.len(), 1);
    }
    let tick = expired_at.expect("effect should expire");
    assert!((241..=243).contains(&tick), "expired at tick {tick}");
}

#[test]
fn test_effect_fades_in_snapshot() {
    let mut engine = engine_with_scene(1);
    let geo = at_meters(-30.0, 40.0);
    engine
        .simulate_impact(Weapon::preset(WeaponType::Missile), geo.lat, geo.lon)
        .unwrap();

    let first = engine.tick();
    let e0 = &first.effects[0];
    assert_eq!(e0.particles.len(), 24);
    assert_eq!(e0.debris.len(), 16);
    assert!(e0.glow_opacity > 0.9);

    let last = (0..90).map(|_| engine.tick()).last().unwrap();
    let e1 = &last.effects[0];
    // Missile life is 1.4 s: 91 ticks is past it.
    assert_eq!(e1.glow_opacity, 0.0);
    assert_eq!(e1.light_intensity, 0.0);
    assert!(e1.smoke_progress > 0.0 && e1.smoke_progress < 1.0);
    assert!(e1.smoke_position[2] > e0.smoke_position[2]);
    assert!(e1.glow_scale > e0.glow_scale);
}

// ---- Terrain ----

#[test]
fn test_terrain_build_applied_once() {
    let mut engine = engine_with_scene(1);
    let ticket = engine.begin_terrain_build().unwrap();
    assert_eq!(engine.tick().terrain, TerrainStatus::Building);
    assert!(matches!(
        engine.begin_terrain_build(),
        Err(SimError::Terrain(TerrainError::BuildInProgress))
    ));

    engine
        .complete_terrain_build(ticket, Ok(ramp_grid(&scene_bbox())))
        .unwrap();
    let snap = engine.tick();
    assert_eq!(snap.terrain, TerrainStatus::Ready);
    assert!(snap.events.contains(&SimEvent::TerrainApplied { nx: 2, ny: 2 }));
    assert!((engine.terrain().query(0.0, 0.0) - 7.5).abs() < 1e-6);

    // Impacts now sit on the terrain.
    let impact = engine.simulate_impact(Weapon::preset(WeaponType::Missile), 0.0, 0.0).unwrap();
    assert!((impact.ground_z - 7.5).abs() < 1e-6);
}

#[test]
fn test_buildings_rebased_on_terrain_swap() {
    let mut engine = engine_with_scene(1);
    let base = |engine: &SimulationEngine| -> f64 {
        engine
            .world()
            .query::<(&BuildingId, &BuildingInfo)>()
            .iter()
            .find(|(_, (id, _))| **id == BuildingId(0))
            .map(|(_, (_, info))| info.base_elevation)
            .unwrap()
    };
    assert_eq!(base(&engine), 0.0);

    let ticket = engine.begin_terrain_build().unwrap();
    engine
        .complete_terrain_build(ticket, Ok(ramp_grid(&scene_bbox())))
        .unwrap();
    assert!(base(&engine) > 7.0);
}

#[test]
fn test_terrain_with_other_origin_rejected() {
    let mut engine = engine_with_scene(1);
    let ticket = engine.begin_terrain_build().unwrap();
    let other = BoundingBox::new(0.0, 0.0, 0.02, 0.02);
    let err = engine
        .complete_terrain_build(ticket, Ok(ramp_grid(&other)))
        .unwrap_err();
    assert!(matches!(err, SimError::Terrain(TerrainError::OriginMismatch)));

    let snap = engine.tick();
    assert_eq!(snap.terrain, TerrainStatus::Flat);
    assert!(matches!(
        snap.events.as_slice(),
        [SimEvent::TerrainRejected { .. }]
    ));
    assert_eq!(engine.terrain().query(0.0, 0.0), 0.0);
}

#[test]
fn test_failed_build_keeps_previous_terrain() {
    let mut engine = engine_with_scene(1);
    let ticket = engine.begin_terrain_build().unwrap();
    engine
        .complete_terrain_build(ticket, Ok(ramp_grid(&scene_bbox())))
        .unwrap();

    let ticket = engine.begin_terrain_build().unwrap();
    let failure = TerrainError::BatchLength {
        batch: 1,
        expected: 100,
        got: 0,
    };
    assert!(engine.complete_terrain_build(ticket, Err(failure)).is_err());
    assert_eq!(engine.terrain().status(), TerrainStatus::Ready);
    assert!((engine.terrain().query(0.0, 0.0) - 7.5).abs() < 1e-6);
}

#[test]
fn test_new_scene_discards_outstanding_build() {
    let mut engine = engine_with_scene(1);
    let ticket = engine.begin_terrain_build().unwrap();
    engine.set_scene(scene_bbox()).unwrap();
    assert!(engine
        .complete_terrain_build(ticket, Ok(ramp_grid(&scene_bbox())))
        .is_err());
    assert_eq!(engine.terrain().status(), TerrainStatus::Flat);
}

// ---- Determinism ----

#[test]
fn test_determinism_same_seed() {
    let mut engine_a = engine_with_scene(12345);
    let mut engine_b = engine_with_scene(12345);
    let geo = at_meters(20.0, 20.0);
    let weapon = Weapon::preset(WeaponType::AirBomb);
    engine_a.simulate_impact(weapon, geo.lat, geo.lon).unwrap();
    engine_b.simulate_impact(weapon, geo.lat, geo.lon).unwrap();

    for _ in 0..200 {
        let json_a = serde_json::to_string(&engine_a.tick()).unwrap();
        let json_b = serde_json::to_string(&engine_b.tick()).unwrap();
        assert_eq!(json_a, json_b, "Snapshots diverged with same seed");
    }
}

#[test]
fn test_determinism_different_seeds() {
    let mut engine_a = engine_with_scene(111);
    let mut engine_b = engine_with_scene(222);
    let geo = at_meters(20.0, 20.0);
    let weapon = Weapon::preset(WeaponType::AirBomb);
    engine_a.simulate_impact(weapon, geo.lat, geo.lon).unwrap();
    engine_b.simulate_impact(weapon, geo.lat, geo.lon).unwrap();

    let snap_a = engine_a.tick();
    let snap_b = engine_b.tick();
    assert_ne!(
        serde_json::to_string(&snap_a.effects).unwrap(),
        serde_json::to_string(&snap_b.effects).unwrap()
    );
    // Geometry does not depend on the seed.
    assert_eq!(
        serde_json::to_string(&snap_a.impacts).unwrap(),
        serde_json::to_string(&snap_b.impacts).unwrap()
    );
}
