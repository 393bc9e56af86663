//! Scene assembly: classified features projected into the scene frame, and
//! building entities spawned from them.

use hecs::{Entity, World};
use serde::{Deserialize, Serialize};
use tracing::debug;

use blastmap_core::components::{BuildingDamage, BuildingId, BuildingInfo, Footprint};
use blastmap_core::enums::FeatureCategory;
use blastmap_core::types::{GeoPoint, LocalPoint};
use blastmap_features::{
    ClassifiedFeature, ClassifiedFeatures, FeatureAttributes, FeatureGeometry,
};
use blastmap_terrain::{GeoProjection, HeightField};

/// Feature geometry in local meters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum LocalGeometry {
    Point(LocalPoint),
    Polyline(Vec<LocalPoint>),
    Ring(Vec<LocalPoint>),
}

impl LocalGeometry {
    pub fn points(&self) -> &[LocalPoint] {
        match self {
            LocalGeometry::Point(p) => std::slice::from_ref(p),
            LocalGeometry::Polyline(points) | LocalGeometry::Ring(points) => points,
        }
    }
}

/// A classified feature placed in the scene frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalFeature {
    pub id: i64,
    pub category: FeatureCategory,
    pub geometry: LocalGeometry,
    pub attributes: FeatureAttributes,
}

/// Project one feature through the scene projection.
pub fn project_feature(feature: &ClassifiedFeature, projection: &GeoProjection) -> LocalFeature {
    let project_all = |points: &[GeoPoint]| -> Vec<LocalPoint> {
        points.iter().map(|p| projection.to_local(p)).collect()
    };
    let geometry = match &feature.geometry {
        FeatureGeometry::Point(p) => LocalGeometry::Point(projection.to_local(p)),
        FeatureGeometry::Polyline(points) => LocalGeometry::Polyline(project_all(points)),
        FeatureGeometry::Ring(points) => LocalGeometry::Ring(project_all(points)),
    };
    LocalFeature {
        id: feature.id,
        category: feature.category,
        geometry,
        attributes: feature.attributes.clone(),
    }
}

/// Project every feature, in category order.
pub fn project_features(
    features: &ClassifiedFeatures,
    projection: &GeoProjection,
) -> Vec<LocalFeature> {
    features
        .iter()
        .map(|f| project_feature(f, projection))
        .collect()
}

/// Vertex mean of a footprint.
pub fn footprint_centroid(ring: &[LocalPoint]) -> LocalPoint {
    if ring.is_empty() {
        return LocalPoint::default();
    }
    let n = ring.len() as f64;
    let (sx, sy) = ring
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    LocalPoint::new(sx / n, sy / n)
}

/// Spawn a building entity for every building ring. Returns the number
/// spawned.
pub fn spawn_buildings<H>(
    world: &mut World,
    features: &[LocalFeature],
    terrain: &H,
    next_building_id: &mut u32,
) -> usize
where
    H: HeightField + ?Sized,
{
    let mut spawned = 0;
    for feature in features {
        if feature.category != FeatureCategory::Building {
            continue;
        }
        let LocalGeometry::Ring(ring) = &feature.geometry else {
            continue;
        };

        let centroid = footprint_centroid(ring);
        let id = BuildingId(*next_building_id);
        *next_building_id += 1;

        world.spawn((
            id,
            Footprint { ring: ring.clone() },
            BuildingInfo {
                category: feature.category,
                height: feature.attributes.building_height(),
                base_elevation: terrain.height_at(centroid.x, centroid.y),
                name: feature.attributes.name.clone(),
            },
            BuildingDamage::default(),
        ));
        spawned += 1;
    }
    debug!(spawned, "spawned building entities");
    spawned
}

/// Despawn every building entity. Returns the number removed.
pub fn despawn_buildings(world: &mut World, despawn_buffer: &mut Vec<Entity>) -> usize {
    despawn_buffer.clear();
    for (entity, _id) in world.query_mut::<&BuildingId>() {
        despawn_buffer.push(entity);
    }
    let count = despawn_buffer.len();
    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
    count
}

/// Re-sample every building's base elevation, e.g. after a terrain swap.
pub fn rebase_buildings<H>(world: &mut World, terrain: &H)
where
    H: HeightField + ?Sized,
{
    for (_entity, (footprint, info)) in world.query_mut::<(&Footprint, &mut BuildingInfo)>() {
        let centroid = footprint_centroid(&footprint.ring);
        info.base_elevation = terrain.height_at(centroid.x, centroid.y);
    }
}
