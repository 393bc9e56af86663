//! Feature classification by ordered dispatch tables.
//!
//! Each way and multipolygon relation lands in at most one category: the
//! first rule whose predicate matches wins. Nodes are scanned separately
//! against the point table, so a node may be both a way vertex and a point
//! feature.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use blastmap_core::enums::{FeatureCategory, GeometryKind};
use blastmap_core::types::GeoPoint;

use crate::multipolygon;
use crate::osm::{ElementCollection, ElementIndex, ElementKind, RawElement, Tags};
use crate::tags::FeatureAttributes;

/// Tag predicate of a dispatch rule.
pub type TagPredicate = fn(&Tags) -> bool;

/// One (predicate, category) dispatch entry.
pub type Rule = (TagPredicate, FeatureCategory);

fn has(tags: &Tags, key: &str) -> bool {
    tags.contains_key(key)
}

fn is(tags: &Tags, key: &str, value: &str) -> bool {
    tags.get(key).is_some_and(|v| v == value)
}

/// `building=no` explicitly marks a non-building.
fn is_building(t: &Tags) -> bool {
    t.get("building").is_some_and(|v| v != "no")
}
fn is_hospital(t: &Tags) -> bool {
    is(t, "amenity", "hospital")
}
fn is_school(t: &Tags) -> bool {
    is(t, "amenity", "school")
}
fn is_highway(t: &Tags) -> bool {
    has(t, "highway")
}
fn is_railway(t: &Tags) -> bool {
    has(t, "railway")
}
fn is_hill(t: &Tags) -> bool {
    is(t, "natural", "hill")
}
fn is_water(t: &Tags) -> bool {
    is(t, "natural", "water") || is(t, "water", "lake") || has(t, "waterway")
}
fn is_water_area(t: &Tags) -> bool {
    is(t, "natural", "water") || has(t, "water") || is(t, "landuse", "reservoir")
}
fn is_parking(t: &Tags) -> bool {
    is(t, "amenity", "parking")
}
fn is_industrial(t: &Tags) -> bool {
    is(t, "landuse", "industrial")
}
fn is_aeroway(t: &Tags) -> bool {
    has(t, "aeroway")
}
fn is_bridge(t: &Tags) -> bool {
    has(t, "bridge")
}
fn is_power(t: &Tags) -> bool {
    has(t, "power")
}
fn is_park(t: &Tags) -> bool {
    is(t, "leisure", "park") || is(t, "landuse", "park")
}
fn is_peak(t: &Tags) -> bool {
    is(t, "natural", "peak") || is(t, "natural", "mountain")
}
fn is_bus_stop(t: &Tags) -> bool {
    is(t, "highway", "bus_stop")
}
fn is_aerodrome(t: &Tags) -> bool {
    is(t, "aeroway", "aerodrome")
}

/// Way rules, highest priority first.
pub const WAY_RULES: &[Rule] = &[
    (is_building, FeatureCategory::Building),
    (is_hospital, FeatureCategory::Hospital),
    (is_school, FeatureCategory::School),
    (is_highway, FeatureCategory::Highway),
    (is_railway, FeatureCategory::Railway),
    (is_hill, FeatureCategory::Hill),
    (is_water, FeatureCategory::Water),
    (is_parking, FeatureCategory::Parking),
    (is_industrial, FeatureCategory::Industrial),
    (is_aeroway, FeatureCategory::Aeroway),
    (is_bridge, FeatureCategory::Bridge),
    (is_power, FeatureCategory::Power),
    (is_park, FeatureCategory::Park),
];

/// Multipolygon relation rules, highest priority first.
pub const RELATION_RULES: &[Rule] = &[
    (is_water_area, FeatureCategory::Water),
    (is_park, FeatureCategory::Park),
    (is_building, FeatureCategory::Building),
    (is_hill, FeatureCategory::Hill),
    (is_hospital, FeatureCategory::Hospital),
    (is_school, FeatureCategory::School),
    (is_parking, FeatureCategory::Parking),
    (is_industrial, FeatureCategory::Industrial),
    (is_aeroway, FeatureCategory::Aeroway),
];

/// Point rules for tagged nodes, highest priority first.
pub const NODE_RULES: &[Rule] = &[
    (is_peak, FeatureCategory::Peak),
    (is_hospital, FeatureCategory::HospitalPoint),
    (is_school, FeatureCategory::SchoolPoint),
    (is_bus_stop, FeatureCategory::BusStop),
    (is_power, FeatureCategory::PowerPoint),
    (is_aerodrome, FeatureCategory::Aerodrome),
    (is_parking, FeatureCategory::ParkingPoint),
];

/// First category whose predicate matches `tags`.
pub fn first_match(rules: &[Rule], tags: &Tags) -> Option<FeatureCategory> {
    rules
        .iter()
        .find(|(predicate, _)| predicate(tags))
        .map(|(_, category)| *category)
}

/// Geometry of a classified feature, in lat/lon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "points", rename_all = "snake_case")]
pub enum FeatureGeometry {
    Point(GeoPoint),
    Polyline(Vec<GeoPoint>),
    /// Implicitly closed: the last vertex connects back to the first and is
    /// not repeated.
    Ring(Vec<GeoPoint>),
}

impl FeatureGeometry {
    pub fn points(&self) -> &[GeoPoint] {
        match self {
            FeatureGeometry::Point(p) => std::slice::from_ref(p),
            FeatureGeometry::Polyline(points) | FeatureGeometry::Ring(points) => points,
        }
    }

    pub fn is_ring(&self) -> bool {
        matches!(self, FeatureGeometry::Ring(_))
    }
}

/// A categorized feature with its geometry and parsed attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedFeature {
    pub id: i64,
    pub source: ElementKind,
    pub category: FeatureCategory,
    pub geometry: FeatureGeometry,
    pub attributes: FeatureAttributes,
    pub source_tags: Tags,
}

impl ClassifiedFeature {
    fn new(
        id: i64,
        source: ElementKind,
        category: FeatureCategory,
        geometry: FeatureGeometry,
        tags: &Tags,
    ) -> Self {
        Self {
            id,
            source,
            category,
            geometry,
            attributes: FeatureAttributes::from_tags(tags),
            source_tags: tags.clone(),
        }
    }
}

/// Classifier output grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifiedFeatures {
    pub by_category: BTreeMap<FeatureCategory, Vec<ClassifiedFeature>>,
}

impl ClassifiedFeatures {
    pub fn get(&self, category: FeatureCategory) -> &[ClassifiedFeature] {
        self.by_category
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn push(&mut self, feature: ClassifiedFeature) {
        self.by_category
            .entry(feature.category)
            .or_default()
            .push(feature);
    }

    /// Total feature count across categories.
    pub fn len(&self) -> usize {
        self.by_category.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedFeature> {
        self.by_category.values().flatten()
    }

    /// Count per category name, for summaries.
    pub fn counts(&self) -> BTreeMap<&'static str, usize> {
        self.by_category
            .iter()
            .map(|(category, features)| (category.name(), features.len()))
            .collect()
    }
}

/// Shape a way's resolved points for its category. `None` when fewer than
/// two points remain.
fn way_geometry(
    category: FeatureCategory,
    refs: &[i64],
    mut points: Vec<GeoPoint>,
) -> Option<FeatureGeometry> {
    let closed = refs.len() > 2 && refs.first() == refs.last();
    let ring = match category.way_geometry() {
        GeometryKind::Ring => true,
        GeometryKind::ClosedIfRing => closed,
        GeometryKind::Polyline | GeometryKind::Point => false,
    };
    if ring && closed && points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    if points.len() < 2 {
        return None;
    }
    Some(if ring {
        FeatureGeometry::Ring(points)
    } else {
        FeatureGeometry::Polyline(points)
    })
}

/// Classify every element of a collection.
pub fn classify(collection: &ElementCollection) -> ClassifiedFeatures {
    let index = ElementIndex::build(collection);
    let mut out = ClassifiedFeatures::default();

    for element in &collection.elements {
        match element {
            RawElement::Way { id, node_refs, tags } => {
                let Some(category) = first_match(WAY_RULES, tags) else {
                    continue;
                };
                let points = index.resolve(node_refs);
                match way_geometry(category, node_refs, points) {
                    Some(geometry) => out.push(ClassifiedFeature::new(
                        *id,
                        ElementKind::Way,
                        category,
                        geometry,
                        tags,
                    )),
                    None => trace!(way = id, "dropping way with fewer than two resolved points"),
                }
            }
            RawElement::Relation { id, members, tags } => {
                if !multipolygon::is_multipolygon(tags) {
                    continue;
                }
                let Some(outline) = multipolygon::stitch_outline(*id, members, &index) else {
                    continue;
                };
                match first_match(RELATION_RULES, tags) {
                    Some(category) => out.push(ClassifiedFeature::new(
                        *id,
                        ElementKind::Relation,
                        category,
                        FeatureGeometry::Ring(outline),
                        tags,
                    )),
                    None => trace!(relation = id, "unmatched multipolygon"),
                }
            }
            RawElement::Node { id, lat, lon, tags } => {
                if tags.is_empty() {
                    continue;
                }
                if let Some(category) = first_match(NODE_RULES, tags) {
                    let geometry = FeatureGeometry::Point(GeoPoint::new(*lat, *lon));
                    out.push(ClassifiedFeature::new(
                        *id,
                        ElementKind::Node,
                        category,
                        geometry,
                        tags,
                    ));
                }
            }
        }
    }

    debug!(
        elements = collection.len(),
        features = out.len(),
        "classified features"
    );
    out
}
