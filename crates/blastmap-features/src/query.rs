//! Overpass QL builder for the feature query service.

use std::fmt::Write;

use blastmap_core::types::BoundingBox;

/// Element scope of a tag filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryScope {
    Node,
    Way,
    /// Multipolygon relations only.
    Multipolygon,
}

impl QueryScope {
    fn keyword(self) -> &'static str {
        match self {
            QueryScope::Node => "node",
            QueryScope::Way => "way",
            QueryScope::Multipolygon => "relation[\"type\"=\"multipolygon\"]",
        }
    }
}

/// `["key"]` or `["key"="value"]` in a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagFilter {
    pub scope: QueryScope,
    pub key: String,
    pub value: Option<String>,
}

impl TagFilter {
    pub fn new(scope: QueryScope, key: &str, value: Option<&str>) -> Self {
        Self {
            scope,
            key: key.to_string(),
            value: value.map(str::to_string),
        }
    }
}

/// Filters matching every tag the classifier understands.
const DEFAULT_FILTERS: &[(QueryScope, &str, Option<&str>)] = &[
    (QueryScope::Way, "building", None),
    (QueryScope::Way, "amenity", Some("hospital")),
    (QueryScope::Way, "amenity", Some("school")),
    (QueryScope::Way, "highway", None),
    (QueryScope::Way, "railway", None),
    (QueryScope::Way, "natural", Some("hill")),
    (QueryScope::Way, "natural", Some("water")),
    (QueryScope::Way, "water", Some("lake")),
    (QueryScope::Way, "waterway", None),
    (QueryScope::Way, "amenity", Some("parking")),
    (QueryScope::Way, "landuse", Some("industrial")),
    (QueryScope::Way, "aeroway", None),
    (QueryScope::Way, "bridge", None),
    (QueryScope::Way, "power", None),
    (QueryScope::Way, "leisure", Some("park")),
    (QueryScope::Way, "landuse", Some("park")),
    (QueryScope::Multipolygon, "natural", Some("water")),
    (QueryScope::Multipolygon, "water", None),
    (QueryScope::Multipolygon, "landuse", Some("reservoir")),
    (QueryScope::Multipolygon, "leisure", Some("park")),
    (QueryScope::Multipolygon, "landuse", Some("park")),
    (QueryScope::Multipolygon, "building", None),
    (QueryScope::Multipolygon, "natural", Some("hill")),
    (QueryScope::Multipolygon, "amenity", None),
    (QueryScope::Multipolygon, "landuse", Some("industrial")),
    (QueryScope::Multipolygon, "aeroway", None),
    (QueryScope::Node, "natural", Some("peak")),
    (QueryScope::Node, "natural", Some("mountain")),
    (QueryScope::Node, "amenity", Some("hospital")),
    (QueryScope::Node, "amenity", Some("school")),
    (QueryScope::Node, "highway", Some("bus_stop")),
    (QueryScope::Node, "power", None),
    (QueryScope::Node, "aeroway", Some("aerodrome")),
    (QueryScope::Node, "amenity", Some("parking")),
];

/// A region query against the feature service.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    pub bbox: BoundingBox,
    pub filters: Vec<TagFilter>,
    pub timeout_secs: u32,
}

impl FeatureQuery {
    /// Query for every classifiable feature in `bbox`.
    pub fn for_bbox(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            filters: DEFAULT_FILTERS
                .iter()
                .map(|(scope, key, value)| TagFilter::new(*scope, key, *value))
                .collect(),
            timeout_secs: 25,
        }
    }

    pub fn with_filters(mut self, filters: Vec<TagFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_timeout(mut self, secs: u32) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Overpass QL text. Member ways and nodes are recursed so that every
    /// ref in the response resolves.
    pub fn to_overpass_ql(&self) -> String {
        let b = &self.bbox;
        let area = format!("({},{},{},{})", b.south, b.west, b.north, b.east);

        let mut ql = format!("[out:json][timeout:{}];\n(\n", self.timeout_secs);
        for filter in &self.filters {
            let _ = match &filter.value {
                Some(value) => writeln!(
                    ql,
                    "  {}[\"{}\"=\"{}\"]{};",
                    filter.scope.keyword(),
                    filter.key,
                    value,
                    area
                ),
                None => writeln!(ql, "  {}[\"{}\"]{};", filter.scope.keyword(), filter.key, area),
            };
        }
        ql.push_str(");\n(._;>;);\nout body;\n");
        ql
    }
}
