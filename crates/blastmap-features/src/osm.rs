//! Raw map elements as delivered by the feature query service.
//!
//! The wire shape is the Overpass JSON envelope: `{"elements": [...]}` where
//! each element carries a `type` of `node`, `way` or `relation`.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::trace;

use blastmap_core::types::GeoPoint;

/// Free-form string tags of an element.
pub type Tags = BTreeMap<String, String>;

/// Kind of element, used for relation members and feature provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    Node,
    Way,
    Relation,
}

/// One member of a relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub kind: ElementKind,
    #[serde(rename = "ref")]
    pub reference: i64,
    #[serde(default)]
    pub role: String,
}

/// Tagged union of the three element kinds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawElement {
    Node {
        id: i64,
        lat: f64,
        lon: f64,
        #[serde(default)]
        tags: Tags,
    },
    Way {
        id: i64,
        #[serde(default, rename = "nodes")]
        node_refs: Vec<i64>,
        #[serde(default)]
        tags: Tags,
    },
    Relation {
        id: i64,
        #[serde(default)]
        members: Vec<Member>,
        #[serde(default)]
        tags: Tags,
    },
}

impl RawElement {
    pub fn id(&self) -> i64 {
        match self {
            RawElement::Node { id, .. }
            | RawElement::Way { id, .. }
            | RawElement::Relation { id, .. } => *id,
        }
    }

    pub fn kind(&self) -> ElementKind {
        match self {
            RawElement::Node { .. } => ElementKind::Node,
            RawElement::Way { .. } => ElementKind::Way,
            RawElement::Relation { .. } => ElementKind::Relation,
        }
    }

    pub fn tags(&self) -> &Tags {
        match self {
            RawElement::Node { tags, .. }
            | RawElement::Way { tags, .. }
            | RawElement::Relation { tags, .. } => tags,
        }
    }
}

/// Response envelope; elements are kept as raw JSON until validated.
#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    elements: Vec<serde_json::Value>,
}

/// The raw element collection for one query region.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ElementCollection {
    pub elements: Vec<RawElement>,
}

impl ElementCollection {
    pub fn new(elements: Vec<RawElement>) -> Self {
        Self { elements }
    }

    /// Parse an Overpass JSON response.
    ///
    /// Only a malformed envelope is an error. Elements of unknown type or
    /// with missing fields are skipped.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(json)?;
        let total = envelope.elements.len();
        let elements: Vec<RawElement> = envelope
            .elements
            .into_iter()
            .filter_map(|value| match serde_json::from_value(value) {
                Ok(element) => Some(element),
                Err(err) => {
                    trace!("skipping malformed element: {err}");
                    None
                }
            })
            .collect();
        if elements.len() < total {
            trace!(
                kept = elements.len(),
                total,
                "dropped malformed elements from response"
            );
        }
        Ok(Self { elements })
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &RawElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e, RawElement::Node { .. }))
    }

    pub fn ways(&self) -> impl Iterator<Item = &RawElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e, RawElement::Way { .. }))
    }

    pub fn relations(&self) -> impl Iterator<Item = &RawElement> {
        self.elements
            .iter()
            .filter(|e| matches!(e, RawElement::Relation { .. }))
    }
}

/// Id lookup over nodes and ways of a collection.
pub struct ElementIndex<'a> {
    nodes: HashMap<i64, GeoPoint>,
    ways: HashMap<i64, &'a [i64]>,
}

impl<'a> ElementIndex<'a> {
    pub fn build(collection: &'a ElementCollection) -> Self {
        let mut nodes = HashMap::new();
        let mut ways = HashMap::new();
        for element in &collection.elements {
            match element {
                RawElement::Node { id, lat, lon, .. } => {
                    nodes.insert(*id, GeoPoint::new(*lat, *lon));
                }
                RawElement::Way { id, node_refs, .. } => {
                    ways.insert(*id, node_refs.as_slice());
                }
                RawElement::Relation { .. } => {}
            }
        }
        Self { nodes, ways }
    }

    pub fn node(&self, id: i64) -> Option<GeoPoint> {
        self.nodes.get(&id).copied()
    }

    pub fn way_refs(&self, id: i64) -> Option<&'a [i64]> {
        self.ways.get(&id).copied()
    }

    /// Coordinates of `refs` in order. Unresolved refs are skipped.
    pub fn resolve(&self, refs: &[i64]) -> Vec<GeoPoint> {
        refs.iter()
            .filter_map(|r| {
                let point = self.node(*r);
                if point.is_none() {
                    trace!(node = r, "unresolved node ref");
                }
                point
            })
            .collect()
    }

    /// Coordinates of a way by id; empty when the way is unknown.
    pub fn resolve_way(&self, id: i64) -> Vec<GeoPoint> {
        match self.way_refs(id) {
            Some(refs) => self.resolve(refs),
            None => {
                trace!(way = id, "unresolved way ref");
                Vec::new()
            }
        }
    }
}
