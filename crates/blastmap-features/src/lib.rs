//! Feature classification for BLASTMAP.
//!
//! Raw tagged map elements in, categorized geometry out. Everything here
//! stays in lat/lon; projection into the scene frame happens in the sim.

pub mod classify;
pub mod multipolygon;
pub mod osm;
pub mod query;
pub mod tags;

pub use blastmap_core as core;

pub use classify::{classify, ClassifiedFeature, ClassifiedFeatures, FeatureGeometry};
pub use osm::{ElementCollection, ElementIndex, ElementKind, Member, RawElement, Tags};
pub use query::FeatureQuery;
pub use tags::FeatureAttributes;
