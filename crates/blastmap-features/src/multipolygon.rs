//! Multipolygon outline assembly.
//!
//! Outer member ways are concatenated in member order. No ring closure, no
//! reordering, no clipping: disjoint outers produce one self-connected
//! outline.

use tracing::trace;

use blastmap_core::types::GeoPoint;

use crate::osm::{ElementIndex, ElementKind, Member, Tags};

/// Minimum stitched points for a usable outline.
pub const MIN_OUTLINE_POINTS: usize = 3;

/// Whether a relation should be assembled as a multipolygon.
pub fn is_multipolygon(tags: &Tags) -> bool {
    tags.get("type").is_some_and(|t| t == "multipolygon")
}

/// Whether a member contributes to the outer outline.
pub fn is_outer(member: &Member) -> bool {
    member.kind == ElementKind::Way && (member.role == "outer" || member.role.is_empty())
}

/// Stitch the outer outline of a relation. `None` when fewer than three
/// points resolve.
pub fn stitch_outline(
    relation_id: i64,
    members: &[Member],
    index: &ElementIndex<'_>,
) -> Option<Vec<GeoPoint>> {
    let outline: Vec<GeoPoint> = members
        .iter()
        .filter(|m| is_outer(m))
        .flat_map(|m| index.resolve_way(m.reference))
        .collect();

    if outline.len() < MIN_OUTLINE_POINTS {
        trace!(
            relation = relation_id,
            points = outline.len(),
            "dropping multipolygon with too few points"
        );
        return None;
    }
    Some(outline)
}
