//! Impact geometry: does a blast reach a building footprint, and how hard.
//!
//! The footprint is reduced to its convex hull. A hit is decided by the
//! distance to the nearest hull edge; damage falls off with the distance to
//! the nearest hull vertex, `power / (1 + d²)`. Degenerate footprints fall
//! back to the distance from their bounding-box center.

use blastmap_core::constants::FOOTPRINT_DEDUP_TOLERANCE;
use blastmap_core::types::{LocalPoint, Weapon};

/// Outcome of testing one footprint against one impact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactTest {
    pub impacted: bool,
    pub damage: f64,
}

impl ImpactTest {
    pub const MISS: ImpactTest = ImpactTest {
        impacted: false,
        damage: 0.0,
    };

    fn hit(power: f64, distance: f64) -> Self {
        Self {
            impacted: true,
            damage: power / (1.0 + distance * distance),
        }
    }
}

/// Drop vertices within the dedup tolerance of an already kept vertex.
pub fn dedup_vertices(ring: &[LocalPoint]) -> Vec<LocalPoint> {
    let mut unique: Vec<LocalPoint> = Vec::with_capacity(ring.len());
    for p in ring {
        if !p.x.is_finite() || !p.y.is_finite() {
            continue;
        }
        if unique
            .iter()
            .all(|u| u.distance_to(p) > FOOTPRINT_DEDUP_TOLERANCE)
        {
            unique.push(*p);
        }
    }
    unique
}

fn cross(o: &LocalPoint, a: &LocalPoint, b: &LocalPoint) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// Counter-clockwise convex hull (Andrew's monotone chain).
///
/// Only strict left turns are kept, so collinear input yields fewer than
/// three vertices.
pub fn convex_hull(points: &[LocalPoint]) -> Vec<LocalPoint> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    if sorted.len() < 3 {
        return sorted;
    }

    let mut lower: Vec<LocalPoint> = Vec::with_capacity(sorted.len());
    for p in &sorted {
        while lower.len() >= 2 {
            let n = lower.len();
            if cross(&lower[n - 2], &lower[n - 1], p) > 0.0 {
                break;
            }
            lower.pop();
        }
        lower.push(*p);
    }

    let mut upper: Vec<LocalPoint> = Vec::with_capacity(sorted.len());
    for p in sorted.iter().rev() {
        while upper.len() >= 2 {
            let n = upper.len();
            if cross(&upper[n - 2], &upper[n - 1], p) > 0.0 {
                break;
            }
            upper.pop();
        }
        upper.push(*p);
    }

    // Endpoints are shared between the chains.
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Even-odd point-in-polygon test. The polygon is implicitly closed.
pub fn point_in_polygon(p: &LocalPoint, polygon: &[LocalPoint]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (&polygon[i], &polygon[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Distance from `p` to segment `ab`.
pub fn segment_distance(p: &LocalPoint, a: &LocalPoint, b: &LocalPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return p.distance_to(a);
    }
    let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len_sq).clamp(0.0, 1.0);
    p.distance_to(&LocalPoint::new(a.x + t * dx, a.y + t * dy))
}

/// Distance from `p` to the nearest edge of a closed polygon.
pub fn min_edge_distance(p: &LocalPoint, polygon: &[LocalPoint]) -> f64 {
    let n = polygon.len();
    (0..n)
        .map(|i| segment_distance(p, &polygon[i], &polygon[(i + 1) % n]))
        .fold(f64::INFINITY, f64::min)
}

/// Distance from `p` to the nearest of `points`.
pub fn min_vertex_distance(p: &LocalPoint, points: &[LocalPoint]) -> f64 {
    points
        .iter()
        .map(|v| p.distance_to(v))
        .fold(f64::INFINITY, f64::min)
}

/// Center of the axis-aligned bounding box of `points`.
fn bbox_center(points: &[LocalPoint]) -> Option<LocalPoint> {
    let first = points.first()?;
    let (mut min, mut max) = (*first, *first);
    for p in points {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Some(LocalPoint::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0))
}

/// Test a building footprint against an impact at `impact`.
pub fn test_footprint(
    footprint: &[LocalPoint],
    impact: &LocalPoint,
    weapon: &Weapon,
) -> ImpactTest {
    let unique = dedup_vertices(footprint);

    let hull = if unique.len() >= 3 {
        convex_hull(&unique)
    } else {
        Vec::new()
    };

    if hull.len() < 3 {
        // Too few vertices, or all collinear.
        let Some(center) = bbox_center(&unique) else {
            return ImpactTest::MISS;
        };
        let d = impact.distance_to(&center);
        return if d <= weapon.radius {
            ImpactTest::hit(weapon.power, d)
        } else {
            ImpactTest::MISS
        };
    }

    let impacted =
        point_in_polygon(impact, &hull) || min_edge_distance(impact, &hull) <= weapon.radius;
    if !impacted {
        return ImpactTest::MISS;
    }
    ImpactTest::hit(weapon.power, min_vertex_distance(impact, &hull))
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastmap_core::enums::WeaponType;

    fn pts(coords: &[(f64, f64)]) -> Vec<LocalPoint> {
        coords.iter().map(|&(x, y)| LocalPoint::new(x, y)).collect()
    }

    fn square() -> Vec<LocalPoint> {
        pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)])
    }

    fn weapon(power: f64, radius: f64) -> Weapon {
        Weapon::new(WeaponType::Missile, power, radius)
    }

    #[test]
    fn test_square_outside_within_radius() {
        let result = test_footprint(&square(), &LocalPoint::new(12.0, 5.0), &weapon(300.0, 5.0));
        assert!(result.impacted);
        assert!((result.damage - 300.0 / 30.0).abs() < 1e-9, "damage {}", result.damage);
    }

    #[test]
    fn test_square_out_of_range() {
        let result = test_footprint(&square(), &LocalPoint::new(30.0, 5.0), &weapon(300.0, 5.0));
        assert_eq!(result, ImpactTest::MISS);
    }

    #[test]
    fn test_inside_hull_with_zero_radius() {
        let result = test_footprint(&square(), &LocalPoint::new(5.0, 5.0), &weapon(50.0, 0.0));
        assert!(result.impacted);
        // Nearest vertex is sqrt(50) away.
        assert!((result.damage - 50.0 / 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_hull_drops_collinear_and_interior_points() {
        let ring = pts(&[
            (0.0, 0.0),
            (5.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (4.0, 4.0),
            (0.0, 10.0),
        ]);
        let hull = convex_hull(&ring);
        assert_eq!(hull.len(), 4);
        assert!(!hull.contains(&LocalPoint::new(5.0, 0.0)));
        assert!(!hull.contains(&LocalPoint::new(4.0, 4.0)));
    }

    #[test]
    fn test_dedup_tolerance() {
        let ring = pts(&[(0.0, 0.0), (0.0005, 0.0), (1.0, 0.0), (1.0, 0.002)]);
        assert_eq!(dedup_vertices(&ring).len(), 3);
    }

    #[test]
    fn test_collinear_footprint_uses_bbox_center() {
        let line = pts(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0)]);
        let near = test_footprint(&line, &LocalPoint::new(5.0, 3.0), &weapon(100.0, 4.0));
        assert!(near.impacted);
        assert!((near.damage - 10.0).abs() < 1e-9);

        // Close to an end vertex but far from the center.
        let far = test_footprint(&line, &LocalPoint::new(11.0, 0.0), &weapon(100.0, 4.0));
        assert!(!far.impacted);
    }

    #[test]
    fn test_degenerate_footprints() {
        let point = pts(&[(2.0, 2.0), (2.0, 2.0)]);
        let result = test_footprint(&point, &LocalPoint::new(2.0, 2.0), &weapon(7.0, 1.0));
        assert!(result.impacted);
        assert_eq!(result.damage, 7.0);

        assert_eq!(
            test_footprint(&[], &LocalPoint::new(0.0, 0.0), &weapon(7.0, 100.0)),
            ImpactTest::MISS
        );
    }

    #[test]
    fn test_point_in_polygon_even_odd() {
        let sq = square();
        assert!(point_in_polygon(&LocalPoint::new(1.0, 1.0), &sq));
        assert!(!point_in_polygon(&LocalPoint::new(-1.0, 1.0), &sq));
        assert!(!point_in_polygon(&LocalPoint::new(11.0, 5.0), &sq));
    }

    #[test]
    fn test_segment_distance() {
        let a = LocalPoint::new(0.0, 0.0);
        let b = LocalPoint::new(10.0, 0.0);
        assert_eq!(segment_distance(&LocalPoint::new(5.0, 3.0), &a, &b), 3.0);
        assert_eq!(segment_distance(&LocalPoint::new(13.0, 4.0), &a, &b), 5.0);
        assert_eq!(segment_distance(&LocalPoint::new(1.0, 1.0), &a, &a), 2.0_f64.sqrt());
    }
}
