//! Geographic projection: converts between lat/lon and scene-local meters.
//!
//! Equirectangular approximation centered on the scene origin:
//! `x = R·Δlon·cos(lat0)`, `y = R·Δlat`, angles in radians.
//! Accuracy degrades with distance from the origin; intended for
//! bounding boxes of a few kilometers.

use blastmap_core::constants::EARTH_RADIUS_M;
use blastmap_core::types::{GeoPoint, LocalPoint, Origin};

/// Projection anchored at a scene origin.
///
/// The origin maps to local (0, 0). x = East, y = North.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoProjection {
    origin: Origin,
    /// Cached cos(origin latitude) for longitude scaling.
    cos_ref_lat: f64,
}

impl GeoProjection {
    /// Create a projection centered at the given origin (degrees).
    pub fn new(origin: Origin) -> Self {
        Self {
            origin,
            cos_ref_lat: origin.lat.to_radians().cos(),
        }
    }

    /// Convert a geographic point to local meters.
    pub fn to_local(&self, point: &GeoPoint) -> LocalPoint {
        let x = EARTH_RADIUS_M * (point.lon - self.origin.lon).to_radians() * self.cos_ref_lat;
        let y = EARTH_RADIUS_M * (point.lat - self.origin.lat).to_radians();
        LocalPoint::new(x, y)
    }

    /// Convert local meters back to a geographic point.
    pub fn to_geo(&self, point: &LocalPoint) -> GeoPoint {
        let lon = self.origin.lon + (point.x / (EARTH_RADIUS_M * self.cos_ref_lat)).to_degrees();
        let lat = self.origin.lat + (point.y / EARTH_RADIUS_M).to_degrees();
        GeoPoint::new(lat, lon)
    }

    /// Scene origin.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Meters per degree of longitude at the origin latitude.
    pub fn lon_scale(&self) -> f64 {
        EARTH_RADIUS_M * 1.0_f64.to_radians() * self.cos_ref_lat
    }

    /// Meters per degree of latitude.
    pub fn lat_scale(&self) -> f64 {
        EARTH_RADIUS_M * 1.0_f64.to_radians()
    }
}

/// Project `point` into the local frame of `origin`.
pub fn project(point: &GeoPoint, origin: &Origin) -> LocalPoint {
    GeoProjection::new(*origin).to_local(point)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let origin = GeoPoint::new(48.8566, 2.3522);
        let p = project(&origin, &origin);
        assert_eq!(p.x, 0.0);
        assert_eq!(p.y, 0.0);
    }

    #[test]
    fn test_same_latitude_differs_only_in_x() {
        let proj = GeoProjection::new(GeoPoint::new(40.0, -3.7));
        let a = proj.to_local(&GeoPoint::new(40.01, -3.71));
        let b = proj.to_local(&GeoPoint::new(40.01, -3.65));
        assert_eq!(a.y, b.y, "same latitude must give identical y");
        assert!((a.x - b.x).abs() > 1.0);
    }

    #[test]
    fn test_projection_distances() {
        // At the equator, 1 degree ≈ 111,319.49 m with R = 6,378,137 m
        let proj = GeoProjection::new(GeoPoint::new(0.0, 0.0));
        let expected = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

        let north = proj.to_local(&GeoPoint::new(1.0, 0.0));
        assert!((north.y - expected).abs() < 1e-6, "1 degree lat: {}", north.y);
        assert!(north.x.abs() < 1e-9, "no east offset");

        let east = proj.to_local(&GeoPoint::new(0.0, 1.0));
        assert!((east.x - expected).abs() < 1e-6, "1 degree lon: {}", east.x);

        // At 60°N, longitude degrees shrink by cos(60°) = 0.5
        let proj60 = GeoProjection::new(GeoPoint::new(60.0, 0.0));
        let east60 = proj60.to_local(&GeoPoint::new(60.0, 1.0));
        assert!(
            (east60.x - expected * 0.5).abs() < 1e-6,
            "1 degree lon at 60N: {} vs {}",
            east60.x,
            expected * 0.5
        );
    }

    #[test]
    fn test_projection_roundtrip() {
        let proj = GeoProjection::new(GeoPoint::new(26.5, 56.2));
        let geo = GeoPoint::new(26.508, 56.193);
        let back = proj.to_geo(&proj.to_local(&geo));
        assert!((geo.lat - back.lat).abs() < 1e-10, "lat roundtrip");
        assert!((geo.lon - back.lon).abs() < 1e-10, "lon roundtrip");
    }

    #[test]
    fn test_scales_match_projection() {
        let proj = GeoProjection::new(GeoPoint::new(35.0, 139.0));
        let p = proj.to_local(&GeoPoint::new(36.0, 140.0));
        assert!((p.x - proj.lon_scale()).abs() < 1e-6);
        assert!((p.y - proj.lat_scale()).abs() < 1e-6);
    }
}
