//! Enumeration types used throughout the pipeline.

use serde::{Deserialize, Serialize};

/// Category assigned to a classified feature.
///
/// Ways and relations land in one of the area/line categories; nodes land in
/// one of the point categories. Ordering is only used for stable map keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureCategory {
    Building,
    Hospital,
    School,
    Highway,
    Railway,
    Hill,
    Water,
    Parking,
    Industrial,
    Aeroway,
    Bridge,
    Power,
    Park,
    // --- Point categories ---
    Peak,
    HospitalPoint,
    SchoolPoint,
    BusStop,
    PowerPoint,
    Aerodrome,
    ParkingPoint,
}

impl FeatureCategory {
    /// Stable plural name used as a map key in exported output.
    pub fn name(self) -> &'static str {
        match self {
            FeatureCategory::Building => "buildings",
            FeatureCategory::Hospital => "hospitals",
            FeatureCategory::School => "schools",
            FeatureCategory::Highway => "highways",
            FeatureCategory::Railway => "railways",
            FeatureCategory::Hill => "hills",
            FeatureCategory::Water => "water",
            FeatureCategory::Parking => "parking",
            FeatureCategory::Industrial => "industrial",
            FeatureCategory::Aeroway => "aeroways",
            FeatureCategory::Bridge => "bridges",
            FeatureCategory::Power => "power",
            FeatureCategory::Park => "parks",
            FeatureCategory::Peak => "peaks",
            FeatureCategory::HospitalPoint => "hospital_points",
            FeatureCategory::SchoolPoint => "school_points",
            FeatureCategory::BusStop => "bus_stops",
            FeatureCategory::PowerPoint => "power_points",
            FeatureCategory::Aerodrome => "aerodromes",
            FeatureCategory::ParkingPoint => "parking_points",
        }
    }

    /// Whether this category is produced from nodes.
    pub fn is_point(self) -> bool {
        matches!(
            self,
            FeatureCategory::Peak
                | FeatureCategory::HospitalPoint
                | FeatureCategory::SchoolPoint
                | FeatureCategory::BusStop
                | FeatureCategory::PowerPoint
                | FeatureCategory::Aerodrome
                | FeatureCategory::ParkingPoint
        )
    }

    /// Preferred geometry for ways of this category.
    pub fn way_geometry(self) -> GeometryKind {
        match self {
            FeatureCategory::Highway
            | FeatureCategory::Railway
            | FeatureCategory::Bridge => GeometryKind::Polyline,
            // Waterways, runways and power lines are open; lakes, aprons and
            // substations are closed.
            FeatureCategory::Water | FeatureCategory::Aeroway | FeatureCategory::Power => {
                GeometryKind::ClosedIfRing
            }
            _ if self.is_point() => GeometryKind::Point,
            _ => GeometryKind::Ring,
        }
    }
}

/// Geometry shape produced for a feature category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryKind {
    Point,
    Polyline,
    Ring,
    /// Ring when the source way is closed, polyline otherwise.
    ClosedIfRing,
}

/// Weapon family. Each has a default power and radius.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponType {
    /// Light shell, tight radius.
    Artillery,
    /// Cruise/ballistic missile (default).
    #[default]
    Missile,
    /// Gravity bomb, wide radius.
    AirBomb,
    /// Very large yield.
    Tactical,
}

impl WeaponType {
    pub fn default_power(self) -> f64 {
        match self {
            WeaponType::Artillery => 40.0,
            WeaponType::Missile => 120.0,
            WeaponType::AirBomb => 250.0,
            WeaponType::Tactical => 2_000.0,
        }
    }

    /// Default effect radius in meters.
    pub fn default_radius(self) -> f64 {
        match self {
            WeaponType::Artillery => 15.0,
            WeaponType::Missile => 40.0,
            WeaponType::AirBomb => 80.0,
            WeaponType::Tactical => 600.0,
        }
    }
}

/// Interpolation mode requested from the elevation lookup service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Cubic,
}

impl Interpolation {
    pub fn as_str(self) -> &'static str {
        match self {
            Interpolation::Nearest => "nearest",
            Interpolation::Bilinear => "bilinear",
            Interpolation::Cubic => "cubic",
        }
    }
}

/// Status of the live terrain heightfield.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainStatus {
    /// No grid yet; queries return 0.
    #[default]
    Flat,
    /// A build is in flight; queries answer from the previous state.
    Building,
    /// A grid is live.
    Ready,
}
