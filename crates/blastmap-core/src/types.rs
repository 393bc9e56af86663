//! Fundamental geographic, geometric and simulation types.

use serde::{Deserialize, Serialize};

use crate::enums::WeaponType;

/// Geographic coordinate in degrees. No datum correction is applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Origin of a local frame. Every entity in a scene shares one origin.
pub type Origin = GeoPoint;

/// Planar position in meters relative to an [`Origin`].
/// x = East, y = North.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

/// South/west/north/east lat-lon rectangle defining a query region.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Immutable weapon description, reusable across many impacts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weapon {
    pub weapon_type: WeaponType,
    /// Damage scale (arbitrary unit).
    pub power: f64,
    /// Effect radius in meters.
    pub radius: f64,
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SimTime {
    /// Number of ticks processed.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub elapsed_secs: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

impl LocalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point in meters.
    pub fn distance_to(&self, other: &LocalPoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl BoundingBox {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Geometric center in lat/lon space.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// True when north > south and east > west.
    pub fn is_valid(&self) -> bool {
        self.north > self.south && self.east > self.west
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lon >= self.west
            && point.lon <= self.east
    }
}

impl Weapon {
    pub fn new(weapon_type: WeaponType, power: f64, radius: f64) -> Self {
        Self {
            weapon_type,
            power,
            radius,
        }
    }

    /// Weapon with the default power and radius of its type.
    pub fn preset(weapon_type: WeaponType) -> Self {
        Self::new(
            weapon_type,
            weapon_type.default_power(),
            weapon_type.default_radius(),
        )
    }
}

impl SimTime {
    /// Advance by one tick of `dt` seconds.
    pub fn advance(&mut self, dt: f64) {
        self.tick += 1;
        self.elapsed_secs += dt;
    }
}
