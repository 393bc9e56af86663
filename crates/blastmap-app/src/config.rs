//! Command line configuration.

use std::env;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use blastmap_core::constants::{DEFAULT_GRID_SIZE, ELEVATION_BATCH_SIZE, ELEVATION_MAX_IN_FLIGHT};
use blastmap_core::enums::{Interpolation, WeaponType};
use blastmap_core::types::{BoundingBox, GeoPoint, Weapon};
use blastmap_sim::SimConfig;
use blastmap_terrain::TerrainConfig;

use crate::sources::{DEFAULT_ELEVATION_URL, DEFAULT_OVERPASS_URL};

#[derive(Parser, Debug)]
#[command(author, version, about = "Simulate weapon impacts on real-world map regions")]
pub struct Cli {
    /// Overpass API endpoint (default: $OVERPASS_URL, then the public instance)
    #[arg(long, global = true)]
    pub overpass_url: Option<String>,

    /// OpenTopoData dataset endpoint (default: $ELEVATION_URL, then srtm90m)
    #[arg(long, global = true)]
    pub elevation_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn overpass_url(&self) -> String {
        self.overpass_url.clone().unwrap_or_else(|| {
            env::var("OVERPASS_URL").unwrap_or_else(|_| DEFAULT_OVERPASS_URL.to_string())
        })
    }

    pub fn elevation_url(&self) -> String {
        self.elevation_url.clone().unwrap_or_else(|| {
            env::var("ELEVATION_URL").unwrap_or_else(|_| DEFAULT_ELEVATION_URL.to_string())
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a saved Overpass JSON response
    Classify {
        /// Path to an `{"elements": [...]}` file
        #[arg(long)]
        input: PathBuf,
    },

    /// Fetch and classify the map features of a region
    Fetch {
        /// Bounding box: south,west,north,east
        #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
        bbox: BoundingBox,

        /// Overpass server-side timeout in seconds
        #[arg(long, default_value_t = 25)]
        timeout: u32,
    },

    /// Build a scene for a region and simulate one impact
    Simulate(SimulateArgs),
}

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Bounding box: south,west,north,east
    #[arg(long, value_parser = parse_bbox, allow_hyphen_values = true)]
    pub bbox: BoundingBox,

    /// Impact latitude (default: bbox center)
    #[arg(long, allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Impact longitude (default: bbox center)
    #[arg(long, allow_hyphen_values = true)]
    pub lon: Option<f64>,

    #[arg(long, value_enum, default_value_t = WeaponKind::Missile)]
    pub weapon: WeaponKind,

    /// Override the weapon's default power
    #[arg(long)]
    pub power: Option<f64>,

    /// Override the weapon's default radius in meters
    #[arg(long)]
    pub radius: Option<f64>,

    /// Terrain samples per side
    #[arg(long, default_value_t = DEFAULT_GRID_SIZE)]
    pub grid_size: usize,

    #[arg(long, value_enum, default_value_t = InterpolationKind::Bilinear)]
    pub interpolation: InterpolationKind,

    /// Skip the elevation fetch and simulate on flat ground
    #[arg(long)]
    pub flat: bool,

    /// Seconds to wait for the terrain build
    #[arg(long, default_value_t = 60)]
    pub terrain_timeout: u64,

    /// Seconds to let the blast play out after the impact
    #[arg(long, default_value_t = 1.0)]
    pub duration: f64,

    /// RNG seed for blast effects
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

impl SimulateArgs {
    pub fn weapon(&self) -> Weapon {
        let weapon_type = WeaponType::from(self.weapon);
        Weapon::new(
            weapon_type,
            self.power.unwrap_or(weapon_type.default_power()),
            self.radius.unwrap_or(weapon_type.default_radius()),
        )
    }

    pub fn target(&self) -> GeoPoint {
        let center = self.bbox.center();
        GeoPoint::new(
            self.lat.unwrap_or(center.lat),
            self.lon.unwrap_or(center.lon),
        )
    }

    pub fn terrain_config(&self) -> TerrainConfig {
        TerrainConfig {
            grid_size: self.grid_size,
            batch_size: ELEVATION_BATCH_SIZE,
            max_in_flight: ELEVATION_MAX_IN_FLIGHT,
            interpolation: self.interpolation.into(),
        }
    }

    pub fn sim_config(&self) -> SimConfig {
        SimConfig {
            seed: self.seed,
            ..SimConfig::default()
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeaponKind {
    Artillery,
    Missile,
    AirBomb,
    Tactical,
}

impl From<WeaponKind> for WeaponType {
    fn from(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Artillery => WeaponType::Artillery,
            WeaponKind::Missile => WeaponType::Missile,
            WeaponKind::AirBomb => WeaponType::AirBomb,
            WeaponKind::Tactical => WeaponType::Tactical,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationKind {
    Nearest,
    Bilinear,
    Cubic,
}

impl From<InterpolationKind> for Interpolation {
    fn from(kind: InterpolationKind) -> Self {
        match kind {
            InterpolationKind::Nearest => Interpolation::Nearest,
            InterpolationKind::Bilinear => Interpolation::Bilinear,
            InterpolationKind::Cubic => Interpolation::Cubic,
        }
    }
}

/// Parse `south,west,north,east` in decimal degrees.
pub fn parse_bbox(value: &str) -> Result<BoundingBox, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid bbox number: {e}"))?;
    let [south, west, north, east] = parts[..] else {
        return Err(format!(
            "expected south,west,north,east, got {} values",
            parts.len()
        ));
    };
    let bbox = BoundingBox::new(south, west, north, east);
    if !bbox.is_valid() {
        return Err("bbox must satisfy south < north and west < east".into());
    }
    Ok(bbox)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bbox() {
        let bbox = parse_bbox("52.50, 13.40,52.51,13.42").unwrap();
        assert_eq!(bbox.south, 52.50);
        assert_eq!(bbox.east, 13.42);

        let southern = parse_bbox("-33.87,151.20,-33.86,151.21").unwrap();
        assert!(southern.south < southern.north);
    }

    #[test]
    fn test_parse_bbox_rejects_bad_input() {
        assert!(parse_bbox("52.5,13.4,52.51").is_err());
        assert!(parse_bbox("52.5,13.4,abc,13.5").is_err());
        assert!(parse_bbox("52.51,13.4,52.50,13.5").is_err());
    }

    #[test]
    fn test_simulate_defaults() {
        let cli = Cli::try_parse_from(["blastmap", "simulate", "--bbox", "52.50,13.40,52.51,13.42"])
            .unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        let weapon = args.weapon();
        assert_eq!(weapon.weapon_type, WeaponType::Missile);
        assert_eq!(weapon.power, 120.0);
        assert_eq!(weapon.radius, 40.0);
        assert_eq!(args.grid_size, DEFAULT_GRID_SIZE);
        assert_eq!(args.sim_config().seed, 42);
        assert!(!args.flat);

        let target = args.target();
        let center = args.bbox.center();
        assert_eq!(target.lat, center.lat);
        assert_eq!(target.lon, center.lon);
    }

    #[test]
    fn test_simulate_overrides() {
        let cli = Cli::try_parse_from([
            "blastmap",
            "--overpass-url",
            "http://localhost:8080/api/interpreter",
            "simulate",
            "--bbox",
            "-33.87,151.20,-33.86,151.21",
            "--lat",
            "-33.865",
            "--weapon",
            "air-bomb",
            "--radius",
            "120",
            "--interpolation",
            "nearest",
        ])
        .unwrap();
        assert_eq!(cli.overpass_url(), "http://localhost:8080/api/interpreter");
        let Command::Simulate(args) = &cli.command else {
            panic!("expected simulate");
        };
        let weapon = args.weapon();
        assert_eq!(weapon.weapon_type, WeaponType::AirBomb);
        assert_eq!(weapon.power, 250.0);
        assert_eq!(weapon.radius, 120.0);
        assert_eq!(args.target().lat, -33.865);
        assert_eq!(args.terrain_config().interpolation, Interpolation::Nearest);
    }
}
