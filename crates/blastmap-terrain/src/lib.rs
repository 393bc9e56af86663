//! Terrain system for BLASTMAP.
//!
//! Equirectangular projection, heightfield grid construction,
//! batched elevation retrieval, and bilinear height queries.

pub use blastmap_core as core;

pub mod elevation;
pub mod error;
pub mod field;
pub mod grid;
pub mod projection;

// Re-export key types for convenience.
pub use elevation::{ElevationSource, TerrainConfig};
pub use error::TerrainError;
pub use field::{BuildTicket, HeightField, TerrainField};
pub use grid::TerrainGrid;
pub use projection::GeoProjection;
