//! Error type for engine operations.

use std::fmt;

use blastmap_terrain::TerrainError;

#[derive(Debug)]
pub enum SimError {
    /// The operation needs a scene; call `set_scene` first.
    NoScene,
    Terrain(TerrainError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::NoScene => write!(f, "no scene has been set"),
            SimError::Terrain(err) => write!(f, "terrain: {err}"),
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::NoScene => None,
            SimError::Terrain(err) => Some(err),
        }
    }
}

impl From<TerrainError> for SimError {
    fn from(err: TerrainError) -> Self {
        SimError::Terrain(err)
    }
}
