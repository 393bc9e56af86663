//! Error type for terrain builds.

use std::fmt;

/// Failure of a terrain build or of its application to a field.
///
/// A failed build never touches the live grid; callers may retry.
#[derive(Debug)]
pub enum TerrainError {
    /// Bounding box has no area.
    InvalidBounds,
    /// Grid needs at least 2 samples per side.
    GridTooSmall { grid_size: usize },
    /// An elevation batch could not be fetched.
    Fetch {
        batch: usize,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// An elevation batch answered with the wrong number of samples.
    BatchLength {
        batch: usize,
        expected: usize,
        got: usize,
    },
    /// Another build already holds the field's ticket.
    BuildInProgress,
    /// The ticket does not belong to the field's outstanding build.
    StaleTicket,
    /// The grid was built around a different origin than the scene.
    OriginMismatch,
}

impl TerrainError {
    pub fn fetch(batch: usize, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        TerrainError::Fetch {
            batch,
            source: Box::new(source),
        }
    }

    /// Whether issuing the same build again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TerrainError::Fetch { .. } | TerrainError::BatchLength { .. }
        )
    }
}

impl fmt::Display for TerrainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerrainError::InvalidBounds => write!(f, "bounding box has no area"),
            TerrainError::GridTooSmall { grid_size } => {
                write!(f, "grid size {grid_size} is below the minimum of 2")
            }
            TerrainError::Fetch { batch, source } => {
                write!(f, "elevation batch {batch} failed: {source}")
            }
            TerrainError::BatchLength {
                batch,
                expected,
                got,
            } => write!(
                f,
                "elevation batch {batch} returned {got} samples, expected {expected}"
            ),
            TerrainError::BuildInProgress => write!(f, "a terrain build is already in flight"),
            TerrainError::StaleTicket => write!(f, "terrain build ticket is stale"),
            TerrainError::OriginMismatch => {
                write!(f, "terrain grid origin differs from the scene origin")
            }
        }
    }
}

impl std::error::Error for TerrainError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TerrainError::Fetch { source, .. } => Some(source.as_ref() as _),
            _ => None,
        }
    }
}
