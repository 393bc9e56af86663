//! TerrainField: the live heightfield of a scene.
//!
//! Holds at most one grid and at most one outstanding build. A build is
//! started with [`TerrainField::begin_build`], which hands out a
//! [`BuildTicket`]. The ticket is consumed by [`TerrainField::complete`] or
//! [`TerrainField::abandon`], so a completion can be applied only once.
//! A failed, abandoned or stale build never touches the live grid.

use tracing::{debug, info, warn};

use blastmap_core::enums::TerrainStatus;
use blastmap_core::types::BoundingBox;

use crate::elevation::{self, ElevationSource, TerrainConfig};
use crate::error::TerrainError;
use crate::grid::TerrainGrid;

/// Anything that answers exaggerated terrain height at local (x, y).
pub trait HeightField {
    fn height_at(&self, x: f64, y: f64) -> f64;
}

impl HeightField for TerrainGrid {
    fn height_at(&self, x: f64, y: f64) -> f64 {
        self.query(x, y)
    }
}

/// Permission to complete one terrain build. Not clonable.
#[derive(Debug)]
pub struct BuildTicket {
    generation: u64,
    bbox: BoundingBox,
}

impl BuildTicket {
    /// Region this build covers.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Live heightfield with a flat fallback.
#[derive(Debug, Default)]
pub struct TerrainField {
    grid: Option<TerrainGrid>,
    next_generation: u64,
    outstanding: Option<u64>,
}

impl TerrainField {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a grid without touching any field. Apply it with
    /// [`TerrainField::complete`].
    pub async fn build<S>(
        source: &S,
        bbox: &BoundingBox,
        config: &TerrainConfig,
    ) -> Result<TerrainGrid, TerrainError>
    where
        S: ElevationSource + ?Sized,
    {
        elevation::build_grid(source, bbox, config).await
    }

    pub fn status(&self) -> TerrainStatus {
        if self.outstanding.is_some() {
            TerrainStatus::Building
        } else if self.grid.is_some() {
            TerrainStatus::Ready
        } else {
            TerrainStatus::Flat
        }
    }

    /// Live grid, if one has been applied.
    pub fn grid(&self) -> Option<&TerrainGrid> {
        self.grid.as_ref()
    }

    /// Exaggerated height at local (x, y); 0 when no grid is live.
    pub fn query(&self, x: f64, y: f64) -> f64 {
        self.grid.as_ref().map_or(0.0, |g| g.query(x, y))
    }

    /// Reserve the single outstanding build slot.
    pub fn begin_build(&mut self, bbox: BoundingBox) -> Result<BuildTicket, TerrainError> {
        if self.outstanding.is_some() {
            return Err(TerrainError::BuildInProgress);
        }
        if !bbox.is_valid() {
            return Err(TerrainError::InvalidBounds);
        }
        self.next_generation += 1;
        let generation = self.next_generation;
        self.outstanding = Some(generation);
        debug!(generation, "terrain build started");
        Ok(BuildTicket { generation, bbox })
    }

    /// Give up on an outstanding build. Its result can no longer be applied.
    pub fn abandon(&mut self, ticket: BuildTicket) {
        if self.outstanding == Some(ticket.generation) {
            self.outstanding = None;
            debug!(generation = ticket.generation, "terrain build abandoned");
        }
    }

    /// Finish a build. On success the grid replaces the live one in a single
    /// swap; on failure the live state is kept and the error returned.
    pub fn complete(
        &mut self,
        ticket: BuildTicket,
        result: Result<TerrainGrid, TerrainError>,
    ) -> Result<&TerrainGrid, TerrainError> {
        if self.outstanding != Some(ticket.generation) {
            warn!(
                generation = ticket.generation,
                "discarding terrain build with stale ticket"
            );
            return Err(TerrainError::StaleTicket);
        }
        self.outstanding = None;

        match result {
            Ok(grid) => {
                info!(
                    generation = ticket.generation,
                    nx = grid.nx,
                    ny = grid.ny,
                    "terrain grid applied"
                );
                Ok(self.grid.insert(grid))
            }
            Err(err) => {
                warn!(generation = ticket.generation, "terrain build failed: {err}");
                Err(err)
            }
        }
    }

    /// Drop the live grid and any outstanding build.
    pub fn clear(&mut self) {
        self.grid = None;
        self.outstanding = None;
    }
}

impl HeightField for TerrainField {
    fn height_at(&self, x: f64, y: f64) -> f64 {
        self.query(x, y)
    }
}
