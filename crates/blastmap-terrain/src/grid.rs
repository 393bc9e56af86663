//! TerrainGrid: regular lat/lon heightfield with local-meter height queries.

use blastmap_core::constants::{MIN_GRID_SIZE, VERTICAL_EXAGGERATION};
use blastmap_core::types::{BoundingBox, GeoPoint, LocalPoint, Origin};

use crate::error::TerrainError;
use crate::projection::GeoProjection;

/// Loaded heightfield.
///
/// Row 0 is the south edge and column 0 the west edge; both edges of the
/// bounding box are sampled. Local coordinates are relative to the grid
/// center, which is the grid's own origin.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    pub nx: usize,
    pub ny: usize,
    /// Latitude of each row, south to north (degrees).
    pub lat_rows: Vec<f64>,
    /// Longitude of each column, west to east (degrees).
    pub lon_cols: Vec<f64>,
    /// Raw elevations in meters, row-major (`ny × nx`).
    pub elevations: Vec<f64>,
    /// East-west extent in local meters.
    pub local_width: f64,
    /// North-south extent in local meters.
    pub local_height: f64,
    projection: GeoProjection,
}

/// Evenly spaced samples from `start` to `end`, both inclusive.
fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    let step = (end - start) / (count - 1) as f64;
    (0..count)
        .map(|i| {
            if i == count - 1 {
                end
            } else {
                start + step * i as f64
            }
        })
        .collect()
}

impl TerrainGrid {
    /// Row latitudes and column longitudes of a `grid_size × grid_size` grid.
    pub fn axes(
        bbox: &BoundingBox,
        grid_size: usize,
    ) -> Result<(Vec<f64>, Vec<f64>), TerrainError> {
        if !bbox.is_valid() {
            return Err(TerrainError::InvalidBounds);
        }
        if grid_size < MIN_GRID_SIZE {
            return Err(TerrainError::GridTooSmall { grid_size });
        }
        Ok((
            linspace(bbox.south, bbox.north, grid_size),
            linspace(bbox.west, bbox.east, grid_size),
        ))
    }

    /// Sample points in row-major order (south row first, west to east).
    pub fn sample_points(lat_rows: &[f64], lon_cols: &[f64]) -> Vec<GeoPoint> {
        lat_rows
            .iter()
            .flat_map(|&lat| lon_cols.iter().map(move |&lon| GeoPoint::new(lat, lon)))
            .collect()
    }

    /// Assemble a grid from axes and a row-major elevation list.
    ///
    /// Missing samples (`None`) are normalized to 0.
    pub fn from_samples(
        lat_rows: Vec<f64>,
        lon_cols: Vec<f64>,
        samples: Vec<Option<f64>>,
    ) -> Result<Self, TerrainError> {
        let ny = lat_rows.len();
        let nx = lon_cols.len();
        if nx < MIN_GRID_SIZE || ny < MIN_GRID_SIZE {
            return Err(TerrainError::GridTooSmall {
                grid_size: nx.min(ny),
            });
        }
        if samples.len() != nx * ny {
            return Err(TerrainError::BatchLength {
                batch: 0,
                expected: nx * ny,
                got: samples.len(),
            });
        }

        let elevations = samples.into_iter().map(|e| e.unwrap_or(0.0)).collect();

        let south = lat_rows[0];
        let north = lat_rows[ny - 1];
        let west = lon_cols[0];
        let east = lon_cols[nx - 1];
        let center = GeoPoint::new((south + north) / 2.0, (west + east) / 2.0);
        let projection = GeoProjection::new(center);

        let sw = projection.to_local(&GeoPoint::new(south, west));
        let ne = projection.to_local(&GeoPoint::new(north, east));

        Ok(Self {
            nx,
            ny,
            lat_rows,
            lon_cols,
            elevations,
            local_width: ne.x - sw.x,
            local_height: ne.y - sw.y,
            projection,
        })
    }

    /// Grid center, used as the origin of every local coordinate.
    pub fn origin(&self) -> Origin {
        self.projection.origin()
    }

    /// Projection centered on the grid.
    pub fn projection(&self) -> &GeoProjection {
        &self.projection
    }

    /// Raw elevation at integer grid coordinates, clamped to the grid.
    pub fn raw_elevation(&self, row: usize, col: usize) -> f64 {
        let r = row.min(self.ny - 1);
        let c = col.min(self.nx - 1);
        self.elevations[r * self.nx + c]
    }

    /// Exaggerated elevation at local (x, y) with bilinear interpolation.
    /// Positions outside the grid clamp to the nearest edge.
    pub fn query(&self, x: f64, y: f64) -> f64 {
        let ix = (x + self.local_width / 2.0) / self.local_width * (self.nx - 1) as f64;
        let jy = (y + self.local_height / 2.0) / self.local_height * (self.ny - 1) as f64;
        self.bilinear(jy, ix) * VERTICAL_EXAGGERATION
    }

    /// Bilinear interpolation at fractional row/col.
    fn bilinear(&self, row: f64, col: f64) -> f64 {
        let row = if row.is_finite() {
            row.clamp(0.0, (self.ny - 1) as f64)
        } else {
            0.0
        };
        let col = if col.is_finite() {
            col.clamp(0.0, (self.nx - 1) as f64)
        } else {
            0.0
        };

        let r0 = row.floor() as usize;
        let c0 = col.floor() as usize;
        let r1 = (r0 + 1).min(self.ny - 1);
        let c1 = (c0 + 1).min(self.nx - 1);

        let fr = row - r0 as f64;
        let fc = col - c0 as f64;

        let e00 = self.raw_elevation(r0, c0);
        let e01 = self.raw_elevation(r0, c1);
        let e10 = self.raw_elevation(r1, c0);
        let e11 = self.raw_elevation(r1, c1);

        let south = e00 * (1.0 - fc) + e01 * fc;
        let north = e10 * (1.0 - fc) + e11 * fc;
        south * (1.0 - fr) + north * fr
    }

    /// Local position of a grid node.
    pub fn node_position(&self, row: usize, col: usize) -> LocalPoint {
        self.projection
            .to_local(&GeoPoint::new(self.lat_rows[row], self.lon_cols[col]))
    }

    /// Renderer surface vertices `[x, y, z]`, row-major, z exaggerated the
    /// same way as [`TerrainGrid::query`].
    pub fn surface_vertices(&self) -> Vec<[f64; 3]> {
        let mut out = Vec::with_capacity(self.nx * self.ny);
        for row in 0..self.ny {
            for col in 0..self.nx {
                let p = self.node_position(row, col);
                out.push([
                    p.x,
                    p.y,
                    self.raw_elevation(row, col) * VERTICAL_EXAGGERATION,
                ]);
            }
        }
        out
    }

    /// Triangle indices over [`TerrainGrid::surface_vertices`], two per cell,
    /// counter-clockwise seen from above.
    pub fn surface_indices(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity((self.nx - 1) * (self.ny - 1) * 6);
        for row in 0..self.ny - 1 {
            for col in 0..self.nx - 1 {
                let i00 = (row * self.nx + col) as u32;
                let i01 = i00 + 1;
                let i10 = i00 + self.nx as u32;
                let i11 = i10 + 1;
                out.extend_from_slice(&[i00, i01, i11, i00, i11, i10]);
            }
        }
        out
    }

    /// Lowest and highest raw elevation.
    pub fn elevation_range(&self) -> (f64, f64) {
        self.elevations
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &e| {
                (lo.min(e), hi.max(e))
            })
    }
}
