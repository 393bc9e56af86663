//! Batched elevation retrieval.
//!
//! The elevation lookup service is an external collaborator. It is modeled
//! by the [`ElevationSource`] trait; concrete HTTP clients live in the host
//! application. Requests are split into fixed-size batches that may run
//! concurrently, and results are reassembled in submission order.

use futures_util::future::BoxFuture;
use futures_util::stream::{self, StreamExt};
use tracing::{debug, info};

use blastmap_core::constants::{DEFAULT_GRID_SIZE, ELEVATION_BATCH_SIZE, ELEVATION_MAX_IN_FLIGHT};
use blastmap_core::enums::Interpolation;
use blastmap_core::types::{BoundingBox, GeoPoint};

use crate::error::TerrainError;
use crate::grid::TerrainGrid;

/// Error returned by an elevation source.
pub type SourceError = Box<dyn std::error::Error + Send + Sync>;

/// One elevation (or `None` when the service has no data) per input point.
pub type ElevationBatch = Result<Vec<Option<f64>>, SourceError>;

/// External elevation lookup.
///
/// Implementations must return exactly one value per input point, in the
/// same order. Methods return boxed futures for dyn-compatibility.
pub trait ElevationSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Look up elevations for a batch of points.
    fn lookup(&self, points: Vec<GeoPoint>, interpolation: Interpolation)
        -> BoxFuture<'_, ElevationBatch>;
}

/// Terrain build configuration.
#[derive(Debug, Clone, Copy)]
pub struct TerrainConfig {
    /// Samples per side of the grid.
    pub grid_size: usize,
    /// Points per elevation request.
    pub batch_size: usize,
    /// Requests allowed in flight at once.
    pub max_in_flight: usize,
    pub interpolation: Interpolation,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            grid_size: DEFAULT_GRID_SIZE,
            batch_size: ELEVATION_BATCH_SIZE,
            max_in_flight: ELEVATION_MAX_IN_FLIGHT,
            interpolation: Interpolation::default(),
        }
    }
}

/// Fetch elevations for `points` in batches, preserving input order.
///
/// Any failed or short batch fails the whole fetch.
pub async fn fetch_elevations<S>(
    source: &S,
    points: &[GeoPoint],
    config: &TerrainConfig,
) -> Result<Vec<Option<f64>>, TerrainError>
where
    S: ElevationSource + ?Sized,
{
    let batch_size = config.batch_size.max(1);
    let interpolation = config.interpolation;
    let batches: Vec<Vec<GeoPoint>> = points.chunks(batch_size).map(|c| c.to_vec()).collect();

    debug!(
        source = source.name(),
        points = points.len(),
        batches = batches.len(),
        "fetching elevations"
    );

    let results: Vec<Result<Vec<Option<f64>>, TerrainError>> =
        stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| async move {
                let expected = batch.len();
                let values = source
                    .lookup(batch, interpolation)
                    .await
                    .map_err(|err| TerrainError::Fetch {
                        batch: index,
                        source: err,
                    })?;
                if values.len() != expected {
                    return Err(TerrainError::BatchLength {
                        batch: index,
                        expected,
                        got: values.len(),
                    });
                }
                Ok(values)
            })
            // `buffered` yields in submission order regardless of arrival order.
            .buffered(config.max_in_flight.max(1))
            .collect()
            .await;

    let mut out = Vec::with_capacity(points.len());
    for batch in results {
        out.extend(batch?);
    }
    Ok(out)
}

/// Build a complete terrain grid for `bbox`.
///
/// Suspends until every batch has been retrieved or one of them fails.
pub async fn build_grid<S>(
    source: &S,
    bbox: &BoundingBox,
    config: &TerrainConfig,
) -> Result<TerrainGrid, TerrainError>
where
    S: ElevationSource + ?Sized,
{
    let (lat_rows, lon_cols) = TerrainGrid::axes(bbox, config.grid_size)?;
    let points = TerrainGrid::sample_points(&lat_rows, &lon_cols);
    let samples = fetch_elevations(source, &points, config).await?;
    let grid = TerrainGrid::from_samples(lat_rows, lon_cols, samples)?;

    let (lo, hi) = grid.elevation_range();
    info!(
        nx = grid.nx,
        ny = grid.ny,
        width_m = grid.local_width,
        height_m = grid.local_height,
        "terrain grid built, elevation {lo:.1}..{hi:.1} m"
    );
    Ok(grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::task::Poll;

    use futures_util::future::poll_fn;

    /// Elevation = lat * 1000 + lon; records batch sizes.
    struct PlaneSource {
        calls: Mutex<Vec<usize>>,
    }

    impl PlaneSource {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl ElevationSource for PlaneSource {
        fn name(&self) -> &str {
            "plane"
        }

        fn lookup(
            &self,
            points: Vec<GeoPoint>,
            _interpolation: Interpolation,
        ) -> BoxFuture<'_, ElevationBatch> {
            self.calls.lock().unwrap().push(points.len());
            Box::pin(async move {
                let values: ElevationBatch = Ok(points
                    .iter()
                    .map(|p| Some(p.lat * 1000.0 + p.lon))
                    .collect());
                values
            })
        }
    }

    /// Plane elevations, but later batches finish first: batch `i` stays
    /// pending for `10 - 3i` polls. Records completion order.
    struct ReverseSource {
        started: AtomicUsize,
        finished: Mutex<Vec<usize>>,
    }

    impl ElevationSource for ReverseSource {
        fn name(&self) -> &str {
            "reverse"
        }

        fn lookup(&self, points: Vec<GeoPoint>, _: Interpolation) -> BoxFuture<'_, ElevationBatch> {
            let index = self.started.fetch_add(1, Ordering::SeqCst);
            let mut pending = 10usize.saturating_sub(3 * index);
            Box::pin(async move {
                poll_fn(|cx| {
                    if pending == 0 {
                        Poll::Ready(())
                    } else {
                        pending -= 1;
                        cx.waker().wake_by_ref();
                        Poll::Pending
                    }
                })
                .await;
                self.finished.lock().unwrap().push(index);
                let values: ElevationBatch = Ok(points
                    .iter()
                    .map(|p| Some(p.lat * 1000.0 + p.lon))
                    .collect());
                values
            })
        }
    }

    struct FailingSource;

    impl ElevationSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn lookup(&self, _: Vec<GeoPoint>, _: Interpolation) -> BoxFuture<'_, ElevationBatch> {
            Box::pin(async {
                let failed: ElevationBatch = Err("service unavailable".into());
                failed
            })
        }
    }

    struct ShortSource;

    impl ElevationSource for ShortSource {
        fn name(&self) -> &str {
            "short"
        }

        fn lookup(&self, points: Vec<GeoPoint>, _: Interpolation) -> BoxFuture<'_, ElevationBatch> {
            let n = points.len().saturating_sub(1);
            Box::pin(async move {
                let values: ElevationBatch = Ok(vec![Some(1.0); n]);
                values
            })
        }
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(10.0, 20.0, 10.02, 20.02)
    }

    #[test]
    fn test_batches_respect_batch_size() {
        let source = PlaneSource::new();
        let config = TerrainConfig {
            grid_size: 15,
            ..Default::default()
        };
        let grid = pollster::block_on(build_grid(&source, &bbox(), &config)).unwrap();
        assert_eq!(grid.elevations.len(), 225);

        let calls = source.calls.lock().unwrap();
        assert_eq!(*calls, vec![100, 100, 25]);
    }

    #[test]
    fn test_results_reassembled_in_order() {
        let source = PlaneSource::new();
        let config = TerrainConfig {
            grid_size: 7,
            batch_size: 5,
            max_in_flight: 3,
            ..Default::default()
        };
        let grid = pollster::block_on(build_grid(&source, &bbox(), &config)).unwrap();
        for row in 0..grid.ny {
            for col in 0..grid.nx {
                let expected = grid.lat_rows[row] * 1000.0 + grid.lon_cols[col];
                assert!((grid.raw_elevation(row, col) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_late_early_batches_keep_their_place() {
        let source = ReverseSource {
            started: AtomicUsize::new(0),
            finished: Mutex::new(Vec::new()),
        };
        let config = TerrainConfig {
            grid_size: 4,
            batch_size: 4,
            max_in_flight: 4,
            ..Default::default()
        };
        let grid = pollster::block_on(build_grid(&source, &bbox(), &config)).unwrap();

        assert_eq!(*source.finished.lock().unwrap(), vec![3, 2, 1, 0]);
        for row in 0..grid.ny {
            for col in 0..grid.nx {
                let expected = grid.lat_rows[row] * 1000.0 + grid.lon_cols[col];
                assert!((grid.raw_elevation(row, col) - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_failed_batch_fails_build() {
        let err = pollster::block_on(build_grid(&FailingSource, &bbox(), &TerrainConfig::default()))
            .unwrap_err();
        assert!(matches!(err, TerrainError::Fetch { batch: 0, .. }));
        assert!(err.is_retryable());
        assert!(err.to_string().contains("service unavailable"));
    }

    #[test]
    fn test_short_batch_fails_build() {
        let err = pollster::block_on(build_grid(&ShortSource, &bbox(), &TerrainConfig::default()))
            .unwrap_err();
        assert!(matches!(err, TerrainError::BatchLength { .. }));
    }

    #[test]
    fn test_invalid_grid_size_is_not_fetched() {
        let source = PlaneSource::new();
        let config = TerrainConfig {
            grid_size: 1,
            ..Default::default()
        };
        let err = pollster::block_on(build_grid(&source, &bbox(), &config)).unwrap_err();
        assert!(!err.is_retryable());
        assert!(source.calls.lock().unwrap().is_empty());
    }
}
