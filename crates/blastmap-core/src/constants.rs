//! Pipeline constants and tuning parameters.

/// Nominal tick rate of the host loop (Hz). One tick per animation frame.
pub const TICK_RATE: u32 = 60;

/// Seconds per tick at the nominal rate.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

// --- Projection ---

/// Earth radius used by the equirectangular projection (meters).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

// --- Terrain ---

/// Vertical exaggeration applied to every terrain height, both for queries
/// and for renderer surface vertices.
pub const VERTICAL_EXAGGERATION: f64 = 0.5;

/// Grid points per elevation request.
pub const ELEVATION_BATCH_SIZE: usize = 100;

/// Elevation batches allowed in flight at once.
pub const ELEVATION_MAX_IN_FLIGHT: usize = 4;

/// Default samples per side of the terrain grid.
pub const DEFAULT_GRID_SIZE: usize = 32;

/// Smallest allowed samples per side.
pub const MIN_GRID_SIZE: usize = 2;

// --- Buildings ---

/// Height assigned when no usable height or levels tag exists (meters).
pub const DEFAULT_BUILDING_HEIGHT: f64 = 10.0;

/// Height of one building level (meters).
pub const METERS_PER_LEVEL: f64 = 3.0;

// --- Impact geometry ---

/// Footprint vertices closer than this are considered duplicates (meters).
pub const FOOTPRINT_DEDUP_TOLERANCE: f64 = 1e-3;

// --- Blast effect ---

/// Glow scale at the start of an effect.
pub const GLOW_START_SCALE: f64 = 0.02;

/// Peak glow opacity.
pub const GLOW_OPACITY: f64 = 0.95;

/// Peak point-light intensity.
pub const LIGHT_INTENSITY: f64 = 3.5;

/// Downward acceleration of glow particles (m/s²).
pub const PARTICLE_FALL_ACCEL: f64 = 0.8;

/// Rise speed of the smoke column (m/s).
pub const SMOKE_RISE_SPEED: f64 = 0.5;

/// Smoke reaches `max_scale * SMOKE_SCALE_FACTOR` at full progress.
pub const SMOKE_SCALE_FACTOR: f64 = 2.2;

/// Smoke scale at the start of an effect, relative to `max_scale`.
pub const SMOKE_START_SCALE_FACTOR: f64 = 0.4;

/// Peak smoke opacity.
pub const SMOKE_OPACITY: f64 = 0.85;

/// Gravity applied to debris, scaled by [`DEBRIS_GRAVITY_FACTOR`].
pub const GRAVITY: f64 = 9.8;

/// Debris falls at half gravity.
pub const DEBRIS_GRAVITY_FACTOR: f64 = 0.5;

/// Horizontal velocity kept after a debris bounce.
pub const DEBRIS_BOUNCE_HORIZONTAL: f64 = 0.3;

/// Vertical velocity kept (inverted) after a debris bounce.
pub const DEBRIS_BOUNCE_VERTICAL: f64 = 0.1;

/// Opacity lost per second by grounded debris.
pub const DEBRIS_FADE_RATE: f64 = 0.6;

/// Debris survives this long past the effect life (seconds).
pub const DEBRIS_LINGER_SECS: f64 = 1.5;

/// Peak opacity of the translucent blast sphere.
pub const BLAST_SPHERE_OPACITY: f64 = 0.12;

/// Per-tick blast sphere growth coefficient.
pub const BLAST_SPHERE_GROWTH: f64 = 0.02;

/// Minimum tail after `life` before an effect can be removed (seconds).
pub const EFFECT_MIN_TAIL_SECS: f64 = 0.5;

/// Glow particles spawned per effect.
pub const PARTICLE_COUNT: usize = 24;

/// Debris shards spawned per effect.
pub const DEBRIS_COUNT: usize = 16;

/// Shortest flash life of any blast (seconds).
pub const EFFECT_BASE_LIFE: f64 = 1.0;

/// Additional flash life per meter of weapon radius (seconds).
pub const EFFECT_LIFE_PER_METER: f64 = 0.01;

/// Longest flash life of any blast (seconds).
pub const EFFECT_MAX_LIFE: f64 = 4.0;

/// Smoke column life as a multiple of flash life.
pub const SMOKE_LIFE_FACTOR: f64 = 2.5;

// --- Scene ---

/// Two origins closer than this (degrees) are the same origin.
pub const ORIGIN_TOLERANCE_DEG: f64 = 1e-9;
