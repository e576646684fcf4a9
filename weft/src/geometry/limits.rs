// Centralized ingestion limits for data arriving over the wire

// Patches
pub const MAX_PATCH_OPS: usize = 100_000;
pub const MAX_POINTER_DEPTH: usize = 64;

// Canvas size caps
pub const MAX_INDEXED_OBJECTS: usize = 200_000;

// Spatial hash cell size bounds (canvas units)
pub const MIN_CELL_SIZE: f64 = 1.0;
pub const MAX_CELL_SIZE: f64 = 100_000.0;

// Numeric bounds
pub const COORD_MIN: f64 = -10_000_000.0;
pub const COORD_MAX: f64 = 10_000_000.0;
pub const SIZE_MAX: f64 = 1_000_000.0;

#[inline]
pub fn in_coord_bounds(x: f64) -> bool { x.is_finite() && x >= COORD_MIN && x <= COORD_MAX }

#[inline]
pub fn in_size_bounds(w: f64) -> bool { w.is_finite() && w >= 0.0 && w <= SIZE_MAX }
