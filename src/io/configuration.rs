//! Mosaic constants and runtime configuration defaults

// Default values for configurable parameters
/// Rows and columns in the square mosaic grid
pub const DEFAULT_GRID_SIZE: usize = 40;

/// Allowed deviation between tile and reference aspect ratios
pub const DEFAULT_ASPECT_TOLERANCE: f32 = 0.01;

/// Maximum placements of any single candidate across the mosaic
pub const DEFAULT_REPEAT_CAP: u32 = 5;

/// Minimum grid (Chebyshev) distance between two cells sharing a candidate
pub const DEFAULT_EXCLUSION_RADIUS: usize = 10;

/// Blend factor pulling the dominant channel toward the cell target
pub const DEFAULT_FILTER_STRENGTH: f64 = 0.5;

// Aspect cropping gives up below this size rather than producing slivers
/// Smallest tile dimension the crop scan will test
pub const MIN_TILE_DIMENSION: u32 = 20;

// Safety limit to prevent excessive memory allocation
/// Maximum allowed rows/columns in the grid
pub const MAX_GRID_SIZE: usize = 1_000;

// Candidate enumeration
/// File extensions accepted as reference or candidate images
pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

// Output settings
/// Suffix added to mosaic output filenames
pub const OUTPUT_SUFFIX: &str = "_mosaic";
/// Suffix added to signature preview filenames
pub const SIGNATURES_SUFFIX: &str = "_signatures";
/// Suffix added to assignment table filenames
pub const TABLE_SUFFIX: &str = "_assignments";

// Progress bar display settings
/// Threshold for adding a batch progress bar over the stage bar
pub const BATCH_PROGRESS_THRESHOLD: usize = 1;

// Logging
/// Environment variable consulted for the log filter
pub const LOG_ENV_VAR: &str = "RUST_LOG";
