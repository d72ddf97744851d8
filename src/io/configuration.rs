//! Generator constants and runtime configuration defaults

use std::time::Duration;

// Grid defaults
/// Default grid size as `[width, height, depth]`
pub const DEFAULT_SIZE: [usize; 3] = [10, 1, 10];

/// Default distance between neighbouring cell centres
pub const DEFAULT_CELL_SIZE: [f64; 3] = [1.0, 1.0, 1.0];

// Safety limit to prevent excessive memory allocation
/// Maximum allowed cell count of a grid
pub const MAX_GRID_CELLS: usize = 4_000_000;

// Default values for configurable parameters
/// Seed requesting a fresh seed from ambient entropy
pub const RANDOM_SEED: u64 = 0;

/// Whether the propagator undoes choices after a contradiction
pub const DEFAULT_BACKTRACK: bool = true;

/// Attempts made when backtracking is off
pub const DEFAULT_RETRIES: usize = 5;

/// Minimum time between progress callbacks
pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

/// Phase name reported while a run is collapsing cells
pub const PROGRESS_PHASE: &str = "Generating";

// Progress bar display settings
/// Width of progress bars in characters
pub const PROGRESS_BAR_WIDTH: u16 = 40;
/// Resolution of the progress bar
pub const PROGRESS_BAR_STEPS: u64 = 1000;

// Output settings
/// Suffix added to output filenames
pub const OUTPUT_SUFFIX: &str = "_result";
/// Pixels per cell in exported layer images
pub const IMAGE_CELL_PIXELS: u32 = 8;
/// Gap in pixels between exported layers
pub const IMAGE_LAYER_GAP: u32 = 4;
