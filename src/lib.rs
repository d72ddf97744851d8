//! Wave function collapse over catalogues of painted 3D tiles
//!
//! Tiles are expanded into rotated and reflected variants whose adjacency is
//! derived from the paint on their faces. A generator fills a masked grid
//! volume with variants so that every pair of touching faces is compatible,
//! backtracking or retrying on contradiction, and reports the placed tiles.

#![forbid(unsafe_code)]

/// Tile model, propagation, search and result extraction
pub mod algorithm;
/// Catalogue files, results, images, progress and the CLI
pub mod io;
/// Entropy helpers
pub mod math;
/// Directions, orientations, faces, palettes, tiles and the grid
pub mod spatial;

pub use io::error::{GenerationError, Result};
