//! Grid geometry and tile descriptions
//!
//! This module contains:
//! - Face directions and integer vector helpers
//! - Tile orientations and cube symmetries
//! - Painted faces and the palette deciding which paint may touch
//! - Tile definitions with their editing operations
//! - The masked grid volume

/// Face directions and integer vector helpers
pub mod direction;
/// Painted 3x3 face grids
pub mod faces;
/// Paint colours and matching rules
pub mod palette;
/// Tile definitions and editing operations
pub mod tiles;
/// Masked cubic grid volume
pub mod topology;
/// Tile orientations and cube symmetries
pub mod transform;

pub use direction::{FaceDir, Vector3};
pub use faces::FaceDetails;
pub use palette::Palette;
pub use tiles::TileDefinition;
pub use topology::GridTopology;
pub use transform::{CellRotator, Rotation};
