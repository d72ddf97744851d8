//! Input/output: catalogues, results, images, progress and the CLI

/// JSON tile catalogues
pub mod catalogue;
/// Command-line interface
pub mod cli;
/// Constants and runtime defaults
pub mod configuration;
/// Error types
pub mod error;
/// PNG export of generated layers
pub mod image;
/// Destinations for placed tiles and serialised results
pub mod output;
/// Progress display
pub mod progress;
