/// Fixed-size bitsets of tile variants
pub mod bitset;
/// Turning decided domains into placed tiles
pub mod completion;
/// Custom constraints beyond adjacency
pub mod constraints;
/// Per-cell domains with entropy bookkeeping
pub mod domain;
/// Generation entry points, retries and threading
pub mod generator;
/// Tile variants and adjacency
pub mod model;
/// Arc-consistency propagation and backtracking
pub mod propagator;
/// A single set-up generation attempt
pub mod run;
/// Cell and variant selection
pub mod selection;
/// One step per host tick with incremental output
pub mod stepwise;
