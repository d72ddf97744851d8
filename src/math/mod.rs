//! Mathematical utilities for the algorithm

/// Entropy of weighted variant distributions
pub mod entropy;
