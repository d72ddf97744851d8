//! Cell and variant selection for collapsing
//!
//! The next cell to collapse is the undecided cell of lowest entropy, ties
//! broken by a fixed per-cell noise drawn once per run. The variant is then
//! drawn by weight.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::algorithm::domain::Wave;
use crate::spatial::topology::GridTopology;

/// Scale of the tie-breaking noise added to cell entropies
pub const ENTROPY_NOISE: f64 = 1e-6;

/// Seeded random selector for reproducible stochastic choices
#[derive(Debug, Clone)]
pub struct RandomSelector {
    rng: StdRng,
}

impl RandomSelector {
    /// Create a deterministic random selector
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Create a selector seeded from ambient entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Uniform value in `[0, 1)`
    pub fn unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Fresh non-zero seed for a dependent stream
    pub fn next_seed(&mut self) -> u64 {
        self.rng.random::<u64>().max(1)
    }

    /// Generic weighted random selection
    ///
    /// Returns index into weights array using cumulative distribution
    pub fn weighted_choice(&mut self, weights: &[f64]) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return 0;
        }

        let mut rand_val = self.rng.random::<f64>() * total;
        for (i, &weight) in weights.iter().enumerate() {
            rand_val -= weight;
            if rand_val <= 0.0 {
                return i;
            }
        }
        weights.len().saturating_sub(1)
    }
}

/// Per-cell tie-breaking noise for a run
pub fn entropy_noise(selector: &mut RandomSelector, cells: usize) -> Vec<f64> {
    (0..cells).map(|_| selector.unit() * ENTROPY_NOISE).collect()
}

/// Undecided active cell with the lowest entropy
///
/// Returns `None` when every active cell holds at most one variant.
pub fn lowest_entropy_cell(topology: &GridTopology, wave: &Wave, noise: &[f64]) -> Option<usize> {
    topology
        .active_indices()
        .filter(|&cell| wave.remaining(cell) > 1)
        .map(|cell| {
            let jitter = noise.get(cell).copied().unwrap_or(0.0);
            (cell, wave.entropy(cell) + jitter)
        })
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(cell, _)| cell)
}
