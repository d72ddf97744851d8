//! Per-cell domains of admissible variants
//!
//! Alongside each domain the wave keeps the remaining count and the running
//! sums needed for entropy, updated on every removal and restore.

use crate::algorithm::bitset::VariantSet;
use crate::algorithm::model::VariantId;
use crate::math::entropy::{shannon_entropy, weight_log_weight};
use crate::spatial::topology::GridTopology;

/// Domain store for every cell of a grid
#[derive(Clone, Debug)]
pub struct Wave {
    domains: Vec<VariantSet>,
    remaining: Vec<usize>,
    sum_weights: Vec<f64>,
    sum_weight_log_weights: Vec<f64>,
    weights: Vec<f64>,
    weight_logs: Vec<f64>,
}

impl Wave {
    /// Every active cell admits every variant; masked cells admit none
    pub fn new(topology: &GridTopology, weights: &[f64]) -> Self {
        let count = weights.len();
        let total: f64 = weights.iter().sum();
        let weight_logs: Vec<f64> = weights.iter().map(|&w| weight_log_weight(w)).collect();
        let total_log: f64 = weight_logs.iter().sum();

        let cells = topology.len();
        let mut wave = Self {
            domains: Vec::with_capacity(cells),
            remaining: Vec::with_capacity(cells),
            sum_weights: Vec::with_capacity(cells),
            sum_weight_log_weights: Vec::with_capacity(cells),
            weights: weights.to_vec(),
            weight_logs,
        };
        for cell in 0..cells {
            if topology.is_active(cell) {
                wave.domains.push(VariantSet::all(count));
                wave.remaining.push(count);
                wave.sum_weights.push(total);
                wave.sum_weight_log_weights.push(total_log);
            } else {
                wave.domains.push(VariantSet::new(count));
                wave.remaining.push(0);
                wave.sum_weights.push(0.0);
                wave.sum_weight_log_weights.push(0.0);
            }
        }
        wave
    }

    /// Number of cells, masked or not
    pub const fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether the wave has no cells
    pub const fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Admissible variants of a cell
    pub fn domain(&self, cell: usize) -> Option<&VariantSet> {
        self.domains.get(cell)
    }

    /// Whether `variant` is still admissible at `cell`
    pub fn contains(&self, cell: usize, variant: VariantId) -> bool {
        self.domains.get(cell).is_some_and(|d| d.contains(variant))
    }

    /// Number of admissible variants at a cell
    pub fn remaining(&self, cell: usize) -> usize {
        self.remaining.get(cell).copied().unwrap_or(0)
    }

    /// The only admissible variant, once a cell is decided
    pub fn single(&self, cell: usize) -> Option<VariantId> {
        if self.remaining(cell) == 1 {
            self.domains.get(cell).and_then(VariantSet::first)
        } else {
            None
        }
    }

    /// Remove a variant from a cell, returning whether it was present
    pub fn remove(&mut self, cell: usize, variant: VariantId) -> bool {
        let Some(domain) = self.domains.get_mut(cell) else {
            return false;
        };
        if !domain.remove(variant) {
            return false;
        }
        self.adjust(cell, variant, -1.0);
        if let Some(n) = self.remaining.get_mut(cell) {
            *n -= 1;
        }
        true
    }

    /// Put a previously removed variant back, returning whether it was absent
    pub fn restore(&mut self, cell: usize, variant: VariantId) -> bool {
        let Some(domain) = self.domains.get_mut(cell) else {
            return false;
        };
        if variant >= domain.capacity() || domain.contains(variant) {
            return false;
        }
        domain.insert(variant);
        self.adjust(cell, variant, 1.0);
        if let Some(n) = self.remaining.get_mut(cell) {
            *n += 1;
        }
        true
    }

    fn adjust(&mut self, cell: usize, variant: VariantId, sign: f64) {
        let weight = self.weights.get(variant).copied().unwrap_or(0.0);
        let weight_log = self.weight_logs.get(variant).copied().unwrap_or(0.0);
        if let Some(sum) = self.sum_weights.get_mut(cell) {
            *sum = sign.mul_add(weight, *sum);
        }
        if let Some(sum) = self.sum_weight_log_weights.get_mut(cell) {
            *sum = sign.mul_add(weight_log, *sum);
        }
    }

    /// Shannon entropy of a cell's remaining variants
    pub fn entropy(&self, cell: usize) -> f64 {
        if self.remaining(cell) <= 1 {
            return 0.0;
        }
        shannon_entropy(
            self.sum_weights.get(cell).copied().unwrap_or(0.0),
            self.sum_weight_log_weights.get(cell).copied().unwrap_or(0.0),
        )
    }

    /// Remaining variants of a cell paired with their weights
    pub fn weighted_options(&self, cell: usize) -> Vec<(VariantId, f64)> {
        self.domains.get(cell).map_or_else(Vec::new, |domain| {
            domain
                .iter()
                .map(|v| (v, self.weights.get(v).copied().unwrap_or(0.0)))
                .collect()
        })
    }
}
