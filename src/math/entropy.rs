//! Shannon entropy of weighted choices, maintained incrementally
//!
//! A cell's entropy is computed from two running sums over its remaining
//! variants, `Σw` and `Σw·ln w`, so removing a variant only subtracts its
//! terms instead of rescanning the whole domain.

/// The `w·ln w` term contributed by one weight
///
/// Zero and negative weights contribute nothing.
pub fn weight_log_weight(weight: f64) -> f64 {
    if weight > 0.0 { weight * weight.ln() } else { 0.0 }
}

/// Shannon entropy of the normalised distribution from its running sums
///
/// `H = ln(Σw) - Σ(w·ln w) / Σw`. Returns 0 for an empty distribution.
pub fn shannon_entropy(sum_weights: f64, sum_weight_log_weights: f64) -> f64 {
    if sum_weights <= 0.0 {
        return 0.0;
    }
    (sum_weights.ln() - sum_weight_log_weights / sum_weights).max(0.0)
}
