use bitvec::prelude::*;
use std::fmt;

use crate::algorithm::model::VariantId;

/// Fixed-size bitset of tile variants
///
/// Backs both cell domains and adjacency rows, so membership tests and the
/// unions used during propagation are word-at-a-time.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariantSet {
    bits: BitVec,
}

impl VariantSet {
    /// Create a set with no variants present
    pub fn new(variant_count: usize) -> Self {
        Self {
            bits: bitvec![0; variant_count],
        }
    }

    /// Create a set containing every variant
    pub fn all(variant_count: usize) -> Self {
        Self {
            bits: bitvec![1; variant_count],
        }
    }

    /// Create a set from variant indices, ignoring any out of range
    pub fn from_indices(variant_count: usize, variants: impl IntoIterator<Item = VariantId>) -> Self {
        let mut set = Self::new(variant_count);
        for variant in variants {
            set.insert(variant);
        }
        set
    }

    /// Number of variants the set can hold
    pub fn capacity(&self) -> usize {
        self.bits.len()
    }

    /// Insert a variant, ignoring indices out of range
    pub fn insert(&mut self, variant: VariantId) {
        if variant < self.bits.len() {
            self.bits.set(variant, true);
        }
    }

    /// Remove a variant, returning whether it was present
    pub fn remove(&mut self, variant: VariantId) -> bool {
        let present = self.contains(variant);
        if present {
            self.bits.set(variant, false);
        }
        present
    }

    /// Test variant membership
    pub fn contains(&self, variant: VariantId) -> bool {
        self.bits.get(variant).as_deref() == Some(&true)
    }

    /// Intersect this set with another in-place
    pub fn intersect_with(&mut self, other: &Self) {
        self.bits &= &other.bits;
    }

    /// Union this set with another in-place
    pub fn union_with(&mut self, other: &Self) {
        self.bits |= &other.bits;
    }

    /// Create a new set containing the intersection
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Self {
        let mut result = self.clone();
        result.intersect_with(other);
        result
    }

    /// Test if no variants are present
    pub fn is_empty(&self) -> bool {
        self.bits.not_any()
    }

    /// Count variants in the set
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Iterate present variants in increasing order
    pub fn iter(&self) -> impl Iterator<Item = VariantId> + '_ {
        self.bits.iter_ones()
    }

    /// Lowest present variant
    pub fn first(&self) -> Option<VariantId> {
        self.bits.first_one()
    }

    /// Extract all variant indices as a vector
    pub fn to_vec(&self) -> Vec<VariantId> {
        self.iter().collect()
    }
}

impl fmt::Display for VariantSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VariantSet({} variants: {:?})", self.count(), self.to_vec())
    }
}
