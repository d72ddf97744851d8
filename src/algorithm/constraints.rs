//! Custom constraints layered over adjacency
//!
//! Constraints hold no per-run state: everything they need is read from the
//! propagator's domains, so undoing a decision never has to undo a
//! constraint. They are shared between runs as `Arc<dyn TileConstraint>`.

use std::sync::Arc;

use crate::algorithm::bitset::VariantSet;
use crate::algorithm::model::{TileId, TileModel};
use crate::algorithm::propagator::Propagator;
use crate::spatial::direction::FaceDir;

/// Outcome of evaluating a constraint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintStatus {
    /// The constraint can still be satisfied
    Consistent,
    /// The constraint can no longer be satisfied
    Contradiction,
}

/// A rule over the whole grid, beyond pairwise adjacency
pub trait TileConstraint: std::fmt::Debug + Send + Sync {
    /// Whether the current domains can still satisfy the rule
    ///
    /// Runs before the first collapse and again once every cell is decided.
    fn check(&self, propagator: &Propagator) -> ConstraintStatus;

    /// Remove variants the rule forbids, after each round of propagation
    ///
    /// Implementations remove through [`Propagator::exclude`] and
    /// [`Propagator::restrict`], which queue further propagation.
    fn propagate(&self, propagator: &mut Propagator) -> ConstraintStatus;
}

/// How a [`CountConstraint`] compares cells to its count
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountComparison {
    /// No more than `count` cells
    AtMost,
    /// No fewer than `count` cells
    AtLeast,
    /// Exactly `count` cells
    Exactly,
}

/// Cells matching a variant set, split by certainty
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    /// Every remaining variant is in the set
    definite: usize,
    /// Some remaining variant is in the set
    possible: usize,
}

fn classify(propagator: &Propagator, cell: usize, variants: &VariantSet) -> (bool, bool) {
    propagator
        .cell_state(cell)
        .filter(|domain| !domain.is_empty())
        .map_or((false, false), |domain| {
            let overlap = domain.intersection(variants).count();
            (overlap == domain.count(), overlap > 0)
        })
}

fn tally(propagator: &Propagator, variants: &VariantSet) -> Tally {
    let mut tally = Tally::default();
    for cell in propagator.topology().active_indices() {
        let (definite, possible) = classify(propagator, cell, variants);
        tally.definite += usize::from(definite);
        tally.possible += usize::from(possible);
    }
    tally
}

/// Limits how many cells hold one of a set of tiles
///
/// Counting is per cell, so a big tile counts once for each cell it covers.
/// Without `eager` the constraint only reports a contradiction once the
/// count is certainly broken. With `eager` it also bans the tiles everywhere
/// else when the maximum is reached, and forces them into every remaining
/// candidate cell when only just enough candidates are left.
#[derive(Clone, Debug)]
pub struct CountConstraint {
    variants: VariantSet,
    comparison: CountComparison,
    count: usize,
    eager: bool,
}

impl CountConstraint {
    /// Constrain the cells holding any of `tiles`
    pub fn new(
        model: &TileModel,
        tiles: &[TileId],
        comparison: CountComparison,
        count: usize,
        eager: bool,
    ) -> Self {
        Self {
            variants: model.variants_of_tiles(tiles),
            comparison,
            count,
            eager,
        }
    }

    /// Shared form for a generator
    pub fn shared(self) -> Arc<dyn TileConstraint> {
        Arc::new(self)
    }

    const fn limits_above(&self) -> bool {
        matches!(self.comparison, CountComparison::AtMost | CountComparison::Exactly)
    }

    const fn limits_below(&self) -> bool {
        matches!(self.comparison, CountComparison::AtLeast | CountComparison::Exactly)
    }
}

impl TileConstraint for CountConstraint {
    fn check(&self, propagator: &Propagator) -> ConstraintStatus {
        let tally = tally(propagator, &self.variants);
        if (self.limits_above() && tally.definite > self.count)
            || (self.limits_below() && tally.possible < self.count)
        {
            ConstraintStatus::Contradiction
        } else {
            ConstraintStatus::Consistent
        }
    }

    fn propagate(&self, propagator: &mut Propagator) -> ConstraintStatus {
        if self.check(propagator) == ConstraintStatus::Contradiction {
            return ConstraintStatus::Contradiction;
        }
        if !self.eager {
            return ConstraintStatus::Consistent;
        }

        let tally = tally(propagator, &self.variants);
        let full = self.limits_above() && tally.definite == self.count;
        let scarce = self.limits_below() && tally.possible == self.count;
        if !full && !scarce {
            return ConstraintStatus::Consistent;
        }

        let undecided: Vec<usize> = propagator
            .topology()
            .active_indices()
            .filter(|&cell| classify(propagator, cell, &self.variants) == (false, true))
            .collect();

        if full {
            let mut others = VariantSet::all(self.variants.capacity());
            for variant in self.variants.iter() {
                others.remove(variant);
            }
            for &cell in &undecided {
                propagator.restrict(cell, &others);
            }
        } else {
            for &cell in &undecided {
                propagator.restrict(cell, &self.variants);
            }
        }
        ConstraintStatus::Consistent
    }
}

/// Keeps every path cell connected to every other
///
/// Cells certain to hold a path tile must be joined through cells that could
/// still hold one. Cells that every such route passes through are forced to
/// path tiles.
#[derive(Clone, Debug)]
pub struct PathConstraint {
    variants: VariantSet,
}

#[derive(Clone, Copy, Debug)]
struct Visit {
    discovered: usize,
    low: usize,
    parent: Option<usize>,
    definite_below: usize,
}

impl PathConstraint {
    /// Constrain the cells holding any of `tiles`
    pub fn new(model: &TileModel, tiles: &[TileId]) -> Self {
        Self {
            variants: model.variants_of_tiles(tiles),
        }
    }

    /// Shared form for a generator
    pub fn shared(self) -> Arc<dyn TileConstraint> {
        Arc::new(self)
    }

    fn path_neighbors<'a>(
        &'a self,
        propagator: &'a Propagator,
        cell: usize,
    ) -> impl Iterator<Item = usize> + 'a {
        FaceDir::ALL.into_iter().filter_map(move |dir| {
            propagator
                .topology()
                .neighbor(cell, dir)
                .filter(|&n| classify(propagator, n, &self.variants).1)
        })
    }

    /// Depth-first search over candidate path cells from `root`
    ///
    /// Returns the visit record of every reached cell and the cells whose
    /// removal would split the definite path cells.
    fn search(&self, propagator: &Propagator, root: usize, total_definite: usize) -> (Vec<Option<Visit>>, Vec<usize>) {
        let cells = propagator.topology().len();
        let mut visits: Vec<Option<Visit>> = vec![None; cells];
        let mut cut_cells = Vec::new();
        let mut timer = 0;

        let is_definite = |cell: usize| usize::from(classify(propagator, cell, &self.variants).0);

        if let Some(slot) = visits.get_mut(root) {
            *slot = Some(Visit {
                discovered: timer,
                low: timer,
                parent: None,
                definite_below: is_definite(root),
            });
        }
        timer += 1;
        let mut stack: Vec<(usize, Vec<usize>)> =
            vec![(root, self.path_neighbors(propagator, root).collect())];

        while let Some((cell, pending)) = stack.last_mut() {
            let cell = *cell;
            if let Some(next) = pending.pop() {
                let parent = visits.get(cell).copied().flatten().and_then(|v| v.parent);
                match visits.get(next).copied().flatten() {
                    None => {
                        if let Some(slot) = visits.get_mut(next) {
                            *slot = Some(Visit {
                                discovered: timer,
                                low: timer,
                                parent: Some(cell),
                                definite_below: is_definite(next),
                            });
                        }
                        timer += 1;
                        stack.push((next, self.path_neighbors(propagator, next).collect()));
                    }
                    Some(seen) if parent != Some(next) => {
                        if let Some(Some(visit)) = visits.get_mut(cell) {
                            visit.low = visit.low.min(seen.discovered);
                        }
                    }
                    Some(_) => {}
                }
                continue;
            }

            stack.pop();
            let Some(child) = visits.get(cell).copied().flatten() else {
                continue;
            };
            let Some(parent) = child.parent else {
                continue;
            };
            if let Some(Some(visit)) = visits.get_mut(parent) {
                visit.low = visit.low.min(child.low);
                visit.definite_below += child.definite_below;
                let separates = child.low >= visit.discovered
                    && child.definite_below > 0
                    && total_definite > child.definite_below;
                if separates && !cut_cells.contains(&parent) {
                    cut_cells.push(parent);
                }
            }
        }

        (visits, cut_cells)
    }

    fn definite_cells(&self, propagator: &Propagator) -> Vec<usize> {
        propagator
            .topology()
            .active_indices()
            .filter(|&cell| classify(propagator, cell, &self.variants).0)
            .collect()
    }
}

impl TileConstraint for PathConstraint {
    fn check(&self, propagator: &Propagator) -> ConstraintStatus {
        let definite = self.definite_cells(propagator);
        let Some(&root) = definite.first() else {
            return ConstraintStatus::Consistent;
        };
        let (visits, _) = self.search(propagator, root, definite.len());
        if definite
            .iter()
            .all(|&cell| visits.get(cell).is_some_and(Option::is_some))
        {
            ConstraintStatus::Consistent
        } else {
            ConstraintStatus::Contradiction
        }
    }

    fn propagate(&self, propagator: &mut Propagator) -> ConstraintStatus {
        let definite = self.definite_cells(propagator);
        let Some(&root) = definite.first() else {
            return ConstraintStatus::Consistent;
        };
        let (visits, cut_cells) = self.search(propagator, root, definite.len());
        if !definite
            .iter()
            .all(|&cell| visits.get(cell).is_some_and(Option::is_some))
        {
            return ConstraintStatus::Contradiction;
        }

        for cell in cut_cells {
            if !classify(propagator, cell, &self.variants).0 {
                propagator.restrict(cell, &self.variants);
            }
        }
        ConstraintStatus::Consistent
    }
}
