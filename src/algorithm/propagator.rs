//! Arc-consistency propagation with optional backtracking
//!
//! Every removal from a domain queues the cell. Draining the queue removes,
//! from each neighbour, the variants no longer supported by anything left in
//! the cell. Custom constraints run once the queue is empty and may remove
//! more, which queues more work.
//!
//! While backtracking is enabled each collapse pushes a decision and every
//! later removal is written to a trail. On contradiction the latest decision
//! is undone by replaying its part of the trail in reverse, its chosen
//! variant is excluded, and propagation resumes.

use log::debug;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::algorithm::bitset::VariantSet;
use crate::algorithm::constraints::{ConstraintStatus, TileConstraint};
use crate::algorithm::domain::Wave;
use crate::algorithm::model::{TileModel, VariantId};
use crate::algorithm::selection::{RandomSelector, entropy_noise, lowest_entropy_cell};
use crate::spatial::direction::FaceDir;
use crate::spatial::topology::GridTopology;

/// State of a run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// Some active cell still admits several variants
    Undecided,
    /// Every active cell admits exactly one variant
    Decided,
    /// Some active cell admits nothing and recovery is exhausted
    Contradiction,
}

/// How many collapse decisions can be undone
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BacktrackDepth {
    /// Never undo; the first contradiction is final
    Disabled,
    /// Keep at most this many of the latest decisions
    Limited(usize),
    /// Keep every decision
    #[default]
    Unlimited,
}

impl BacktrackDepth {
    const fn keeps_history(self) -> bool {
        match self {
            Self::Disabled | Self::Limited(0) => false,
            Self::Limited(_) | Self::Unlimited => true,
        }
    }
}

/// Why a variant left a domain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BanCause {
    /// Intersection with an allowed set
    Select,
    /// Explicit removal
    Ban,
    /// No support left in a neighbour
    Propagation,
    /// Another variant was chosen for the cell
    Collapse,
    /// The variant led to a contradiction and was ruled out
    Exclusion,
    /// Removed by a custom constraint
    Constraint,
}

/// One removal, kept so it can be undone
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrailRecord {
    /// Cell the variant was removed from
    pub cell: usize,
    /// Removed variant
    pub variant: VariantId,
    /// Why it was removed
    pub cause: BanCause,
}

#[derive(Clone, Copy, Debug)]
struct Decision {
    trail_mark: usize,
    cell: usize,
    variant: VariantId,
}

/// Settings for a propagator
#[derive(Clone, Default)]
pub struct PropagatorOptions {
    /// Decision history kept for backtracking
    pub backtrack: BacktrackDepth,
    /// Custom constraints run after each round of propagation
    pub constraints: Vec<Arc<dyn TileConstraint>>,
}

impl std::fmt::Debug for PropagatorOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropagatorOptions")
            .field("backtrack", &self.backtrack)
            .field("constraints", &self.constraints.len())
            .finish()
    }
}

/// Domain store plus the propagation and search state of one run
pub struct Propagator {
    model: Arc<TileModel>,
    topology: GridTopology,
    wave: Wave,
    queue: VecDeque<usize>,
    queued: Vec<bool>,
    status: Resolution,
    conflicted: bool,
    contradiction_cell: Option<usize>,
    backtrack: BacktrackDepth,
    decisions: Vec<Decision>,
    trail: Vec<TrailRecord>,
    backtrack_count: usize,
    collapse_history: Vec<(usize, VariantId)>,
    constraints: Vec<Arc<dyn TileConstraint>>,
    checked: bool,
    selector: RandomSelector,
    noise: Vec<f64>,
}

impl std::fmt::Debug for Propagator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Propagator")
            .field("size", &self.topology.size())
            .field("status", &self.status)
            .field("decisions", &self.decisions.len())
            .field("backtrack_count", &self.backtrack_count)
            .finish_non_exhaustive()
    }
}

impl Propagator {
    /// Start with every active cell admitting every variant
    pub fn new(
        model: Arc<TileModel>,
        topology: GridTopology,
        options: PropagatorOptions,
        seed: u64,
    ) -> Self {
        let wave = Wave::new(&topology, model.weights());
        let mut selector = RandomSelector::new(seed);
        let noise = entropy_noise(&mut selector, topology.len());
        let status = if model.variant_count() == 0 && topology.active_count() > 0 {
            Resolution::Contradiction
        } else {
            Resolution::Undecided
        };

        // Every active cell starts queued so the first settle makes the
        // initial domains arc consistent
        let queue: VecDeque<usize> = topology.active_indices().collect();
        let mut queued = vec![false; topology.len()];
        for &cell in &queue {
            if let Some(flag) = queued.get_mut(cell) {
                *flag = true;
            }
        }

        Self {
            queued,
            model,
            topology,
            wave,
            queue,
            status,
            conflicted: false,
            contradiction_cell: None,
            backtrack: options.backtrack,
            decisions: Vec::new(),
            trail: Vec::new(),
            backtrack_count: 0,
            collapse_history: Vec::new(),
            constraints: options.constraints,
            checked: false,
            selector,
            noise,
        }
    }

    /// Current state
    pub const fn status(&self) -> Resolution {
        self.status
    }

    /// Tile model shared by this run
    pub const fn model(&self) -> &Arc<TileModel> {
        &self.model
    }

    /// Grid of this run
    pub const fn topology(&self) -> &GridTopology {
        &self.topology
    }

    /// Domain store of this run
    pub const fn wave(&self) -> &Wave {
        &self.wave
    }

    /// Admissible variants of one cell
    pub fn cell_state(&self, cell: usize) -> Option<&VariantSet> {
        self.wave.domain(cell)
    }

    /// The variant a cell is decided on, if any
    pub fn decided_variant(&self, cell: usize) -> Option<VariantId> {
        self.wave.single(cell)
    }

    /// Number of decisions undone so far
    pub const fn backtrack_count(&self) -> usize {
        self.backtrack_count
    }

    /// Every collapse made, in order, including ones later undone
    pub fn collapse_history(&self) -> &[(usize, VariantId)] {
        &self.collapse_history
    }

    /// Removals that can still be undone
    pub fn trail(&self) -> &[TrailRecord] {
        &self.trail
    }

    /// Cell whose domain emptied most recently
    pub const fn contradiction_cell(&self) -> Option<usize> {
        self.contradiction_cell
    }

    /// Fraction of active cells decided, in `[0, 1]`
    pub fn progress(&self) -> f64 {
        let active = self.topology.active_count();
        if active == 0 {
            return 1.0;
        }
        let decided = self
            .topology
            .active_indices()
            .filter(|&cell| self.wave.remaining(cell) == 1)
            .count();
        decided as f64 / active as f64
    }

    /// Restrict a cell to the variants in `allowed`, then propagate
    pub fn select(&mut self, cell: usize, allowed: &VariantSet) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        self.restrict_with(cell, allowed, BanCause::Select);
        self.settle();
        self.status
    }

    /// Remove one variant from a cell, then propagate
    pub fn ban(&mut self, cell: usize, variant: VariantId) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        self.remove_variant(cell, variant, BanCause::Ban);
        self.settle();
        self.status
    }

    /// Restrict several cells, then propagate once
    pub fn select_many(&mut self, selections: &[(usize, VariantSet)]) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        for (cell, allowed) in selections {
            self.restrict_with(*cell, allowed, BanCause::Select);
        }
        self.settle();
        self.status
    }

    /// Remove many variants, then propagate once
    pub fn ban_many(&mut self, bans: impl IntoIterator<Item = (usize, VariantId)>) -> Resolution {
        if self.status == Resolution::Contradiction {
            return self.status;
        }
        for (cell, variant) in bans {
            self.remove_variant(cell, variant, BanCause::Ban);
        }
        self.settle();
        self.status
    }

    /// Remove one variant without propagating
    ///
    /// Meant for custom constraints, which run inside propagation. Returns
    /// whether the variant was present.
    pub fn exclude(&mut self, cell: usize, variant: VariantId) -> bool {
        self.remove_variant(cell, variant, BanCause::Constraint)
    }

    /// Restrict a cell to `allowed` without propagating
    ///
    /// Meant for custom constraints. Returns whether anything was removed.
    pub fn restrict(&mut self, cell: usize, allowed: &VariantSet) -> bool {
        self.restrict_with(cell, allowed, BanCause::Constraint)
    }

    fn restrict_with(&mut self, cell: usize, allowed: &VariantSet, cause: BanCause) -> bool {
        let doomed: Vec<VariantId> = self
            .wave
            .domain(cell)
            .map(|domain| domain.iter().filter(|v| !allowed.contains(*v)).collect())
            .unwrap_or_default();
        let mut changed = false;
        for variant in doomed {
            changed |= self.remove_variant(cell, variant, cause);
        }
        changed
    }

    fn remove_variant(&mut self, cell: usize, variant: VariantId, cause: BanCause) -> bool {
        if !self.wave.remove(cell, variant) {
            return false;
        }
        if !self.decisions.is_empty() {
            self.trail.push(TrailRecord {
                cell,
                variant,
                cause,
            });
        }
        if self.wave.remaining(cell) == 0 && !self.conflicted {
            self.conflicted = true;
            self.contradiction_cell = Some(cell);
        }
        self.enqueue(cell);
        true
    }

    fn enqueue(&mut self, cell: usize) {
        if let Some(flag) = self.queued.get_mut(cell)
            && !*flag
        {
            *flag = true;
            self.queue.push_back(cell);
        }
    }

    /// Drain the queue, removing unsupported neighbour variants
    ///
    /// Returns `false` as soon as a domain empties. Custom constraints are
    /// not run.
    pub fn propagate(&mut self) -> bool {
        let variant_count = self.model.variant_count();
        while !self.conflicted {
            let Some(cell) = self.queue.pop_front() else {
                break;
            };
            if let Some(flag) = self.queued.get_mut(cell) {
                *flag = false;
            }

            for dir in FaceDir::ALL {
                let Some(neighbor) = self.topology.neighbor(cell, dir) else {
                    continue;
                };
                let mut support = VariantSet::new(variant_count);
                if let Some(domain) = self.wave.domain(cell) {
                    for variant in domain.iter() {
                        if let Some(allowed) = self.model.allowed_neighbors(variant, dir) {
                            support.union_with(allowed);
                        }
                    }
                }
                let unsupported: Vec<VariantId> = self
                    .wave
                    .domain(neighbor)
                    .map(|domain| domain.iter().filter(|v| !support.contains(*v)).collect())
                    .unwrap_or_default();
                for variant in unsupported {
                    self.remove_variant(neighbor, variant, BanCause::Propagation);
                }
                if self.conflicted {
                    break;
                }
            }
        }
        !self.conflicted
    }

    fn run_constraints(&mut self, final_check: bool) -> bool {
        let constraints = self.constraints.clone();
        for constraint in &constraints {
            let status = if final_check {
                constraint.check(self)
            } else {
                constraint.propagate(self)
            };
            if status == ConstraintStatus::Contradiction {
                self.conflicted = true;
            }
            if self.conflicted {
                return false;
            }
        }
        true
    }

    fn all_decided(&self) -> bool {
        self.topology
            .active_indices()
            .all(|cell| self.wave.remaining(cell) == 1)
    }

    /// Propagate to a fixpoint, recovering from contradictions when possible
    fn settle(&mut self) {
        loop {
            let consistent = self.propagate()
                && (self.checked || self.run_constraints(true))
                && self.run_constraints(false);
            self.checked = true;

            if !consistent {
                if self.recover() {
                    continue;
                }
                self.status = Resolution::Contradiction;
                return;
            }
            if !self.queue.is_empty() {
                continue;
            }
            if self.all_decided() && !self.run_constraints(true) {
                if self.recover() {
                    continue;
                }
                self.status = Resolution::Contradiction;
                return;
            }
            break;
        }

        self.status = if self.all_decided() {
            Resolution::Decided
        } else {
            Resolution::Undecided
        };
    }

    /// Undo the latest decision and rule out its choice
    fn recover(&mut self) -> bool {
        if !self.backtrack.keeps_history() {
            return false;
        }
        let Some(decision) = self.decisions.pop() else {
            return false;
        };

        while self.trail.len() > decision.trail_mark {
            if let Some(record) = self.trail.pop() {
                self.wave.restore(record.cell, record.variant);
            }
        }
        self.queue.clear();
        self.queued.fill(false);
        self.conflicted = false;
        self.contradiction_cell = None;
        self.backtrack_count += 1;
        debug!(
            "Backtracking: undoing variant {} at cell {} ({} decisions left)",
            decision.variant,
            decision.cell,
            self.decisions.len()
        );

        self.remove_variant(decision.cell, decision.variant, BanCause::Exclusion);
        true
    }

    fn push_decision(&mut self, cell: usize, variant: VariantId) {
        if !self.backtrack.keeps_history() {
            return;
        }
        self.decisions.push(Decision {
            trail_mark: self.trail.len(),
            cell,
            variant,
        });
        if let BacktrackDepth::Limited(limit) = self.backtrack
            && self.decisions.len() > limit
        {
            self.decisions.remove(0);
            let forgotten = self
                .decisions
                .first()
                .map_or(self.trail.len(), |d| d.trail_mark);
            self.trail.drain(..forgotten);
            for kept in &mut self.decisions {
                kept.trail_mark -= forgotten;
            }
        }
    }

    /// Perform one unit of work
    ///
    /// Drains pending propagation if any; otherwise collapses the lowest
    /// entropy cell to a weighted random variant and propagates the result.
    /// Terminal states are returned unchanged.
    pub fn step(&mut self) -> Resolution {
        if self.status != Resolution::Undecided {
            return self.status;
        }
        if !self.queue.is_empty() || !self.checked {
            self.settle();
            return self.status;
        }

        let Some(cell) = lowest_entropy_cell(&self.topology, &self.wave, &self.noise) else {
            self.settle();
            return self.status;
        };

        let options = self.wave.weighted_options(cell);
        let weights: Vec<f64> = options.iter().map(|(_, w)| *w).collect();
        let choice = self.selector.weighted_choice(&weights);
        let Some(&(variant, _)) = options.get(choice) else {
            self.settle();
            return self.status;
        };

        self.push_decision(cell, variant);
        self.collapse_history.push((cell, variant));
        let chosen = VariantSet::from_indices(self.model.variant_count(), [variant]);
        self.restrict_with(cell, &chosen, BanCause::Collapse);
        self.settle();
        self.status
    }

    /// Step until the run is decided or contradicted
    pub fn run(&mut self) -> Resolution {
        while self.step() == Resolution::Undecided {}
        self.status
    }
}
