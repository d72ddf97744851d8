//! Driving a run one step per host tick
//!
//! Each call to [`StepwiseGeneration::advance`] performs one step and pushes
//! the difference since the previous call into an incremental output: newly
//! decided tiles are placed and cells undone by backtracking are cleared.

use crate::algorithm::completion::{Completion, tile_instance};
use crate::algorithm::model::VariantId;
use crate::algorithm::propagator::Resolution;
use crate::algorithm::run::GenerationRun;
use crate::io::error::{Result, configuration_error};
use crate::io::output::TileOutput;

/// A run shown as it is generated
#[derive(Debug)]
pub struct StepwiseGeneration {
    run: GenerationRun,
    shown: Vec<Option<VariantId>>,
}

impl StepwiseGeneration {
    /// Start showing a run in `output`
    ///
    /// The output is cleared, then filled with whatever setup already decided.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `output` cannot take incremental
    /// updates.
    pub fn new(run: GenerationRun, output: &mut dyn TileOutput) -> Result<Self> {
        if !output.supports_incremental() {
            return Err(configuration_error(
                &"stepwise generation needs an output that supports incremental updates",
            ));
        }
        output.clear_tiles();
        let cells = run.propagator().topology().len();
        let mut stepwise = Self {
            run,
            shown: vec![None; cells],
        };
        stepwise.sync(output);
        Ok(stepwise)
    }

    /// Underlying run
    pub const fn run(&self) -> &GenerationRun {
        &self.run
    }

    /// Current state
    pub const fn status(&self) -> Resolution {
        self.run.propagator().status()
    }

    /// Perform one step and show its effect
    pub fn advance(&mut self, output: &mut dyn TileOutput) -> Resolution {
        let status = self.run.step();
        self.sync(output);
        status
    }

    /// Summarise the run so far
    pub fn completion(&self) -> Completion {
        self.run.completion(0)
    }

    fn sync(&mut self, output: &mut dyn TileOutput) {
        let propagator = self.run.propagator();
        let topology = propagator.topology();
        let model = propagator.model();
        let placement = self.run.placement();

        let mut cleared = Vec::new();
        let mut placed = Vec::new();
        for cell in topology.active_indices() {
            let now = propagator.decided_variant(cell);
            let Some(shown) = self.shown.get_mut(cell) else {
                continue;
            };
            if *shown == now {
                continue;
            }
            if shown.is_some() {
                cleared.push(topology.coord_of(cell));
            }
            *shown = now;

            let Some(variant) = now else {
                continue;
            };
            let anchors_tile = model.variant(variant).is_some_and(|v| {
                model
                    .tile(v.tile)
                    .and_then(|tile| tile.offsets.first())
                    .is_some_and(|&first| first == v.offset)
            });
            if anchors_tile
                && let Some(instance) =
                    tile_instance(model, placement, topology.coord_of(cell), variant)
            {
                placed.push(instance);
            }
        }

        if !cleared.is_empty() {
            output.clear_cells(&cleared);
        }
        if !placed.is_empty() {
            output.update_tiles(&placed);
        }
    }
}
