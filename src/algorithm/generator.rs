//! Generation entry points: configuration, attempts, retries and threading

use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use crate::algorithm::completion::{Completion, GridPlacement};
use crate::algorithm::constraints::TileConstraint;
use crate::algorithm::model::TileModel;
use crate::algorithm::propagator::Resolution;
use crate::algorithm::run::{GenerationRun, InitialConstraint, is_valid_skybox};
use crate::algorithm::selection::RandomSelector;
use crate::io::configuration::{
    DEFAULT_BACKTRACK, DEFAULT_CELL_SIZE, DEFAULT_RETRIES, DEFAULT_SIZE, MAX_GRID_CELLS,
    RANDOM_SEED,
};
use crate::io::error::{GenerationError, Result, configuration_error, invalid_parameter};
use crate::spatial::tiles::TileDefinition;
use crate::spatial::transform::Rotation;

/// Receives `(phase, fraction)` progress reports, possibly from a worker thread
pub type ProgressCallback = Arc<dyn Fn(&str, f64) + Send + Sync>;

/// Cooperative cancellation flag shared between a caller and a run
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every run holding this token to stop at its next step
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Grid and search settings
#[derive(Clone, Debug, PartialEq)]
pub struct GeneratorConfig {
    /// `[width, height, depth]` in cells
    pub size: [usize; 3],
    /// Distance between neighbouring cell centres
    pub cell_size: [f64; 3],
    /// World position of the centre of the volume
    pub center: [f64; 3],
    /// Whether the propagator undoes decisions after a contradiction
    pub backtrack: bool,
    /// Most decisions kept for backtracking; `None` keeps all
    pub backtrack_limit: Option<usize>,
    /// Attempts made when backtracking is off; 0 still makes one
    pub retries: usize,
    /// Tile whose faces surround the volume
    pub skybox: Option<TileDefinition>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            cell_size: DEFAULT_CELL_SIZE,
            center: [0.0; 3],
            backtrack: DEFAULT_BACKTRACK,
            backtrack_limit: None,
            retries: DEFAULT_RETRIES,
            skybox: None,
        }
    }
}

/// Per-call settings
#[derive(Clone, Default)]
pub struct GenerateOptions {
    /// Seed of the first attempt; 0 picks one from ambient entropy
    pub seed: u64,
    /// Run on a worker thread instead of the calling one
    pub multithreaded: bool,
    /// Progress sink
    pub progress: Option<ProgressCallback>,
    /// Cancellation flag polled at every step
    pub cancellation: Option<CancellationToken>,
}

impl std::fmt::Debug for GenerateOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerateOptions")
            .field("seed", &self.seed)
            .field("multithreaded", &self.multithreaded)
            .field("progress", &self.progress.is_some())
            .field("cancellation", &self.cancellation)
            .finish()
    }
}

/// Fills a grid from a tile model
#[derive(Clone)]
pub struct Generator {
    model: Arc<TileModel>,
    config: GeneratorConfig,
    initial_constraints: Vec<InitialConstraint>,
    constraints: Vec<Arc<dyn TileConstraint>>,
}

impl std::fmt::Debug for Generator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Generator")
            .field("config", &self.config)
            .field("initial_constraints", &self.initial_constraints.len())
            .field("constraints", &self.constraints.len())
            .finish_non_exhaustive()
    }
}

impl Generator {
    /// Validate the configuration against the model
    ///
    /// Tiles authored for a different cell size are only warned about.
    ///
    /// # Errors
    ///
    /// Returns an invalid parameter error for an empty or oversized grid or a
    /// non-positive cell size, and a configuration error for a skybox that
    /// does not paint all six sides.
    pub fn new(model: Arc<TileModel>, config: GeneratorConfig) -> Result<Self> {
        if config.size.contains(&0) {
            return Err(invalid_parameter(
                "size",
                &format!("{:?}", config.size),
                &"every dimension must be positive",
            ));
        }
        let cells = config
            .size
            .iter()
            .try_fold(1usize, |acc, &extent| acc.checked_mul(extent))
            .unwrap_or(usize::MAX);
        if cells > MAX_GRID_CELLS {
            return Err(invalid_parameter(
                "size",
                &format!("{:?}", config.size),
                &format!("grid may hold at most {MAX_GRID_CELLS} cells"),
            ));
        }
        if config.cell_size.iter().any(|&s| !(s.is_finite() && s > 0.0)) {
            return Err(invalid_parameter(
                "cell_size",
                &format!("{:?}", config.cell_size),
                &"cell size must be positive",
            ));
        }
        if let Some(skybox) = &config.skybox
            && !is_valid_skybox(skybox)
        {
            return Err(configuration_error(&format!(
                "skybox '{}' does not have a face on every side",
                skybox.name
            )));
        }

        for tile in model.tiles() {
            let mismatch = tile
                .tile_size
                .iter()
                .zip(config.cell_size)
                .any(|(a, b)| (a - b).abs() > 1e-4);
            if mismatch {
                warn!(
                    "Tile '{}' was authored for cell size {:?} but the grid uses {:?}",
                    tile.name, tile.tile_size, config.cell_size
                );
            }
        }

        Ok(Self {
            model,
            config,
            initial_constraints: Vec::new(),
            constraints: Vec::new(),
        })
    }

    /// Builder adding tiles placed before generation
    #[must_use]
    pub fn with_initial_constraints(mut self, constraints: Vec<InitialConstraint>) -> Self {
        self.initial_constraints.extend(constraints);
        self
    }

    /// Builder adding custom constraints
    #[must_use]
    pub fn with_constraints(mut self, constraints: Vec<Arc<dyn TileConstraint>>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// Shared tile model
    pub const fn model(&self) -> &Arc<TileModel> {
        &self.model
    }

    /// Grid and search settings
    pub const fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// World placement of the grid
    pub const fn placement(&self) -> GridPlacement {
        GridPlacement {
            center: self.config.center,
            cell_size: self.config.cell_size,
            size: self.config.size,
        }
    }

    /// Initial constraint for an existing tile at a world position
    ///
    /// Returns `None` when the tile is not aligned with a cell of the grid.
    pub fn initial_constraint(
        &self,
        tile: &TileDefinition,
        position: [f64; 3],
        rotation: Rotation,
    ) -> Option<InitialConstraint> {
        self.placement()
            .cell_at(tile, position, rotation)
            .map(|cell| InitialConstraint::from_tile(tile, cell, rotation.rotator()))
    }

    /// Build and set up one attempt
    pub fn start_run(&self, seed: u64) -> GenerationRun {
        GenerationRun::new(
            Arc::clone(&self.model),
            &self.config,
            &self.initial_constraints,
            self.constraints.clone(),
            seed,
        )
    }

    /// Generate, retrying from fresh seeds when backtracking is off
    ///
    /// With `multithreaded` set the attempts run on a worker thread and the
    /// caller waits for it.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Cancelled`] when cancelled and
    /// [`GenerationError::WorkerPanicked`] if the worker thread dies. A
    /// contradiction is reported through the returned [`Completion`].
    pub fn generate(&self, options: &GenerateOptions) -> Result<Completion> {
        if options.multithreaded {
            std::thread::scope(|scope| {
                scope
                    .spawn(|| self.attempts(options))
                    .join()
                    .unwrap_or(Err(GenerationError::WorkerPanicked))
            })
        } else {
            self.attempts(options)
        }
    }

    /// Generate on a background thread
    ///
    /// The handle can cancel the work and wait for its result.
    pub fn spawn(&self, mut options: GenerateOptions) -> GenerationHandle {
        let cancellation = options
            .cancellation
            .get_or_insert_with(CancellationToken::new)
            .clone();
        options.multithreaded = false;
        let generator = self.clone();
        GenerationHandle {
            thread: std::thread::spawn(move || generator.attempts(&options)),
            cancellation,
        }
    }

    fn attempts(&self, options: &GenerateOptions) -> Result<Completion> {
        let seed = if options.seed == RANDOM_SEED {
            RandomSelector::from_entropy().next_seed()
        } else {
            options.seed
        };
        let mut seeds = RandomSelector::new(seed);
        let attempts = if self.config.backtrack {
            1
        } else {
            self.config.retries.max(1)
        };

        let mut last = Completion::default();
        for attempt in 0..attempts {
            let attempt_seed = if attempt == 0 {
                seed
            } else {
                seeds.next_seed()
            };
            if let Some(report) = &options.progress {
                report("Initializing", 0.0);
            }

            let mut run = self.start_run(attempt_seed);
            if run.setup_status() == Resolution::Contradiction {
                warn!("Setup contradicted; not retrying");
                return Ok(run.completion(attempt));
            }

            let status = run.run(options.progress.as_ref(), options.cancellation.as_ref())?;
            last = run.completion(attempt);
            if status == Resolution::Decided {
                info!(
                    "Generated {} tiles with seed {attempt_seed} after {attempt} retries and {} backtracks",
                    last.instances.len(),
                    last.backtrack_count
                );
                return Ok(last);
            }
            debug!(
                "Attempt {} with seed {attempt_seed} contradicted at {:?}",
                attempt + 1,
                last.contradiction_location
            );
        }

        warn!("Generation failed after {attempts} attempts");
        Ok(last)
    }
}

/// A generation running on a background thread
#[derive(Debug)]
pub struct GenerationHandle {
    thread: JoinHandle<Result<Completion>>,
    cancellation: CancellationToken,
}

impl GenerationHandle {
    /// Whether the worker has finished
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Ask the worker to stop at its next step
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Wait for the result
    ///
    /// # Errors
    ///
    /// Returns the worker's error, or [`GenerationError::WorkerPanicked`] if
    /// it panicked.
    pub fn join(self) -> Result<Completion> {
        self.thread
            .join()
            .unwrap_or(Err(GenerationError::WorkerPanicked))
    }
}
