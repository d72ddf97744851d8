//! A single generation attempt
//!
//! Setup happens entirely in [`GenerationRun::new`]: mask cells taken by fixed
//! tiles, constrain their neighbours through the fixed tiles' faces, apply
//! selected tiles, wrap the volume in the skybox, and ban big-tile variants
//! that would stick out of the volume or into masked cells. A run can only be
//! stepped once it is set up.

use log::{debug, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use crate::algorithm::bitset::VariantSet;
use crate::algorithm::completion::{
    Completion, GridPlacement, contradiction_location, extract_instances,
};
use crate::algorithm::constraints::TileConstraint;
use crate::algorithm::generator::{CancellationToken, GeneratorConfig, ProgressCallback};
use crate::algorithm::model::{TileId, TileModel, VariantId};
use crate::algorithm::propagator::{BacktrackDepth, Propagator, PropagatorOptions, Resolution};
use crate::io::configuration::{PROGRESS_INTERVAL, PROGRESS_PHASE};
use crate::io::error::{GenerationError, Result};
use crate::spatial::direction::{FaceDir, Vector3, add};
use crate::spatial::faces::{FaceDetails, OrientedFace};
use crate::spatial::tiles::TileDefinition;
use crate::spatial::topology::GridTopology;
use crate::spatial::transform::{CellRotator, Rotation};

/// A tile placed before generation starts
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InitialConstraint {
    /// A tile that already exists in the volume
    ///
    /// Its cells are masked out and every neighbouring cell must match the
    /// face it touches.
    Fixed {
        /// Outward faces in the tile's own frame
        faces: Vec<OrientedFace>,
        /// Occupied cells in the tile's own frame
        offsets: Vec<Vector3>,
        /// Maps the tile's frame into the grid
        rotator: CellRotator,
        /// Grid cell of the tile's origin
        cell: Vector3,
    },
    /// A tile of the model forced into the result
    Select {
        /// Tile to place
        tile: TileId,
        /// Orientation of the tile
        rotation: Rotation,
        /// Grid cell of the tile's origin
        cell: Vector3,
    },
}

impl InitialConstraint {
    /// Fix an existing tile at `cell`
    pub fn from_tile(tile: &TileDefinition, cell: Vector3, rotator: CellRotator) -> Self {
        Self::Fixed {
            faces: tile.external_faces().collect(),
            offsets: tile.offsets.clone(),
            rotator,
            cell,
        }
    }

    /// Force a tile of the model into the result at `cell`
    pub const fn select(tile: TileId, cell: Vector3, rotation: Rotation) -> Self {
        Self::Select {
            tile,
            rotation,
            cell,
        }
    }

    /// Cells masked out by this constraint
    fn masked_cells(&self) -> Vec<Vector3> {
        match self {
            Self::Fixed {
                offsets,
                rotator,
                cell,
                ..
            } => offsets
                .iter()
                .map(|&offset| add(*cell, rotator.multiply(offset)))
                .collect(),
            Self::Select { .. } => Vec::new(),
        }
    }
}

/// Painted outward faces of the skybox, indexed by direction
fn skybox_faces(skybox: &TileDefinition) -> [Option<FaceDetails>; 6] {
    let mut faces = [None; 6];
    for face in skybox
        .faces
        .iter()
        .filter(|f| skybox.contains(f.offset) && !skybox.is_internal(f.offset, f.dir))
    {
        if let Some(slot) = faces.get_mut(face.dir.index()) {
            slot.get_or_insert(face.details);
        }
    }
    faces
}

/// Whether a tile has a painted outward face on every side
pub fn is_valid_skybox(skybox: &TileDefinition) -> bool {
    skybox_faces(skybox).iter().all(Option::is_some)
}

/// Face constraints collected during setup
///
/// Each (cell, face) pair is constrained at most once.
struct FaceConstraints<'a> {
    model: &'a TileModel,
    topology: &'a GridTopology,
    seen: HashSet<(Vector3, FaceDir)>,
    selections: Vec<(usize, VariantSet)>,
}

impl FaceConstraints<'_> {
    /// Constrain the cell beyond face `dir` of `cell` to variants matching `details`
    fn add(&mut self, cell: Vector3, dir: FaceDir, details: &FaceDetails) {
        let target = add(cell, dir.forward());
        let facing = dir.inverted();
        if !self.topology.is_active_at(target) || !self.seen.insert((target, facing)) {
            return;
        }
        if let Some(index) = self.topology.index_of(target) {
            let allowed = self.model.variants_matching_face(facing, details);
            self.selections.push((index, allowed));
        }
    }
}

/// One attempt at filling the grid
#[derive(Debug)]
pub struct GenerationRun {
    propagator: Propagator,
    placement: GridPlacement,
    seed: u64,
    setup_status: Resolution,
}

impl GenerationRun {
    /// Build and set up an attempt
    ///
    /// A contradiction during setup leaves the run in its terminal
    /// [`Resolution::Contradiction`] state; see [`setup_status`](Self::setup_status).
    pub fn new(
        model: Arc<TileModel>,
        config: &GeneratorConfig,
        initial_constraints: &[InitialConstraint],
        constraints: Vec<Arc<dyn TileConstraint>>,
        seed: u64,
    ) -> Self {
        let mut topology = GridTopology::new(config.size);
        for constraint in initial_constraints {
            for cell in constraint.masked_cells() {
                topology.set_active(cell, false);
            }
        }

        let backtrack = match (config.backtrack, config.backtrack_limit) {
            (false, _) => BacktrackDepth::Disabled,
            (true, Some(limit)) => BacktrackDepth::Limited(limit),
            (true, None) => BacktrackDepth::Unlimited,
        };
        let options = PropagatorOptions {
            backtrack,
            constraints,
        };
        let mut propagator = Propagator::new(model, topology.clone(), options, seed);
        let shared = Arc::clone(propagator.model());

        apply_initial_constraints(&mut propagator, &shared, &topology, initial_constraints);
        if propagator.status() == Resolution::Contradiction {
            warn!("Contradiction after applying initial constraints");
        }

        if let Some(skybox) = &config.skybox {
            apply_skybox(&mut propagator, &shared, &topology, skybox);
            if propagator.status() == Resolution::Contradiction {
                warn!("Contradiction after applying the skybox");
            }
        }

        ban_big_tiles(&mut propagator, &shared, &topology);
        if propagator.status() == Resolution::Contradiction {
            warn!("Contradiction after removing big tiles overlapping edges");
        }

        let setup_status = propagator.status();
        Self {
            propagator,
            placement: GridPlacement {
                center: config.center,
                cell_size: config.cell_size,
                size: config.size,
            },
            seed,
            setup_status,
        }
    }

    /// State once setup finished
    pub const fn setup_status(&self) -> Resolution {
        self.setup_status
    }

    /// Seed driving this attempt
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Propagator of this attempt
    pub const fn propagator(&self) -> &Propagator {
        &self.propagator
    }

    /// World placement of the grid
    pub const fn placement(&self) -> &GridPlacement {
        &self.placement
    }

    /// Perform one unit of work
    pub fn step(&mut self) -> Resolution {
        self.propagator.step()
    }

    /// Step until decided or contradicted
    ///
    /// Reports progress at most every [`PROGRESS_INTERVAL`] and checks for
    /// cancellation before every step.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Cancelled`] when the token is cancelled.
    pub fn run(
        &mut self,
        progress: Option<&ProgressCallback>,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Resolution> {
        let mut last_report = Instant::now();
        if let Some(report) = progress {
            report(PROGRESS_PHASE, self.propagator.progress());
        }

        while self.propagator.status() == Resolution::Undecided {
            if cancellation.is_some_and(CancellationToken::is_cancelled) {
                debug!("Run with seed {} cancelled", self.seed);
                return Err(GenerationError::Cancelled);
            }
            if let Some(report) = progress
                && last_report.elapsed() >= PROGRESS_INTERVAL
            {
                last_report = Instant::now();
                report(PROGRESS_PHASE, self.propagator.progress());
            }
            self.propagator.step();
        }

        if let Some(report) = progress {
            report(PROGRESS_PHASE, self.propagator.progress());
        }
        Ok(self.propagator.status())
    }

    /// Summarise the attempt
    ///
    /// Instances are only listed for a decided run.
    pub fn completion(&self, retries: usize) -> Completion {
        let success = self.propagator.status() == Resolution::Decided;
        let topology = self.propagator.topology();
        let wave = self.propagator.wave();
        Completion {
            success,
            retries,
            backtrack_count: self.propagator.backtrack_count(),
            seed: self.seed,
            instances: if success {
                extract_instances(self.propagator.model(), topology, wave, &self.placement)
            } else {
                Vec::new()
            },
            contradiction_location: if success {
                None
            } else {
                contradiction_location(topology, wave)
            },
        }
    }
}

fn apply_initial_constraints(
    propagator: &mut Propagator,
    model: &TileModel,
    topology: &GridTopology,
    initial_constraints: &[InitialConstraint],
) {
    let mut faces = FaceConstraints {
        model,
        topology,
        seen: HashSet::new(),
        selections: Vec::new(),
    };

    for constraint in initial_constraints {
        match constraint {
            InitialConstraint::Fixed {
                faces: tile_faces,
                rotator,
                cell,
                ..
            } => {
                for face in tile_faces {
                    let (dir, details) = rotator.apply_face(face.dir, &face.details);
                    faces.add(add(*cell, rotator.multiply(face.offset)), dir, &details);
                }
            }
            InitialConstraint::Select {
                tile,
                rotation,
                cell,
            } => select_tile(propagator, model, topology, *tile, *rotation, *cell),
        }
    }

    let selections = std::mem::take(&mut faces.selections);
    for (cell, allowed) in &selections {
        propagator.select(*cell, allowed);
    }
}

fn select_tile(
    propagator: &mut Propagator,
    model: &TileModel,
    topology: &GridTopology,
    tile: TileId,
    rotation: Rotation,
    cell: Vector3,
) {
    let Some(definition) = model.tile(tile) else {
        warn!("Initial constraint names unknown tile {tile}");
        propagator.ban_many(topology.active_indices().flat_map(|c| {
            (0..model.variant_count()).map(move |v| (c, v))
        }));
        return;
    };
    for &offset in &definition.offsets {
        let target = add(cell, rotation.apply(offset));
        let Some(index) = topology.index_of(target).filter(|&i| topology.is_active(i)) else {
            continue;
        };
        let allowed = VariantSet::from_indices(
            model.variant_count(),
            model.variant_id(tile, rotation, offset),
        );
        if allowed.is_empty() {
            warn!(
                "Tile '{}' cannot take orientation {rotation}",
                definition.name
            );
        }
        propagator.select(index, &allowed);
    }
}

/// Constrain every boundary cell by the skybox face it looks at
fn apply_skybox(
    propagator: &mut Propagator,
    model: &TileModel,
    topology: &GridTopology,
    skybox: &TileDefinition,
) {
    let sky = skybox_faces(skybox);
    let mut faces = FaceConstraints {
        model,
        topology,
        seen: HashSet::new(),
        selections: Vec::new(),
    };
    let [w, h, d] = topology.size().map(|extent| extent as i32);

    // A virtual cell outside the volume facing `dir` shows the skybox face on
    // the opposite side, seen from the other side
    let mut wrap = |cell: Vector3, dir: FaceDir| {
        if let Some(Some(details)) = sky.get(dir.inverted().index()) {
            faces.add(cell, dir, &details.reflected_x());
        }
    };
    for x in 0..w {
        for y in 0..h {
            wrap([x, y, -1], FaceDir::Forward);
            wrap([x, y, d], FaceDir::Back);
        }
        for z in 0..d {
            wrap([x, -1, z], FaceDir::Up);
            wrap([x, h, z], FaceDir::Down);
        }
    }
    for y in 0..h {
        for z in 0..d {
            wrap([-1, y, z], FaceDir::Right);
            wrap([w, y, z], FaceDir::Left);
        }
    }

    let selections = std::mem::take(&mut faces.selections);
    propagator.select_many(&selections);
}

/// Ban big-tile variants whose other cells would fall outside the active grid
fn ban_big_tiles(propagator: &mut Propagator, model: &TileModel, topology: &GridTopology) {
    let mut bans: Vec<(usize, VariantId)> = Vec::new();
    for (id, variant) in model.variants().iter().enumerate() {
        let Some(tile) = model.tile(variant.tile) else {
            continue;
        };
        for dir in FaceDir::ALL {
            if !tile.contains(add(variant.offset, dir.forward())) {
                continue;
            }
            let step = variant.rotation.apply(dir.forward());
            for cell in topology.active_indices() {
                if !topology.is_active_at(add(topology.coord_of(cell), step)) {
                    bans.push((cell, id));
                }
            }
        }
    }
    // Settles even without bans, so setup always ends arc consistent
    propagator.ban_many(bans);
}
