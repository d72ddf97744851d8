//! Destinations for placed tiles and serialised results

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::algorithm::completion::{Completion, TileInstance};
use crate::io::error::{GenerationError, Result};
use crate::spatial::direction::Vector3;
use crate::spatial::transform::Rotation;

/// Receives placed tiles from a generator
pub trait TileOutput {
    /// Remove everything shown so far
    fn clear_tiles(&mut self);

    /// Show new tiles, replacing any tile that covered the same cells
    fn update_tiles(&mut self, instances: &[TileInstance]);

    /// Remove tiles covering any of the cells
    ///
    /// Only called on outputs that support incremental updates.
    fn clear_cells(&mut self, cells: &[Vector3]) {
        let _ = cells;
    }

    /// Whether nothing is shown
    fn is_empty(&self) -> bool;

    /// Whether tiles can be replaced one at a time as generation proceeds
    fn supports_incremental(&self) -> bool;
}

/// In-memory output keeping one tile per covered cell
#[derive(Debug, Default, Clone)]
pub struct InstanceCollector {
    slots: Vec<Option<TileInstance>>,
    by_cell: HashMap<Vector3, usize>,
}

impl InstanceCollector {
    /// An empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Tiles currently held, in insertion order
    pub fn instances(&self) -> impl Iterator<Item = &TileInstance> {
        self.slots.iter().flatten()
    }

    /// Number of tiles currently held
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Whether no tile is held
    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }

    /// Tile covering a cell
    pub fn at(&self, cell: Vector3) -> Option<&TileInstance> {
        self.by_cell
            .get(&cell)
            .and_then(|&slot| self.slots.get(slot))
            .and_then(Option::as_ref)
    }

    fn remove_at(&mut self, cell: Vector3) {
        let Some(slot) = self.by_cell.get(&cell).copied() else {
            return;
        };
        if let Some(instance) = self.slots.get_mut(slot).and_then(Option::take) {
            for covered in &instance.cells {
                self.by_cell.remove(covered);
            }
        }
    }
}

impl TileOutput for InstanceCollector {
    fn clear_tiles(&mut self) {
        self.slots.clear();
        self.by_cell.clear();
    }

    fn update_tiles(&mut self, instances: &[TileInstance]) {
        for instance in instances {
            for &cell in &instance.cells {
                self.remove_at(cell);
            }
            let slot = self.slots.len();
            for &cell in &instance.cells {
                self.by_cell.insert(cell, slot);
            }
            self.slots.push(Some(instance.clone()));
        }
    }

    fn clear_cells(&mut self, cells: &[Vector3]) {
        for &cell in cells {
            self.remove_at(cell);
        }
    }

    fn is_empty(&self) -> bool {
        Self::is_empty(self)
    }

    fn supports_incremental(&self) -> bool {
        true
    }
}

/// Output handing each placed tile to a callback
pub struct ForEachOutput<F: FnMut(&TileInstance)> {
    callback: F,
    received: usize,
}

impl<F: FnMut(&TileInstance)> ForEachOutput<F> {
    /// Call `callback` for every placed tile
    pub const fn new(callback: F) -> Self {
        Self {
            callback,
            received: 0,
        }
    }

    /// Tiles passed to the callback so far
    pub const fn received(&self) -> usize {
        self.received
    }
}

impl<F: FnMut(&TileInstance)> TileOutput for ForEachOutput<F> {
    fn clear_tiles(&mut self) {
        self.received = 0;
    }

    fn update_tiles(&mut self, instances: &[TileInstance]) {
        for instance in instances {
            (self.callback)(instance);
            self.received += 1;
        }
    }

    fn is_empty(&self) -> bool {
        self.received == 0
    }

    fn supports_incremental(&self) -> bool {
        false
    }
}

/// Serialised form of a placed tile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    /// Tile name
    pub tile: String,
    /// Orientation of the tile
    pub rotation: Rotation,
    /// World position of the tile's origin
    pub position: [f64; 3],
    /// Clockwise rotation about +Y in degrees
    pub yaw_degrees: f64,
    /// World scale
    pub scale: [f64; 3],
    /// Covered grid cells
    pub cells: Vec<Vector3>,
}

impl From<&TileInstance> for InstanceRecord {
    fn from(instance: &TileInstance) -> Self {
        Self {
            tile: instance.tile.name.clone(),
            rotation: instance.rotation,
            position: instance.position,
            yaw_degrees: instance.yaw_degrees,
            scale: instance.scale,
            cells: instance.cells.clone(),
        }
    }
}

/// Serialised form of a [`Completion`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompletionReport {
    /// Whether every active cell was decided
    pub success: bool,
    /// Attempts made after the first
    pub retries: usize,
    /// Decisions undone in the final attempt
    pub backtrack_count: usize,
    /// Seed of the final attempt
    pub seed: u64,
    /// First cell left without any variant
    pub contradiction_location: Option<Vector3>,
    /// Placed tiles
    pub instances: Vec<InstanceRecord>,
}

impl From<&Completion> for CompletionReport {
    fn from(completion: &Completion) -> Self {
        Self {
            success: completion.success,
            retries: completion.retries,
            backtrack_count: completion.backtrack_count,
            seed: completion.seed,
            contradiction_location: completion.contradiction_location,
            instances: completion.instances.iter().map(InstanceRecord::from).collect(),
        }
    }
}

/// Write a completion as pretty-printed JSON
///
/// # Errors
///
/// Returns a file system error if the file cannot be created, or a parse
/// error if serialisation fails.
pub fn write_completion_json(path: &Path, completion: &Completion) -> Result<()> {
    let file = File::create(path).map_err(|source| GenerationError::FileSystem {
        path: path.to_path_buf(),
        operation: "create result file",
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), &CompletionReport::from(completion))
        .map_err(|source| GenerationError::Parse {
            path: path.to_path_buf(),
            source,
        })
}
