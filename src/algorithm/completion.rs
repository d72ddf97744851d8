//! Turning decided domains into placed tiles

use std::sync::Arc;

use crate::algorithm::domain::Wave;
use crate::algorithm::model::{TileId, TileModel, VariantId};
use crate::spatial::direction::{Vector3, add, sub};
use crate::spatial::tiles::TileDefinition;
use crate::spatial::topology::GridTopology;
use crate::spatial::transform::Rotation;

/// Where the grid sits in world space
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPlacement {
    /// World position of the centre of the volume
    pub center: [f64; 3],
    /// Distance between neighbouring cell centres
    pub cell_size: [f64; 3],
    /// `[width, height, depth]` in cells
    pub size: [usize; 3],
}

impl GridPlacement {
    /// World position of a cell centre
    pub fn cell_center(&self, cell: Vector3) -> [f64; 3] {
        std::array::from_fn(|axis| {
            let (center, stride, extent, c) = self.axis(axis, cell);
            (c as f64).mul_add(stride, center - (extent as f64 - 1.0) * stride / 2.0)
        })
    }

    fn axis(&self, axis: usize, cell: Vector3) -> (f64, f64, usize, i32) {
        (
            self.center.get(axis).copied().unwrap_or(0.0),
            self.cell_size.get(axis).copied().unwrap_or(1.0),
            self.size.get(axis).copied().unwrap_or(1),
            cell.get(axis).copied().unwrap_or(0),
        )
    }

    /// Cell holding the origin of `tile` placed at `position` with `rotation`
    ///
    /// Returns `None` unless the placement lines up with a cell centre inside
    /// the volume.
    pub fn cell_at(
        &self,
        tile: &TileDefinition,
        position: [f64; 3],
        rotation: Rotation,
    ) -> Option<Vector3> {
        let local_center = rotation.apply_point(tile.center);
        let origin_center: [f64; 3] = std::array::from_fn(|axis| {
            position.get(axis).copied().unwrap_or(0.0) + local_center.get(axis).copied().unwrap_or(0.0)
        });

        let mut cell = [0; 3];
        for (axis, slot) in cell.iter_mut().enumerate() {
            let (center, stride, extent, _) = self.axis(axis, [0; 3]);
            if stride <= 0.0 {
                return None;
            }
            let first = center - (extent as f64 - 1.0) * stride / 2.0;
            let exact = (origin_center.get(axis).copied().unwrap_or(0.0) - first) / stride;
            let rounded = exact.round();
            if (exact - rounded).abs() > 1e-3 {
                return None;
            }
            *slot = rounded as i32;
        }

        let in_range = cell
            .iter()
            .zip(self.size)
            .all(|(&c, extent)| c >= 0 && (c as usize) < extent);
        in_range.then_some(cell)
    }
}

/// One placed tile
#[derive(Clone, Debug, PartialEq)]
pub struct TileInstance {
    /// Id of the tile in the model
    pub tile_id: TileId,
    /// The tile itself
    pub tile: Arc<TileDefinition>,
    /// Orientation of the tile
    pub rotation: Rotation,
    /// World position of the tile's local origin
    pub position: [f64; 3],
    /// Clockwise rotation about +Y in degrees, seen from above
    pub yaw_degrees: f64,
    /// World scale; X is negated for reflected tiles
    pub scale: [f64; 3],
    /// Grid cells covered by the tile
    pub cells: Vec<Vector3>,
}

/// Result of generation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Completion {
    /// Whether every active cell was decided
    pub success: bool,
    /// Attempts made after the first
    pub retries: usize,
    /// Decisions undone during the final attempt
    pub backtrack_count: usize,
    /// Seed of the final attempt
    pub seed: u64,
    /// Placed tiles; empty on failure
    pub instances: Vec<TileInstance>,
    /// First cell left without any variant, on failure
    pub contradiction_location: Option<Vector3>,
}

/// Place the tile whose `variant` was decided at `cell`
pub fn tile_instance(
    model: &TileModel,
    placement: &GridPlacement,
    cell: Vector3,
    variant: VariantId,
) -> Option<TileInstance> {
    let variant = model.variant(variant)?;
    let tile = model.tile(variant.tile)?;
    let rotation = variant.rotation;

    let cells = tile
        .offsets
        .iter()
        .map(|&offset| add(cell, rotation.apply(sub(offset, variant.offset))))
        .collect();

    let anchor: [f64; 3] = std::array::from_fn(|axis| {
        let center = tile.center.get(axis).copied().unwrap_or(0.0);
        let stride = tile.tile_size.get(axis).copied().unwrap_or(1.0);
        let offset = variant.offset.get(axis).copied().unwrap_or(0);
        stride.mul_add(offset as f64, center)
    });
    let rotated = rotation.apply_point(anchor);
    let world = placement.cell_center(cell);
    let position = std::array::from_fn(|axis| {
        world.get(axis).copied().unwrap_or(0.0) - rotated.get(axis).copied().unwrap_or(0.0)
    });

    Some(TileInstance {
        tile_id: variant.tile,
        tile: Arc::clone(tile),
        rotation,
        position,
        yaw_degrees: f64::from(rotation.degrees()),
        scale: if rotation.rotator().is_reflection() {
            [-1.0, 1.0, 1.0]
        } else {
            [1.0, 1.0, 1.0]
        },
        cells,
    })
}

/// Emit one instance per placed tile, in cell order
///
/// A big tile is emitted from the first of its cells reached, and its other
/// cells are skipped. Undecided cells are ignored.
pub fn extract_instances(
    model: &TileModel,
    topology: &GridTopology,
    wave: &Wave,
    placement: &GridPlacement,
) -> Vec<TileInstance> {
    let mut claimed = vec![false; topology.len()];
    let mut instances = Vec::new();

    for cell in topology.active_indices() {
        if claimed.get(cell).copied().unwrap_or(true) {
            continue;
        }
        let Some(variant) = wave.single(cell) else {
            continue;
        };
        let Some(instance) = tile_instance(model, placement, topology.coord_of(cell), variant)
        else {
            continue;
        };
        for covered in &instance.cells {
            if let Some(slot) = topology.index_of(*covered).and_then(|i| claimed.get_mut(i)) {
                *slot = true;
            }
        }
        instances.push(instance);
    }

    instances
}

/// First active cell whose domain is empty
pub fn contradiction_location(topology: &GridTopology, wave: &Wave) -> Option<Vector3> {
    topology
        .active_indices()
        .find(|&cell| wave.remaining(cell) == 0)
        .map(|cell| topology.coord_of(cell))
}
