//! Cubic grid volume with an occupancy mask
//!
//! Cells are addressed either by `[x, y, z]` coordinates or by a linear index
//! `x + y * width + z * width * height`. Masked-out cells keep their index but
//! take no part in generation.

use ndarray::Array3;

use crate::spatial::direction::{FaceDir, Vector3, add};

/// Grid dimensions plus the mask of participating cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridTopology {
    size: [usize; 3],
    /// Indexed `[z, y, x]`
    mask: Array3<bool>,
}

impl GridTopology {
    /// Fully active grid of `[width, height, depth]` cells
    pub fn new(size: [usize; 3]) -> Self {
        let [w, h, d] = size;
        Self {
            size,
            mask: Array3::from_elem((d, h, w), true),
        }
    }

    /// Grid whose active cells are given by a `[z, y, x]` mask
    pub fn from_mask(mask: Array3<bool>) -> Self {
        let (d, h, w) = mask.dim();
        Self {
            size: [w, h, d],
            mask,
        }
    }

    /// `[width, height, depth]`
    pub const fn size(&self) -> [usize; 3] {
        self.size
    }

    /// Cells along X
    pub const fn width(&self) -> usize {
        self.size[0]
    }

    /// Cells along Y
    pub const fn height(&self) -> usize {
        self.size[1]
    }

    /// Cells along Z
    pub const fn depth(&self) -> usize {
        self.size[2]
    }

    /// Total number of cells, masked or not
    pub const fn len(&self) -> usize {
        self.size[0] * self.size[1] * self.size[2]
    }

    /// Whether the grid has no cells
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a coordinate lies inside the volume
    pub fn in_bounds(&self, cell: Vector3) -> bool {
        cell.iter()
            .zip(self.size)
            .all(|(&c, extent)| c >= 0 && (c as usize) < extent)
    }

    /// Linear index of a coordinate, or `None` outside the volume
    pub fn index_of(&self, cell: Vector3) -> Option<usize> {
        if !self.in_bounds(cell) {
            return None;
        }
        let [x, y, z] = cell.map(|c| c as usize);
        Some(x + y * self.width() + z * self.width() * self.height())
    }

    /// Coordinate of a linear index
    ///
    /// # Panics
    ///
    /// Debug builds panic when `index` is outside the grid.
    pub fn coord_of(&self, index: usize) -> Vector3 {
        debug_assert!(index < self.len(), "cell index {index} outside grid");
        let (w, h) = (self.width().max(1), self.height().max(1));
        [
            (index % w) as i32,
            ((index / w) % h) as i32,
            (index / (w * h)) as i32,
        ]
    }

    /// Whether the cell at a linear index participates in generation
    pub fn is_active(&self, index: usize) -> bool {
        self.is_active_at(self.coord_of(index))
    }

    /// Whether a coordinate is inside the volume and not masked out
    pub fn is_active_at(&self, cell: Vector3) -> bool {
        self.in_bounds(cell)
            && self
                .mask
                .get([cell[2] as usize, cell[1] as usize, cell[0] as usize])
                .copied()
                .unwrap_or(false)
    }

    /// Include or exclude a cell; coordinates outside the volume are ignored
    pub fn set_active(&mut self, cell: Vector3, active: bool) {
        if !self.in_bounds(cell) {
            return;
        }
        if let Some(slot) = self
            .mask
            .get_mut([cell[2] as usize, cell[1] as usize, cell[0] as usize])
        {
            *slot = active;
        }
    }

    /// Active neighbour of a cell across one face
    pub fn neighbor(&self, index: usize, dir: FaceDir) -> Option<usize> {
        let next = add(self.coord_of(index), dir.forward());
        if self.is_active_at(next) {
            self.index_of(next)
        } else {
            None
        }
    }

    /// Linear indices of every active cell, in increasing order
    pub fn active_indices(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len()).filter(|&i| self.is_active(i))
    }

    /// Number of active cells
    pub fn active_count(&self) -> usize {
        self.mask.iter().filter(|active| **active).count()
    }
}
