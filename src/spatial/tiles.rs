//! Tile definitions and their editing operations
//!
//! A tile occupies one or more grid cells, given as integer offsets from its
//! origin cell. Every outward face of every occupied cell carries a painted
//! [`FaceDetails`]; faces between two cells of the same tile are internal and
//! carry nothing.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::spatial::direction::{FaceDir, Vector3, add};
use crate::spatial::faces::{FaceDetails, OrientedFace};

/// A catalogue entry describing one placeable tile
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileDefinition {
    /// Unique name within a catalogue
    pub name: String,
    /// Occupied cells relative to the origin cell
    #[serde(default = "origin_only")]
    pub offsets: Vec<Vector3>,
    /// Painted outward faces
    #[serde(default)]
    pub faces: Vec<OrientedFace>,
    /// Whether quarter turns about the vertical axis are allowed
    #[serde(default = "enabled")]
    pub rotatable: bool,
    /// Whether mirror images are allowed
    #[serde(default = "enabled")]
    pub reflectable: bool,
    /// Relative frequency, must be positive
    #[serde(default = "unit_weight")]
    pub weight: f64,
    /// Local position of the centre of the origin cell
    #[serde(default)]
    pub center: [f64; 3],
    /// Cell size the tile was authored for
    #[serde(default = "unit_size")]
    pub tile_size: [f64; 3],
}

fn origin_only() -> Vec<Vector3> {
    vec![[0, 0, 0]]
}

const fn enabled() -> bool {
    true
}

const fn unit_weight() -> f64 {
    1.0
}

const fn unit_size() -> [f64; 3] {
    [1.0, 1.0, 1.0]
}

impl TileDefinition {
    /// Single-cell tile with every face unpainted
    pub fn new(name: impl Into<String>) -> Self {
        Self::cube(name, FaceDetails::default())
    }

    /// Single-cell tile with every face painted the same way
    pub fn cube(name: impl Into<String>, details: FaceDetails) -> Self {
        let mut tile = Self {
            name: name.into(),
            offsets: origin_only(),
            faces: Vec::new(),
            rotatable: true,
            reflectable: true,
            weight: 1.0,
            center: [0.0; 3],
            tile_size: unit_size(),
        };
        for dir in FaceDir::ALL {
            tile.faces.push(OrientedFace {
                offset: [0, 0, 0],
                dir,
                details,
            });
        }
        tile
    }

    /// Builder form of [`set_face`](Self::set_face)
    #[must_use]
    pub fn with_face(mut self, offset: Vector3, dir: FaceDir, details: FaceDetails) -> Self {
        self.set_face(offset, dir, details);
        self
    }

    /// Builder setting the relative weight
    #[must_use]
    pub const fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Builder setting which symmetries the tile may use
    #[must_use]
    pub const fn with_symmetry(mut self, rotatable: bool, reflectable: bool) -> Self {
        self.rotatable = rotatable;
        self.reflectable = reflectable;
        self
    }

    /// Whether `offset` is one of the tile's cells
    pub fn contains(&self, offset: Vector3) -> bool {
        self.offsets.contains(&offset)
    }

    /// Whether the face at `offset` in `dir` borders another cell of this tile
    pub fn is_internal(&self, offset: Vector3, dir: FaceDir) -> bool {
        self.contains(add(offset, dir.forward()))
    }

    /// Paint of one face, if the face exists
    pub fn face(&self, offset: Vector3, dir: FaceDir) -> Option<&FaceDetails> {
        self.faces
            .iter()
            .find(|f| f.offset == offset && f.dir == dir)
            .map(|f| &f.details)
    }

    /// Paint of one face, treating unpainted outward faces as blank
    pub fn try_face(&self, offset: Vector3, dir: FaceDir) -> Option<FaceDetails> {
        if !self.contains(offset) || self.is_internal(offset, dir) {
            return None;
        }
        Some(self.face(offset, dir).copied().unwrap_or_default())
    }

    /// Mutable paint of one face, if the face exists
    pub fn face_mut(&mut self, offset: Vector3, dir: FaceDir) -> Option<&mut FaceDetails> {
        self.faces
            .iter_mut()
            .find(|f| f.offset == offset && f.dir == dir)
            .map(|f| &mut f.details)
    }

    /// Paint one outward face
    ///
    /// Returns `false` and changes nothing when `offset` is not occupied or the
    /// face is internal to the tile.
    pub fn set_face(&mut self, offset: Vector3, dir: FaceDir, details: FaceDetails) -> bool {
        if !self.contains(offset) || self.is_internal(offset, dir) {
            return false;
        }
        if let Some(existing) = self.face_mut(offset, dir) {
            *existing = details;
        } else {
            self.faces.push(OrientedFace {
                offset,
                dir,
                details,
            });
        }
        true
    }

    /// Occupy another cell, keeping the face list consistent
    ///
    /// The new cell gets blank outward faces and faces of neighbours that now
    /// touch it are dropped. Returns `false` if the cell was already occupied.
    pub fn add_offset(&mut self, offset: Vector3) -> bool {
        if self.contains(offset) {
            return false;
        }
        self.offsets.push(offset);
        self.faces.retain(|f| add(f.offset, f.dir.forward()) != offset);
        for dir in FaceDir::ALL {
            if !self.is_internal(offset, dir) {
                self.faces.push(OrientedFace {
                    offset,
                    dir,
                    details: FaceDetails::default(),
                });
            }
        }
        true
    }

    /// Release a cell, keeping the face list consistent
    ///
    /// Neighbouring cells gain blank faces where they touched the removed cell.
    /// The last remaining cell cannot be removed.
    pub fn remove_offset(&mut self, offset: Vector3) -> bool {
        if !self.contains(offset) || self.offsets.len() <= 1 {
            return false;
        }
        self.offsets.retain(|o| *o != offset);
        self.faces.retain(|f| f.offset != offset);
        for dir in FaceDir::ALL {
            let neighbor = add(offset, dir.forward());
            if self.contains(neighbor) {
                self.faces.push(OrientedFace {
                    offset: neighbor,
                    dir: dir.inverted(),
                    details: FaceDetails::default(),
                });
            }
        }
        true
    }

    /// Every outward face, with blank paint where none was given
    pub fn external_faces(&self) -> impl Iterator<Item = OrientedFace> + '_ {
        self.offsets.iter().flat_map(move |&offset| {
            FaceDir::ALL.into_iter().filter_map(move |dir| {
                self.try_face(offset, dir).map(|details| OrientedFace {
                    offset,
                    dir,
                    details,
                })
            })
        })
    }

    /// Component-wise minimum and maximum occupied offsets
    pub fn bounds(&self) -> (Vector3, Vector3) {
        let mut min = [i32::MAX; 3];
        let mut max = [i32::MIN; 3];
        for offset in &self.offsets {
            for ((lo, hi), v) in min.iter_mut().zip(max.iter_mut()).zip(offset) {
                *lo = (*lo).min(*v);
                *hi = (*hi).max(*v);
            }
        }
        if self.offsets.is_empty() {
            return ([0; 3], [0; 3]);
        }
        (min, max)
    }

    /// Whether every occupied cell is reachable from every other through faces
    pub fn is_contiguous(&self) -> bool {
        let Some(&start) = self.offsets.first() else {
            return false;
        };
        let occupied: HashSet<Vector3> = self.offsets.iter().copied().collect();
        let mut seen = HashSet::from([start]);
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            for dir in FaceDir::ALL {
                let next = add(current, dir.forward());
                if occupied.contains(&next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        seen.len() == occupied.len()
    }

    /// Whether the tile spans more than one cell
    pub const fn is_big(&self) -> bool {
        self.offsets.len() > 1
    }
}
