//! Painted faces
//!
//! Each face is painted as a 3x3 grid addressed by `(x, y)` in `-1..=1`,
//! where `x` runs along the face's right vector and `y` along its up vector.

use serde::{Deserialize, Serialize};

use crate::spatial::direction::{FaceDir, Vector3};

/// 3x3 palette indices painted on one cell face
///
/// Stored row by row starting from the top-left corner. In catalogue files
/// a face is written either as nine indices or as a single index painting
/// the whole face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PaintSource", into = "[u8; 9]")]
pub struct FaceDetails {
    paint: [u8; 9],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PaintSource {
    Uniform(u8),
    Grid([u8; 9]),
}

impl From<PaintSource> for FaceDetails {
    fn from(source: PaintSource) -> Self {
        match source {
            PaintSource::Uniform(color) => Self::uniform(color),
            PaintSource::Grid(paint) => Self::new(paint),
        }
    }
}

impl From<FaceDetails> for [u8; 9] {
    fn from(details: FaceDetails) -> Self {
        details.paint
    }
}

const fn slot(x: i32, y: i32) -> Option<usize> {
    if x < -1 || x > 1 || y < -1 || y > 1 {
        return None;
    }
    Some(((x + 1) + (1 - y) * 3) as usize)
}

impl FaceDetails {
    /// Face painted entirely with one palette index
    pub const fn uniform(color: u8) -> Self {
        Self { paint: [color; 9] }
    }

    /// Face from nine indices, top-left first, row by row
    pub const fn new(paint: [u8; 9]) -> Self {
        Self { paint }
    }

    /// Raw indices, top-left first
    pub const fn paint(&self) -> [u8; 9] {
        self.paint
    }

    /// Palette index at `(x, y)`, or `None` outside `-1..=1`
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        slot(x, y).and_then(|i| self.paint.get(i).copied())
    }

    /// Paint `(x, y)`; coordinates outside `-1..=1` are ignored
    pub fn set(&mut self, x: i32, y: i32, color: u8) {
        if let Some(cell) = slot(x, y).and_then(|i| self.paint.get_mut(i)) {
            *cell = color;
        }
    }

    /// Every painted point as `(x, y, color)`
    pub fn iter(&self) -> impl Iterator<Item = (i32, i32, u8)> + '_ {
        (-1..=1).rev().flat_map(move |y| {
            (-1..=1).filter_map(move |x| self.get(x, y).map(|color| (x, y, color)))
        })
    }

    /// Mirror image across the vertical centre line
    #[must_use]
    pub fn reflected_x(&self) -> Self {
        let mut reflected = Self::default();
        for (x, y, color) in self.iter() {
            reflected.set(-x, y, color);
        }
        reflected
    }
}

/// A face of one cell of a tile, after any orientation has been applied
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrientedFace {
    /// Cell of the tile the face belongs to
    pub offset: Vector3,
    /// Outward direction of the face
    pub dir: FaceDir,
    /// Paint on the face
    pub details: FaceDetails,
}
