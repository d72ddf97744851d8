//! Orientation of tiles on the grid
//!
//! [`Rotation`] covers the symmetries a tile variant may use: quarter turns
//! about the vertical axis, optionally preceded by a reflection in X.
//! [`CellRotator`] is a general orthogonal integer matrix, used for placed
//! tiles whose orientation comes from outside the generator.

use serde::{Deserialize, Serialize};

use crate::spatial::direction::{FaceDir, Vector3, dot};
use crate::spatial::faces::FaceDetails;

/// Quarter turns clockwise about +Y (viewed from above), after an optional X reflection
///
/// The turn count is always below 4, so equal orientations compare equal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RotationFields")]
pub struct Rotation {
    quarter_turns: u8,
    reflect_x: bool,
}

/// Catalogue form of a [`Rotation`], before the turn count is normalised
#[derive(Deserialize)]
struct RotationFields {
    #[serde(default)]
    quarter_turns: u8,
    #[serde(default)]
    reflect_x: bool,
}

impl From<RotationFields> for Rotation {
    fn from(fields: RotationFields) -> Self {
        Self::new(fields.quarter_turns, fields.reflect_x)
    }
}

impl Rotation {
    /// The identity orientation
    pub const IDENTITY: Self = Self {
        quarter_turns: 0,
        reflect_x: false,
    };

    /// Create a rotation, normalising the turn count
    pub const fn new(quarter_turns: u8, reflect_x: bool) -> Self {
        Self {
            quarter_turns: quarter_turns % 4,
            reflect_x,
        }
    }

    /// Number of clockwise quarter turns, from 0 to 3
    pub const fn quarter_turns(self) -> u8 {
        self.quarter_turns
    }

    /// Whether X is negated before turning
    pub const fn reflect_x(self) -> bool {
        self.reflect_x
    }

    /// Clockwise rotation in degrees (0, 90, 180 or 270)
    pub fn degrees(self) -> u16 {
        u16::from(self.quarter_turns) * 90
    }

    /// Enumerate the orientations a tile may take
    ///
    /// The identity always comes first; unrotated reflections follow the
    /// rotations when both are permitted.
    pub fn group(rotatable: bool, reflectable: bool) -> Vec<Self> {
        let turns = if rotatable { 4 } else { 1 };
        let reflections: &[bool] = if reflectable {
            &[false, true]
        } else {
            &[false]
        };

        reflections
            .iter()
            .flat_map(|&reflect_x| (0..turns).map(move |turn| Self::new(turn, reflect_x)))
            .collect()
    }

    /// Apply the orientation to an integer vector
    pub const fn apply(self, v: Vector3) -> Vector3 {
        let mut x = if self.reflect_x { -v[0] } else { v[0] };
        let mut z = v[2];
        let mut turn = 0;
        while turn < self.quarter_turns {
            let rotated_x = z;
            z = -x;
            x = rotated_x;
            turn += 1;
        }
        [x, v[1], z]
    }

    /// Apply the orientation to a real-valued point
    pub fn apply_point(self, p: [f64; 3]) -> [f64; 3] {
        let mut x = if self.reflect_x { -p[0] } else { p[0] };
        let mut z = p[2];
        for _ in 0..self.quarter_turns {
            let rotated_x = z;
            z = -x;
            x = rotated_x;
        }
        [x, p[1], z]
    }

    /// Rotate a face direction
    pub fn apply_dir(self, dir: FaceDir) -> FaceDir {
        self.rotator().apply_dir(dir)
    }

    /// Matrix form of this orientation
    pub const fn rotator(self) -> CellRotator {
        let x = self.apply([1, 0, 0]);
        let y = self.apply([0, 1, 0]);
        let z = self.apply([0, 0, 1]);
        CellRotator {
            rows: [[x[0], y[0], z[0]], [x[1], y[1], z[1]], [x[2], y[2], z[2]]],
        }
    }
}

impl std::fmt::Display for Rotation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reflect_x {
            write!(f, "{}° reflected", self.degrees())
        } else {
            write!(f, "{}°", self.degrees())
        }
    }
}

/// Orthogonal 3x3 integer matrix mapping tile-local vectors to grid vectors
///
/// Always one of the 48 symmetries of a cube, so axis vectors map to axis
/// vectors and distances are preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "[[i32; 3]; 3]", into = "[[i32; 3]; 3]")]
pub struct CellRotator {
    rows: [[i32; 3]; 3],
}

impl Default for CellRotator {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl CellRotator {
    /// The identity matrix
    pub const IDENTITY: Self = Self {
        rows: [[1, 0, 0], [0, 1, 0], [0, 0, 1]],
    };

    /// Validate a row-major matrix as a cube symmetry
    ///
    /// Returns `None` unless every row and every column holds exactly one
    /// non-zero entry equal to ±1.
    pub fn from_rows(rows: [[i32; 3]; 3]) -> Option<Self> {
        let [a, b, c] = rows;
        let columns = [
            [a[0], b[0], c[0]],
            [a[1], b[1], c[1]],
            [a[2], b[2], c[2]],
        ];
        let orthogonal = rows.iter().chain(columns.iter()).all(|v| is_signed_unit(*v));
        orthogonal.then_some(Self { rows })
    }

    /// Row-major entries
    pub const fn rows(&self) -> [[i32; 3]; 3] {
        self.rows
    }

    /// Multiply a vector by the matrix
    pub const fn multiply(&self, v: Vector3) -> Vector3 {
        [
            dot(self.rows[0], v),
            dot(self.rows[1], v),
            dot(self.rows[2], v),
        ]
    }

    /// Whether the matrix flips handedness
    pub const fn is_reflection(&self) -> bool {
        let r = self.rows;
        let det = r[0][0] * (r[1][1] * r[2][2] - r[1][2] * r[2][1])
            - r[0][1] * (r[1][0] * r[2][2] - r[1][2] * r[2][0])
            + r[0][2] * (r[1][0] * r[2][1] - r[1][1] * r[2][0]);
        det < 0
    }

    /// Rotate a face direction
    pub fn apply_dir(&self, dir: FaceDir) -> FaceDir {
        // Cube symmetries send axis vectors to axis vectors
        FaceDir::from_vector(self.multiply(dir.forward())).unwrap_or(dir)
    }

    /// Rotate a painted face, returning its new direction and repositioned paint
    ///
    /// Each painted point is placed in space using the face's own right/up
    /// frame, rotated, and read back in the frame of the rotated face.
    pub fn apply_face(&self, dir: FaceDir, details: &FaceDetails) -> (FaceDir, FaceDetails) {
        let rotated_dir = self.apply_dir(dir);
        let (right, up) = (dir.right(), dir.up());
        let (new_right, new_up) = (rotated_dir.right(), rotated_dir.up());

        let mut rotated = FaceDetails::default();
        for (x, y, color) in details.iter() {
            let point = [
                x * right[0] + y * up[0],
                x * right[1] + y * up[1],
                x * right[2] + y * up[2],
            ];
            let moved = self.multiply(point);
            rotated.set(dot(moved, new_right), dot(moved, new_up), color);
        }
        (rotated_dir, rotated)
    }
}

impl From<Rotation> for CellRotator {
    fn from(rotation: Rotation) -> Self {
        rotation.rotator()
    }
}

impl TryFrom<[[i32; 3]; 3]> for CellRotator {
    type Error = String;

    fn try_from(rows: [[i32; 3]; 3]) -> Result<Self, Self::Error> {
        Self::from_rows(rows).ok_or_else(|| format!("{rows:?} is not a symmetry of the cube"))
    }
}

impl From<CellRotator> for [[i32; 3]; 3] {
    fn from(rotator: CellRotator) -> Self {
        rotator.rows
    }
}

fn is_signed_unit(v: Vector3) -> bool {
    v.iter().filter(|c| **c != 0).count() == 1 && v.iter().all(|c| c.abs() <= 1)
}
