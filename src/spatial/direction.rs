//! Face directions of the cubic grid and small integer vector helpers
//!
//! Every cell face has an outward normal (`forward`), an `up` vector and a
//! `right` vector spanning the painted 3x3 grid. `right` is always
//! `forward × up`, so two faces touching each other share `up` and have
//! opposite `right` vectors. That mirror is what the palette matching rule
//! compensates for.

use serde::{Deserialize, Serialize};

/// Integer grid vector (x, y, z)
pub type Vector3 = [i32; 3];

/// Component-wise sum of two grid vectors
pub const fn add(a: Vector3, b: Vector3) -> Vector3 {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Component-wise difference of two grid vectors
pub const fn sub(a: Vector3, b: Vector3) -> Vector3 {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

/// Dot product of two grid vectors
pub const fn dot(a: Vector3, b: Vector3) -> i32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Cross product of two grid vectors
pub const fn cross(a: Vector3, b: Vector3) -> Vector3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// One of the six faces of a grid cell, named by its outward normal
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceDir {
    /// Normal (-1, 0, 0)
    Left,
    /// Normal (1, 0, 0)
    Right,
    /// Normal (0, 1, 0)
    Up,
    /// Normal (0, -1, 0)
    Down,
    /// Normal (0, 0, 1)
    Forward,
    /// Normal (0, 0, -1)
    Back,
}

impl FaceDir {
    /// All six directions, in index order
    pub const ALL: [Self; 6] = [
        Self::Left,
        Self::Right,
        Self::Up,
        Self::Down,
        Self::Forward,
        Self::Back,
    ];

    /// The three directions pointing along a positive axis
    pub const POSITIVE: [Self; 3] = [Self::Right, Self::Up, Self::Forward];

    /// Dense index in `0..6`, usable for per-direction tables
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Outward unit normal of the face
    pub const fn forward(self) -> Vector3 {
        match self {
            Self::Left => [-1, 0, 0],
            Self::Right => [1, 0, 0],
            Self::Up => [0, 1, 0],
            Self::Down => [0, -1, 0],
            Self::Forward => [0, 0, 1],
            Self::Back => [0, 0, -1],
        }
    }

    /// Up vector of the painted grid: +Y for side faces, +Z for top and bottom
    pub const fn up(self) -> Vector3 {
        match self {
            Self::Left | Self::Right | Self::Forward | Self::Back => [0, 1, 0],
            Self::Up | Self::Down => [0, 0, 1],
        }
    }

    /// Right vector of the painted grid
    pub const fn right(self) -> Vector3 {
        cross(self.forward(), self.up())
    }

    /// The face with the opposite normal
    #[must_use]
    pub const fn inverted(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Forward => Self::Back,
            Self::Back => Self::Forward,
        }
    }

    /// Direction whose normal equals `v`, if `v` is an axis unit vector
    pub const fn from_vector(v: Vector3) -> Option<Self> {
        match v {
            [-1, 0, 0] => Some(Self::Left),
            [1, 0, 0] => Some(Self::Right),
            [0, 1, 0] => Some(Self::Up),
            [0, -1, 0] => Some(Self::Down),
            [0, 0, 1] => Some(Self::Forward),
            [0, 0, -1] => Some(Self::Back),
            _ => None,
        }
    }
}

impl std::fmt::Display for FaceDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
            Self::Forward => "forward",
            Self::Back => "back",
        };
        f.write_str(name)
    }
}
