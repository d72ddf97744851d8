//! Paint colours and the rule deciding which colours may touch

use serde::{Deserialize, Serialize};

use crate::spatial::faces::FaceDetails;

/// A named paint colour
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteEntry {
    /// Display name
    pub name: String,
    /// RGBA colour, used for image export
    #[serde(default = "opaque_white")]
    pub color: [u8; 4],
}

const fn opaque_white() -> [u8; 4] {
    [255, 255, 255, 255]
}

/// Paint colours plus a symmetric compatibility matrix
///
/// By default index 0 is a wildcard matching everything, and every other
/// colour matches only itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    entries: Vec<PaletteEntry>,
    matches: Vec<bool>,
}

impl Default for Palette {
    fn default() -> Self {
        let entries = vec![
            PaletteEntry {
                name: "empty".into(),
                color: [0, 0, 0, 0],
            },
            PaletteEntry {
                name: "red".into(),
                color: [220, 60, 60, 255],
            },
            PaletteEntry {
                name: "green".into(),
                color: [60, 200, 80, 255],
            },
            PaletteEntry {
                name: "blue".into(),
                color: [60, 90, 220, 255],
            },
        ];
        Self::new(entries)
    }
}

impl Palette {
    /// Palette with the default matching rule over the given entries
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        let n = entries.len();
        let matches = (0..n * n)
            .map(|i| {
                let (a, b) = (i / n, i % n);
                a == 0 || b == 0 || a == b
            })
            .collect();
        Self { entries, matches }
    }

    /// Colour entries in index order
    pub fn entries(&self) -> &[PaletteEntry] {
        &self.entries
    }

    /// Number of colours
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the palette has no colours
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn slot(&self, a: u8, b: u8) -> Option<usize> {
        let n = self.entries.len();
        let (a, b) = (usize::from(a), usize::from(b));
        (a < n && b < n).then_some(a * n + b)
    }

    /// Whether two colours may touch
    ///
    /// Indices outside the palette only match themselves.
    pub fn matches_color(&self, a: u8, b: u8) -> bool {
        self.slot(a, b)
            .and_then(|i| self.matches.get(i).copied())
            .unwrap_or(a == b)
    }

    /// Allow or forbid two colours touching; the rule is kept symmetric
    pub fn set_match(&mut self, a: u8, b: u8, allowed: bool) {
        for (p, q) in [(a, b), (b, a)] {
            if let Some(cell) = self.slot(p, q).and_then(|i| self.matches.get_mut(i)) {
                *cell = allowed;
            }
        }
    }

    /// Whether two faces placed against each other are compatible
    ///
    /// Facing surfaces see each other mirrored, so `a` at `(x, y)` is
    /// compared with `b` at `(-x, y)`.
    pub fn matches(&self, a: &FaceDetails, b: &FaceDetails) -> bool {
        a.iter().all(|(x, y, color)| {
            b.get(-x, y)
                .is_some_and(|other| self.matches_color(color, other))
        })
    }
}
