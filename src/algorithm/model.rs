//! Tile model: oriented variants and the adjacency rules between them
//!
//! Every tile is expanded into one variant per (orientation, occupied cell).
//! Two variants may sit next to each other in a direction when they are
//! neighbouring cells of the same oriented tile, or when their outward faces
//! in that direction and its opposite are accepted by the palette.

use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::algorithm::bitset::VariantSet;
use crate::io::error::{Result, configuration_error, invalid_parameter};
use crate::spatial::direction::{FaceDir, Vector3, add};
use crate::spatial::faces::FaceDetails;
use crate::spatial::palette::Palette;
use crate::spatial::tiles::TileDefinition;
use crate::spatial::transform::Rotation;

/// Index of an accepted tile in a [`TileModel`]
pub type TileId = usize;

/// Index of a variant in a [`TileModel`]
pub type VariantId = usize;

/// One orientation of one cell of a tile
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileVariant {
    /// Tile the variant belongs to
    pub tile: TileId,
    /// Orientation applied to the whole tile
    pub rotation: Rotation,
    /// Cell of the tile, in the tile's own unrotated frame
    pub offset: Vector3,
}

/// Outward faces of every variant, grouped by their oriented direction
type FaceTable = [Vec<(VariantId, FaceDetails)>; 6];

/// Variants, weights and adjacency built from a tile catalogue
///
/// Immutable once built; share it between runs behind an [`Arc`].
#[derive(Debug)]
pub struct TileModel {
    tiles: Vec<Arc<TileDefinition>>,
    palette: Palette,
    variants: Vec<TileVariant>,
    weights: Vec<f64>,
    lookup: HashMap<TileVariant, VariantId>,
    /// `adjacency[dir][v]` holds the variants allowed in direction `dir` of `v`
    adjacency: [Vec<VariantSet>; 6],
    faces: FaceTable,
}

impl TileModel {
    /// Build the model from a catalogue
    ///
    /// Tiles whose cells are not face-connected are skipped with a warning.
    /// Repeated offsets are dropped, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the catalogue is empty or no tile
    /// survives validation, and an invalid parameter error for a tile whose
    /// weight is not a positive number.
    pub fn build(catalogue: Vec<TileDefinition>, palette: Palette) -> Result<Self> {
        if catalogue.is_empty() {
            return Err(configuration_error(&"tile catalogue is empty"));
        }

        let mut tiles = Vec::with_capacity(catalogue.len());
        for mut tile in catalogue {
            let listed = tile.offsets.len();
            let mut seen = HashSet::with_capacity(listed);
            tile.offsets.retain(|offset| seen.insert(*offset));
            if tile.offsets.len() < listed {
                warn!("Tile '{}' lists a cell more than once", tile.name);
            }
            if !(tile.weight.is_finite() && tile.weight > 0.0) {
                return Err(invalid_parameter(
                    "weight",
                    &tile.weight,
                    &format!("tile '{}' needs a positive weight", tile.name),
                ));
            }
            if !tile.is_contiguous() {
                warn!(
                    "Skipping tile '{}': its cells are not connected through faces",
                    tile.name
                );
                continue;
            }
            tiles.push(Arc::new(tile));
        }
        if tiles.is_empty() {
            return Err(configuration_error(&"no usable tiles in catalogue"));
        }

        let mut variants = Vec::new();
        let mut weights = Vec::new();
        for (tile_id, tile) in tiles.iter().enumerate() {
            let cell_weight = tile.weight / tile.offsets.len() as f64;
            for rotation in Rotation::group(tile.rotatable, tile.reflectable) {
                for &offset in &tile.offsets {
                    variants.push(TileVariant {
                        tile: tile_id,
                        rotation,
                        offset,
                    });
                    weights.push(cell_weight);
                }
            }
        }

        let lookup = variants
            .iter()
            .enumerate()
            .map(|(id, variant)| (*variant, id))
            .collect();

        let count = variants.len();
        let mut model = Self {
            tiles,
            palette,
            variants,
            weights,
            lookup,
            adjacency: std::array::from_fn(|_| vec![VariantSet::new(count); count]),
            faces: std::array::from_fn(|_| Vec::new()),
        };
        model.add_internal_adjacency();
        model.collect_faces();
        model.add_external_adjacency();

        debug!(
            "Built tile model: {} tiles, {} variants",
            model.tiles.len(),
            model.variants.len()
        );
        Ok(model)
    }

    fn allow(&mut self, from: VariantId, dir: FaceDir, to: VariantId) {
        if let Some(set) = self
            .adjacency
            .get_mut(dir.index())
            .and_then(|rows| rows.get_mut(from))
        {
            set.insert(to);
        }
        if let Some(set) = self
            .adjacency
            .get_mut(dir.inverted().index())
            .and_then(|rows| rows.get_mut(to))
        {
            set.insert(from);
        }
    }

    /// Cells of the same oriented tile only fit next to each other
    fn add_internal_adjacency(&mut self) {
        let mut pairs = Vec::new();
        for (id, variant) in self.variants.iter().enumerate() {
            let Some(tile) = self.tiles.get(variant.tile) else {
                continue;
            };
            for dir in FaceDir::POSITIVE {
                let next = TileVariant {
                    offset: add(variant.offset, dir.forward()),
                    ..*variant
                };
                if let Some(&other) = self.lookup.get(&next).filter(|_| tile.contains(next.offset))
                {
                    pairs.push((id, variant.rotation.apply_dir(dir), other));
                }
            }
        }
        for (from, dir, to) in pairs {
            self.allow(from, dir, to);
        }
    }

    fn collect_faces(&mut self) {
        for (id, variant) in self.variants.iter().enumerate() {
            let Some(tile) = self.tiles.get(variant.tile) else {
                continue;
            };
            let rotator = variant.rotation.rotator();
            for face in tile.external_faces().filter(|f| f.offset == variant.offset) {
                let (dir, details) = rotator.apply_face(face.dir, &face.details);
                if let Some(list) = self.faces.get_mut(dir.index()) {
                    list.push((id, details));
                }
            }
        }
    }

    /// Pair faces pointing at each other whose paint the palette accepts
    fn add_external_adjacency(&mut self) {
        let mut pairs = Vec::new();
        for dir in FaceDir::POSITIVE {
            let outgoing = group_by_paint(self.faces(dir));
            let incoming = group_by_paint(self.faces(dir.inverted()));
            for (paint, sources) in &outgoing {
                for (other, targets) in &incoming {
                    if !self.palette.matches(paint, other) {
                        continue;
                    }
                    for &a in sources {
                        for &b in targets {
                            pairs.push((a, dir, b));
                        }
                    }
                }
            }
        }
        for (from, dir, to) in pairs {
            self.allow(from, dir, to);
        }
    }

    /// All variants in index order
    pub fn variants(&self) -> &[TileVariant] {
        &self.variants
    }

    /// Number of variants
    pub const fn variant_count(&self) -> usize {
        self.variants.len()
    }

    /// One variant
    pub fn variant(&self, id: VariantId) -> Option<&TileVariant> {
        self.variants.get(id)
    }

    /// Weight of every variant, indexed by [`VariantId`]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Accepted tiles, indexed by [`TileId`]
    pub fn tiles(&self) -> &[Arc<TileDefinition>] {
        &self.tiles
    }

    /// One accepted tile
    pub fn tile(&self, id: TileId) -> Option<&Arc<TileDefinition>> {
        self.tiles.get(id)
    }

    /// Id of the accepted tile with the given name
    pub fn tile_id(&self, name: &str) -> Option<TileId> {
        self.tiles.iter().position(|t| t.name == name)
    }

    /// Palette used for face matching
    pub const fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Variant id of one orientation of one tile cell
    pub fn variant_id(&self, tile: TileId, rotation: Rotation, offset: Vector3) -> Option<VariantId> {
        self.lookup
            .get(&TileVariant {
                tile,
                rotation,
                offset,
            })
            .copied()
    }

    /// Variants allowed in direction `dir` of `variant`
    pub fn allowed_neighbors(&self, variant: VariantId, dir: FaceDir) -> Option<&VariantSet> {
        self.adjacency
            .get(dir.index())
            .and_then(|rows| rows.get(variant))
    }

    /// Whether `b` may sit in direction `dir` of `a`
    pub fn is_compatible(&self, a: VariantId, b: VariantId, dir: FaceDir) -> bool {
        self.allowed_neighbors(a, dir)
            .is_some_and(|set| set.contains(b))
    }

    /// Outward faces pointing in `dir`, after orientation
    pub fn faces(&self, dir: FaceDir) -> &[(VariantId, FaceDetails)] {
        self.faces.get(dir.index()).map_or(&[], Vec::as_slice)
    }

    /// Every variant of the given tiles
    pub fn variants_of_tiles(&self, tiles: &[TileId]) -> VariantSet {
        VariantSet::from_indices(
            self.variant_count(),
            self.variants
                .iter()
                .enumerate()
                .filter(|(_, v)| tiles.contains(&v.tile))
                .map(|(id, _)| id),
        )
    }

    /// Variants with an outward face in `dir` that `details` may touch
    pub fn variants_matching_face(&self, dir: FaceDir, details: &FaceDetails) -> VariantSet {
        VariantSet::from_indices(
            self.variant_count(),
            self.faces(dir)
                .iter()
                .filter(|(_, face)| self.palette.matches(details, face))
                .map(|(id, _)| *id),
        )
    }
}

fn group_by_paint(faces: &[(VariantId, FaceDetails)]) -> Vec<(FaceDetails, Vec<VariantId>)> {
    let mut groups: Vec<(FaceDetails, Vec<VariantId>)> = Vec::new();
    let mut slots: HashMap<FaceDetails, usize> = HashMap::new();
    for (id, details) in faces {
        if let Some(group) = slots.get(details).and_then(|&slot| groups.get_mut(slot)) {
            group.1.push(*id);
        } else {
            slots.insert(*details, groups.len());
            groups.push((*details, vec![*id]));
        }
    }
    groups
}
