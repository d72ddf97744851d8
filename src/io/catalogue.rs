//! JSON tile catalogues
//!
//! A catalogue file carries everything a generation needs: palette, tiles,
//! generator settings, tiles placed up front and custom constraints. Tiles
//! are referenced by name everywhere else in the file.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;

use crate::algorithm::constraints::{
    CountComparison, CountConstraint, PathConstraint, TileConstraint,
};
use crate::algorithm::generator::{Generator, GeneratorConfig};
use crate::algorithm::model::{TileId, TileModel};
use crate::algorithm::run::InitialConstraint;
use crate::io::configuration::{
    DEFAULT_BACKTRACK, DEFAULT_CELL_SIZE, DEFAULT_RETRIES, DEFAULT_SIZE, RANDOM_SEED,
};
use crate::io::error::{GenerationError, Result, configuration_error};
use crate::spatial::direction::Vector3;
use crate::spatial::palette::{Palette, PaletteEntry};
use crate::spatial::tiles::TileDefinition;
use crate::spatial::transform::{CellRotator, Rotation};

/// Palette section of a catalogue
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaletteFile {
    /// Colours in index order; the default palette when empty
    #[serde(default)]
    pub entries: Vec<PaletteEntry>,
    /// Overrides of the matching rule as `(a, b, allowed)`
    #[serde(default)]
    pub matches: Vec<(u8, u8, bool)>,
}

impl PaletteFile {
    /// Build the palette
    pub fn to_palette(&self) -> Palette {
        let mut palette = if self.entries.is_empty() {
            Palette::default()
        } else {
            Palette::new(self.entries.clone())
        };
        for &(a, b, allowed) in &self.matches {
            palette.set_match(a, b, allowed);
        }
        palette
    }
}

/// A tile placed before generation, by name
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialConstraintFile {
    /// Name of a catalogue tile
    pub tile: String,
    /// Grid cell of the tile's origin
    pub cell: Vector3,
    /// Orientation of the tile
    #[serde(default)]
    pub rotation: Rotation,
    /// Arbitrary cube symmetry, overriding `rotation` for fixed tiles
    #[serde(default)]
    pub rotator: Option<CellRotator>,
    /// Whether the tile already exists and only constrains its neighbours
    #[serde(default)]
    pub fixed: bool,
}

/// A custom constraint, by tile names
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintFile {
    /// See [`CountConstraint`]
    Count {
        /// Counted tiles
        tiles: Vec<String>,
        /// Comparison against `count`
        comparison: CountComparison,
        /// Number of cells
        count: usize,
        /// Ban and force as soon as possible
        #[serde(default)]
        eager: bool,
    },
    /// See [`PathConstraint`]
    Path {
        /// Tiles forming the path
        tiles: Vec<String>,
    },
}

/// Generator section of a catalogue
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorFile {
    /// `[width, height, depth]` in cells
    pub size: [usize; 3],
    /// Distance between neighbouring cell centres
    pub cell_size: [f64; 3],
    /// World position of the centre of the volume
    pub center: [f64; 3],
    /// Whether to backtrack after contradictions
    pub backtrack: bool,
    /// Most decisions kept for backtracking
    pub backtrack_limit: Option<usize>,
    /// Attempts made when backtracking is off
    pub retries: usize,
    /// Seed; 0 picks one at random
    pub seed: u64,
    /// Name of the tile surrounding the volume
    pub skybox: Option<String>,
}

impl Default for GeneratorFile {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            cell_size: DEFAULT_CELL_SIZE,
            center: [0.0; 3],
            backtrack: DEFAULT_BACKTRACK,
            backtrack_limit: None,
            retries: DEFAULT_RETRIES,
            seed: RANDOM_SEED,
            skybox: None,
        }
    }
}

/// Contents of a catalogue file
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogueFile {
    /// Paint colours and matching rules
    #[serde(default)]
    pub palette: PaletteFile,
    /// Tile definitions
    pub tiles: Vec<TileDefinition>,
    /// Tiles that only surround the volume and are never placed
    #[serde(default)]
    pub extra_tiles: Vec<TileDefinition>,
    /// Grid and search settings
    #[serde(default)]
    pub generator: GeneratorFile,
    /// Tiles placed before generation
    #[serde(default)]
    pub initial_constraints: Vec<InitialConstraintFile>,
    /// Custom constraints
    #[serde(default)]
    pub constraints: Vec<ConstraintFile>,
}

/// A loaded catalogue, ready to generate
#[derive(Debug)]
pub struct Catalogue {
    /// Built tile model
    pub model: Arc<TileModel>,
    /// Grid and search settings
    pub config: GeneratorConfig,
    /// Seed from the file
    pub seed: u64,
    /// Tiles placed before generation
    pub initial_constraints: Vec<InitialConstraint>,
    /// Custom constraints
    pub constraints: Vec<Arc<dyn TileConstraint>>,
}

impl Catalogue {
    /// Create the generator described by the catalogue
    ///
    /// # Errors
    ///
    /// Propagates validation errors from [`Generator::new`].
    pub fn generator(&self) -> Result<Generator> {
        Ok(Generator::new(Arc::clone(&self.model), self.config.clone())?
            .with_initial_constraints(self.initial_constraints.clone())
            .with_constraints(self.constraints.clone()))
    }
}

/// Read a catalogue file
///
/// # Errors
///
/// Returns a file system error if the file cannot be opened and a parse
/// error for malformed JSON.
pub fn load(path: &Path) -> Result<CatalogueFile> {
    let file = File::open(path).map_err(|source| GenerationError::FileSystem {
        path: path.to_path_buf(),
        operation: "open catalogue",
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| GenerationError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl CatalogueFile {
    /// Build the model and resolve every tile name
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a name that matches no tile, and
    /// any error from [`TileModel::build`].
    pub fn into_catalogue(self) -> Result<Catalogue> {
        let palette = self.palette.to_palette();
        let lookup_tiles = self
            .tiles
            .iter()
            .chain(&self.extra_tiles)
            .cloned()
            .collect::<Vec<_>>();
        let model = Arc::new(TileModel::build(self.tiles, palette)?);

        let find = |name: &str| {
            lookup_tiles
                .iter()
                .find(|t| t.name == name)
                .ok_or_else(|| configuration_error(&format!("unknown tile '{name}'")))
        };
        let model_tiles = |names: &[String]| -> Result<Vec<TileId>> {
            names
                .iter()
                .map(|name| {
                    model.tile_id(name).ok_or_else(|| {
                        configuration_error(&format!("tile '{name}' is not part of the model"))
                    })
                })
                .collect()
        };

        let skybox = self
            .generator
            .skybox
            .as_deref()
            .map(|name| find(name).cloned())
            .transpose()?;

        let mut initial_constraints = Vec::with_capacity(self.initial_constraints.len());
        for placed in &self.initial_constraints {
            if placed.fixed {
                let rotator = placed.rotator.unwrap_or_else(|| placed.rotation.rotator());
                initial_constraints.push(InitialConstraint::from_tile(
                    find(&placed.tile)?,
                    placed.cell,
                    rotator,
                ));
            } else {
                let tile = model_tiles(std::slice::from_ref(&placed.tile))?;
                let Some(&tile) = tile.first() else {
                    continue;
                };
                initial_constraints.push(InitialConstraint::select(
                    tile,
                    placed.cell,
                    placed.rotation,
                ));
            }
        }

        let mut constraints: Vec<Arc<dyn TileConstraint>> = Vec::new();
        for constraint in &self.constraints {
            match constraint {
                ConstraintFile::Count {
                    tiles,
                    comparison,
                    count,
                    eager,
                } => constraints.push(
                    CountConstraint::new(&model, &model_tiles(tiles)?, *comparison, *count, *eager)
                        .shared(),
                ),
                ConstraintFile::Path { tiles } => {
                    constraints.push(PathConstraint::new(&model, &model_tiles(tiles)?).shared());
                }
            }
        }

        let generator = self.generator;
        Ok(Catalogue {
            config: GeneratorConfig {
                size: generator.size,
                cell_size: generator.cell_size,
                center: generator.center,
                backtrack: generator.backtrack,
                backtrack_limit: generator.backtrack_limit,
                retries: generator.retries,
                skybox,
            },
            seed: generator.seed,
            model,
            initial_constraints,
            constraints,
        })
    }
}
