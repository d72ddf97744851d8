//! Command-line interface for generating from catalogue files

use crate::algorithm::generator::GenerateOptions;
use crate::io::catalogue::load;
use crate::io::configuration::OUTPUT_SUFFIX;
use crate::io::error::{GenerationError, Result, invalid_parameter};
use crate::io::image::{export_layers_as_png, tile_colors};
use crate::io::output::write_completion_json;
use crate::io::progress::ProgressManager;
use clap::Parser;
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "wavetile")]
#[command(
    author,
    version,
    about = "Fill a 3D grid with tiles from a catalogue using wave function collapse"
)]
/// Command-line arguments for the generator
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Catalogue JSON file, or a directory of them
    #[arg(value_name = "CATALOGUE")]
    pub target: PathBuf,

    /// Random seed; 0 picks one at random (defaults to the catalogue's)
    #[arg(short, long)]
    pub seed: Option<u64>,

    /// Grid size as width x height x depth (e.g. 16x2x16), overriding the catalogue
    #[arg(long, value_parser = parse_size)]
    pub size: Option<[usize; 3]>,

    /// Retry from scratch instead of backtracking
    #[arg(long)]
    pub no_backtrack: bool,

    /// Attempts made when backtracking is off
    #[arg(short, long)]
    pub retries: Option<usize>,

    /// Result file (single catalogue only); defaults to <catalogue>_result.json
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Also export the layers of the result as a PNG
    #[arg(long)]
    pub png: Option<PathBuf>,

    /// Generate on a worker thread
    #[arg(short, long)]
    pub threaded: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse a `WxHxD` grid size
///
/// # Errors
///
/// Returns a message when the text is not three positive integers joined by `x`.
pub fn parse_size(text: &str) -> std::result::Result<[usize; 3], String> {
    let parts: Vec<usize> = text
        .split(['x', 'X'])
        .map(|part| part.trim().parse::<usize>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| format!("invalid size '{text}': {e}"))?;
    match parts.as_slice() {
        &[w, h, d] if w > 0 && h > 0 && d > 0 => Ok([w, h, d]),
        _ => Err(format!("size '{text}' must be three positive integers like 10x1x10")),
    }
}

impl Cli {
    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }
}

/// Generates every catalogue named on the command line
pub struct FileProcessor {
    cli: Cli,
    progress_manager: Option<ProgressManager>,
}

impl FileProcessor {
    /// Create a new file processor with the given CLI arguments
    pub fn new(cli: Cli) -> Self {
        let progress_manager = cli.should_show_progress().then(ProgressManager::new);

        Self {
            cli,
            progress_manager,
        }
    }

    /// Process catalogues according to CLI arguments
    ///
    /// Returns whether every catalogue generated successfully.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be read or a catalogue is invalid
    pub fn process(&mut self) -> Result<bool> {
        let files = self.collect_files()?;
        if files.len() > 1 && (self.cli.output.is_some() || self.cli.png.is_some()) {
            return Err(invalid_parameter(
                "output",
                &self.cli.target.display(),
                &"explicit output paths need a single catalogue",
            ));
        }

        let mut all_succeeded = true;
        for file in &files {
            all_succeeded &= self.process_file(file)?;
        }

        if let Some(ref pm) = self.progress_manager {
            pm.finish();
        }

        Ok(all_succeeded)
    }

    fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let is_catalogue = |path: &Path| {
            path.extension().and_then(|s| s.to_str()) == Some("json")
                && !path
                    .file_stem()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .ends_with(OUTPUT_SUFFIX)
        };

        if self.cli.target.is_file() {
            Ok(vec![self.cli.target.clone()])
        } else if self.cli.target.is_dir() {
            let read_error = |source: std::io::Error| GenerationError::FileSystem {
                path: self.cli.target.clone(),
                operation: "read directory",
                source,
            };
            let mut files = Vec::new();
            for entry in std::fs::read_dir(&self.cli.target).map_err(read_error)? {
                let path = entry.map_err(read_error)?.path();
                if is_catalogue(&path) {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(invalid_parameter(
                "target",
                &self.cli.target.display(),
                &"must be a catalogue file or a directory",
            ))
        }
    }

    fn process_file(&mut self, input_path: &Path) -> Result<bool> {
        let start_time = Instant::now();
        let mut catalogue = load(input_path)?.into_catalogue()?;

        if let Some(size) = self.cli.size {
            catalogue.config.size = size;
        }
        if self.cli.no_backtrack {
            catalogue.config.backtrack = false;
        }
        if let Some(retries) = self.cli.retries {
            catalogue.config.retries = retries;
        }

        let generator = catalogue.generator()?;
        let progress = self
            .progress_manager
            .as_mut()
            .map(|pm| pm.start_file(input_path));
        let options = GenerateOptions {
            seed: self.cli.seed.unwrap_or(catalogue.seed),
            multithreaded: self.cli.threaded,
            progress,
            cancellation: None,
        };

        let completion = generator.generate(&options)?;
        if let Some(ref pm) = self.progress_manager {
            pm.complete_file(completion.success);
        }

        let output_path = self
            .cli
            .output
            .clone()
            .unwrap_or_else(|| Self::get_output_path(input_path));
        write_completion_json(&output_path, &completion)?;

        if let Some(png_path) = &self.cli.png {
            export_layers_as_png(
                &completion,
                catalogue.config.size,
                &tile_colors(&catalogue.model),
                png_path,
            )?;
        }

        if completion.success {
            info!(
                "{}: placed {} tiles in {:.2?} (seed {})",
                input_path.display(),
                completion.instances.len(),
                start_time.elapsed(),
                completion.seed
            );
        } else {
            warn!(
                "{}: contradiction at {:?} after {} retries",
                input_path.display(),
                completion.contradiction_location,
                completion.retries
            );
        }

        Ok(completion.success)
    }

    fn get_output_path(input_path: &Path) -> PathBuf {
        let stem = input_path.file_stem().unwrap_or_default();
        let output_name = format!("{}{}.json", stem.to_string_lossy(), OUTPUT_SUFFIX);

        if let Some(parent) = input_path.parent() {
            parent.join(output_name)
        } else {
            PathBuf::from(output_name)
        }
    }
}
