//! Progress display for catalogue batches

use crate::algorithm::generator::ProgressCallback;
use crate::io::configuration::{PROGRESS_BAR_STEPS, PROGRESS_BAR_WIDTH};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::{Arc, LazyLock};

static PROGRESS_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{prefix}} {{msg:>12}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{percent:>3}}%"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// One progress bar per catalogue being generated
pub struct ProgressManager {
    multi_progress: MultiProgress,
    bars: Vec<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            bars: Vec::new(),
        }
    }

    /// Add a bar for a catalogue and return the callback feeding it
    ///
    /// The callback may be called from a worker thread.
    pub fn start_file(&mut self, path: &Path) -> ProgressCallback {
        let bar = self
            .multi_progress
            .add(ProgressBar::new(PROGRESS_BAR_STEPS));
        bar.set_style(PROGRESS_STYLE.clone());
        bar.set_prefix(
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
        );
        self.bars.push(bar.clone());

        Arc::new(move |phase: &str, fraction: f64| {
            bar.set_message(phase.to_string());
            bar.set_position((fraction.clamp(0.0, 1.0) * PROGRESS_BAR_STEPS as f64) as u64);
        })
    }

    /// Mark the latest catalogue as done
    pub fn complete_file(&self, success: bool) {
        if let Some(bar) = self.bars.last() {
            if success {
                bar.finish_with_message("done");
            } else {
                bar.abandon_with_message("contradiction");
            }
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        let _ = self.multi_progress.clear();
    }
}
