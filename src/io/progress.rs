//! Stage progress display with a batch bar for multi-reference runs

use crate::io::configuration::BATCH_PROGRESS_THRESHOLD;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::LazyLock;

/// Coordinates progress display for batch operations
///
/// Each reference image gets a stage bar that the engine advances through
/// plan, sign, rank, fit and composite. Batches of more than one reference
/// also get an overall file bar.
pub struct ProgressManager {
    multi_progress: MultiProgress,
    batch_bar: Option<ProgressBar>,
    stage_bar: Option<ProgressBar>,
}

impl Default for ProgressManager {
    fn default() -> Self {
        Self::new()
    }
}

static STAGE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("{prefix} {msg:>9} [{bar:30.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

static BATCH_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template("[{elapsed_precise}] References: [{bar:40.cyan/blue}] {pos}/{len}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

impl ProgressManager {
    /// Create a new progress manager
    pub fn new() -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            batch_bar: None,
            stage_bar: None,
        }
    }

    /// Initialize the batch bar based on reference count
    pub fn initialize(&mut self, file_count: usize) {
        if file_count > BATCH_PROGRESS_THRESHOLD {
            let batch_bar = ProgressBar::new(file_count as u64);
            batch_bar.set_style(BATCH_STYLE.clone());
            self.batch_bar = Some(self.multi_progress.add(batch_bar));
        }
    }

    /// Create the stage bar for a reference and hand it to the engine
    pub fn start_file(&mut self, path: &Path) -> ProgressBar {
        let display_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let bar = self.multi_progress.add(ProgressBar::new(0));
        bar.set_style(STAGE_STYLE.clone());
        bar.set_prefix(display_name);
        self.stage_bar = Some(bar.clone());
        bar
    }

    /// Mark the current reference as completed
    pub fn complete_file(&mut self) {
        if let Some(bar) = self.stage_bar.take() {
            bar.finish_and_clear();
            self.multi_progress.remove(&bar);
        }
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.inc(1);
        }
    }

    /// Clean up all progress displays
    pub fn finish(&self) {
        if let Some(ref batch_bar) = self.batch_bar {
            batch_bar.finish_with_message("All references processed");
        }
        let _ = self.multi_progress.clear();
    }
}
