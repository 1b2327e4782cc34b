//! Command-line interface for building mosaics from reference images

use crate::algorithm::executor::{MosaicConfig, MosaicEngine};
use crate::algorithm::fitting::{ExhaustionPolicy, FitMode};
use crate::algorithm::ranking::DistanceMetric;
use crate::analysis::candidates::CandidateEntry;
use crate::io::configuration::{
    DEFAULT_ASPECT_TOLERANCE, DEFAULT_EXCLUSION_RADIUS, DEFAULT_FILTER_STRENGTH,
    DEFAULT_GRID_SIZE, DEFAULT_REPEAT_CAP, OUTPUT_SUFFIX, SIGNATURES_SUFFIX, TABLE_SUFFIX,
};
use crate::io::error::{MosaicError, Result};
use crate::io::export::{AssignmentTable, signature_preview};
use crate::io::image::{
    collect_candidates, is_supported_image, load_candidate_crop, load_reference, save_rgb,
};
use crate::io::logging::Verbosity;
use crate::io::progress::ProgressManager;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Candidate acceptability rules selectable on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FitStrategy {
    /// Repeat cap only
    BestPick,
    /// Repeat cap plus spatial exclusion radius
    Sparse,
}

#[derive(Parser)]
#[command(name = "greedymosaic")]
#[command(
    author,
    version,
    about = "Assemble photo mosaics by greedy color matching"
)]
/// Command-line arguments for the mosaic tool
// CLI tools commonly need multiple boolean flags for various features and user preferences
#[allow(clippy::struct_excessive_bools)]
pub struct Cli {
    /// Reference image or directory of reference images
    #[arg(value_name = "REFERENCE")]
    pub target: PathBuf,

    /// Directory of candidate tile images
    #[arg(short, long, value_name = "DIR")]
    pub candidates: PathBuf,

    /// Directory for outputs (defaults to beside each reference)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Rows and columns of the square grid
    #[arg(short, long, default_value_t = DEFAULT_GRID_SIZE)]
    pub grid_size: usize,

    /// Allowed tile/reference aspect-ratio deviation
    #[arg(short, long, default_value_t = DEFAULT_ASPECT_TOLERANCE)]
    pub tolerance: f32,

    /// Maximum placements of any single candidate
    #[arg(short, long, default_value_t = DEFAULT_REPEAT_CAP)]
    pub repeat_cap: u32,

    /// Candidate acceptability rules
    #[arg(short = 'm', long, value_enum, default_value_t = FitStrategy::Sparse)]
    pub fit_mode: FitStrategy,

    /// Minimum grid distance between cells sharing a candidate (sparse mode)
    #[arg(short = 'd', long, default_value_t = DEFAULT_EXCLUSION_RADIUS)]
    pub exclusion_radius: usize,

    /// Behavior when every ranked candidate is rejected
    #[arg(short = 'x', long, value_enum, default_value_t = ExhaustionPolicy::default())]
    pub exhaustion: ExhaustionPolicy,

    /// Candidate ordering metric
    #[arg(long, value_enum, default_value_t = DistanceMetric::default())]
    pub metric: DistanceMetric,

    /// Disable the dominant-channel color filter
    #[arg(long)]
    pub no_filter: bool,

    /// Color filter blend factor in [0, 1]
    #[arg(short = 'f', long, default_value_t = DEFAULT_FILTER_STRENGTH)]
    pub filter_strength: f64,

    /// Also write the per-cell target color preview
    #[arg(short, long)]
    pub signatures: bool,

    /// Also write the assignment table as JSON
    #[arg(long)]
    pub table: bool,

    /// Suppress progress output
    #[arg(short, long)]
    pub quiet: bool,

    /// Log per-stage detail
    #[arg(short, long)]
    pub verbose: bool,

    /// Process references even if output exists
    #[arg(short, long)]
    pub no_skip: bool,
}

impl Cli {
    /// Check if existing output files should be skipped
    pub const fn skip_existing(&self) -> bool {
        !self.no_skip
    }

    /// Check if progress should be displayed
    pub const fn should_show_progress(&self) -> bool {
        !self.quiet
    }

    /// Console verbosity for the log subscriber
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }

    /// Fit mode built from the strategy and exclusion radius
    pub const fn fit_mode(&self) -> FitMode {
        match self.fit_mode {
            FitStrategy::BestPick => FitMode::BestPick,
            FitStrategy::Sparse => FitMode::Sparse {
                exclusion_radius: self.exclusion_radius,
            },
        }
    }

    /// Engine configuration from the parsed arguments
    pub const fn mosaic_config(&self) -> MosaicConfig {
        MosaicConfig {
            grid_size: self.grid_size,
            aspect_tolerance: self.tolerance,
            repeat_cap: self.repeat_cap,
            fit_mode: self.fit_mode(),
            exhaustion_policy: self.exhaustion,
            filter_enabled: !self.no_filter,
            filter_strength: self.filter_strength,
            distance_metric: self.metric,
        }
    }
}

/// Orchestrates batch processing of reference images with progress tracking
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

    /// Process references according to CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if target validation, candidate enumeration or any
    /// reference fails
    pub fn process(&mut self) -> Result<()> {
        self.cli.mosaic_config().validate()?;
        let files = self.collect_files()?;

        if files.is_empty() {
            tracing::info!("Nothing to do");
            return Ok(());
        }

        let candidates = collect_candidates(&self.cli.candidates)?;

        if let Some(ref mut pm) = self.progress_manager {
            pm.initialize(files.len());
        }

        for file in &files {
            self.process_file(file, &candidates)?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.finish();
        }

        Ok(())
    }

    /// References to process, sorted, excluding this tool's own outputs
    ///
    /// # Errors
    ///
    /// Returns an error if the target is neither a supported image nor a
    /// readable directory
    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let target = &self.cli.target;
        if target.is_file() {
            if !is_supported_image(target) {
                return Err(MosaicError::InvalidReferenceImage {
                    reason: format!("'{}' is not a supported image", target.display()),
                });
            }
            Ok(if self.should_process_file(target) {
                vec![target.clone()]
            } else {
                vec![]
            })
        } else if target.is_dir() {
            let mut files = Vec::new();
            let entries = std::fs::read_dir(target).map_err(|e| MosaicError::FileSystem {
                path: target.clone(),
                operation: "read reference directory",
                source: e,
            })?;
            for entry in entries {
                let path = entry?.path();
                if path.is_file()
                    && is_supported_image(&path)
                    && !Self::is_generated(&path)
                    && self.should_process_file(&path)
                {
                    files.push(path);
                }
            }
            files.sort();
            Ok(files)
        } else {
            Err(MosaicError::InvalidReferenceImage {
                reason: format!("'{}' is not a file or directory", target.display()),
            })
        }
    }

    fn is_generated(path: &Path) -> bool {
        let stem = path.file_stem().unwrap_or_default().to_string_lossy();
        stem.ends_with(OUTPUT_SUFFIX) || stem.ends_with(SIGNATURES_SUFFIX)
    }

    fn should_process_file(&self, input_path: &Path) -> bool {
        if !self.cli.skip_existing() {
            return true;
        }

        let output_path = self.output_path(input_path);
        if output_path.exists() {
            tracing::info!(reference = %input_path.display(), "Skipping (output exists)");
            false
        } else {
            true
        }
    }

    fn process_file(&mut self, input_path: &Path, candidates: &[CandidateEntry]) -> Result<()> {
        let start_time = Instant::now();
        tracing::info!(reference = %input_path.display(), "Building mosaic");

        let mut engine = MosaicEngine::new(self.cli.mosaic_config())?;
        if let Some(ref mut pm) = self.progress_manager {
            engine = engine.with_progress(pm.start_file(input_path));
        }

        let reference = load_reference(input_path)?;
        let planned = engine.plan(&reference, candidates)?;
        let plan = planned.plan;
        let mut cells = planned.cells;

        if self.cli.signatures {
            save_rgb(
                &signature_preview(&plan, &cells),
                &self.sibling_path(input_path, SIGNATURES_SUFFIX, None),
            )?;
        }

        let load = |index: usize| {
            candidates.get(index).map_or_else(
                || {
                    Err(MosaicError::InvalidCandidateIndex {
                        index,
                        candidate_count: candidates.len(),
                    })
                },
                |entry| load_candidate_crop(&entry.source, plan.tile_width, plan.tile_height),
            )
        };

        let registry = engine.sign_candidates(candidates, &plan, |index, _| load(index))?;
        let rankings = engine.rank(&cells, &registry);
        let fit = engine.fit(&plan, &mut cells, &rankings, registry.len())?;

        let mut composite = image::RgbImage::new(plan.mosaic_width, plan.mosaic_height);
        engine.composite(&cells, &registry, load, &mut composite)?;
        save_rgb(&composite, &self.output_path(input_path))?;

        if self.cli.table {
            AssignmentTable::new(&plan, &cells, &registry, &fit.ledger, fit.report)
                .write_json(&self.sibling_path(input_path, TABLE_SUFFIX, Some("json")))?;
        }

        if let Some(ref mut pm) = self.progress_manager {
            pm.complete_file();
        }

        tracing::info!(
            reference = %input_path.display(),
            elapsed = ?start_time.elapsed(),
            "Finished mosaic"
        );
        Ok(())
    }

    /// Mosaic output path for a reference
    pub fn output_path(&self, input_path: &Path) -> PathBuf {
        self.sibling_path(input_path, OUTPUT_SUFFIX, None)
    }

    fn sibling_path(&self, input_path: &Path, suffix: &str, extension: Option<&str>) -> PathBuf {
        let stem = input_path.file_stem().unwrap_or_default();
        let extension = extension.map_or_else(
            || input_path.extension().unwrap_or_default().to_string_lossy(),
            std::borrow::Cow::Borrowed,
        );
        let name = format!("{}{suffix}.{extension}", stem.to_string_lossy());

        match (&self.cli.output_dir, input_path.parent()) {
            (Some(dir), _) => dir.join(name),
            (None, Some(parent)) => parent.join(name),
            (None, None) => PathBuf::from(name),
        }
    }
}
