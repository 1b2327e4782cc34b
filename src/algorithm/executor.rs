use std::time::Instant;

use image::RgbImage;
use indicatif::ProgressBar;

use crate::{
    algorithm::{
        compositing::{ColorFilter, assigned_candidates, composite},
        fitting::{ExhaustionPolicy, FitMode, FitReport, GreedyFitter, UsageLedger},
        ranking::{DistanceMetric, RankedCandidate, rank_cells},
    },
    analysis::candidates::{CandidateEntry, CandidateRegistry, minimum_dimensions},
    io::configuration::MAX_GRID_SIZE,
    io::error::{Result, invalid_parameter},
    spatial::{
        grid::Cell,
        pixels::{CompositeSink, PixelSource},
        planner::{GridPlan, PlannedGrid, plan_mosaic},
    },
};

/// Mosaic parameters; every field is explicit
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MosaicConfig {
    /// Rows and columns of the square grid (N)
    pub grid_size: usize,
    /// Allowed tile/reference aspect-ratio deviation (ε)
    pub aspect_tolerance: f32,
    /// Maximum placements of any candidate (R)
    pub repeat_cap: u32,
    /// Acceptability rules, including the exclusion radius (D)
    pub fit_mode: FitMode,
    /// Behavior when every ranked candidate is rejected
    pub exhaustion_policy: ExhaustionPolicy,
    /// Whether the dominant-channel filter is applied
    pub filter_enabled: bool,
    /// Filter blend factor (f)
    pub filter_strength: f64,
    /// Candidate ordering metric
    pub distance_metric: DistanceMetric,
}

impl MosaicConfig {
    /// Check every parameter independently of any image
    ///
    /// # Errors
    ///
    /// Returns an error naming the first invalid parameter
    pub fn validate(&self) -> Result<()> {
        if self.grid_size == 0 || self.grid_size > MAX_GRID_SIZE {
            return Err(invalid_parameter(
                "grid_size",
                &self.grid_size,
                &format!("must be between 1 and {MAX_GRID_SIZE}"),
            ));
        }
        if !self.aspect_tolerance.is_finite() || self.aspect_tolerance < 0.0 {
            return Err(invalid_parameter(
                "aspect_tolerance",
                &self.aspect_tolerance,
                &"must be a finite non-negative number",
            ));
        }
        if self.repeat_cap == 0 {
            return Err(invalid_parameter(
                "repeat_cap",
                &self.repeat_cap,
                &"must be at least 1",
            ));
        }
        ColorFilter::new(self.filter_strength)?;
        Ok(())
    }

    /// Color filter to apply, if enabled
    ///
    /// # Errors
    ///
    /// Returns an error if the filter strength is invalid
    pub fn color_filter(&self) -> Result<Option<ColorFilter>> {
        if self.filter_enabled {
            ColorFilter::new(self.filter_strength).map(Some)
        } else {
            Ok(None)
        }
    }
}

/// Fitting results
#[derive(Debug, Clone)]
pub struct FitOutcome {
    /// Final placement counters
    pub ledger: UsageLedger,
    /// How cells were filled
    pub report: FitReport,
}

/// Everything produced by a complete run
#[derive(Debug, Clone)]
pub struct MosaicOutcome {
    /// Tile and mosaic geometry
    pub plan: GridPlan,
    /// Cells with targets and assignments (the assignment table)
    pub cells: Vec<Cell>,
    /// Signed candidates
    pub registry: CandidateRegistry,
    /// Fitting results
    pub fit: FitOutcome,
    /// Composite pixels, `mosaic_width` x `mosaic_height`
    pub composite: RgbImage,
}

/// Runs plan, sign, rank, fit and composite over abstract pixel sources
///
/// Stages are exposed individually so callers can drive custom sinks; `run`
/// chains them.
pub struct MosaicEngine {
    config: MosaicConfig,
    progress: ProgressBar,
}

impl MosaicEngine {
    /// Create an engine with a validated configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid
    pub fn new(config: MosaicConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            progress: ProgressBar::hidden(),
        })
    }

    /// Report stage progress on `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Active configuration
    pub const fn config(&self) -> &MosaicConfig {
        &self.config
    }

    fn start_stage(&self, name: &'static str, len: usize) -> Instant {
        self.progress.reset();
        self.progress.set_length(len as u64);
        self.progress.set_message(name);
        tracing::debug!(stage = name, len, "Stage started");
        Instant::now()
    }

    fn finish_stage(&self, name: &'static str, started: Instant) {
        self.progress.set_position(self.progress.length().unwrap_or(0));
        tracing::info!(stage = name, elapsed = ?started.elapsed(), "Stage finished");
    }

    /// Plan the grid from the reference and candidate minimum dimensions
    ///
    /// # Errors
    ///
    /// Returns an error if there are no candidates, the reference cannot be
    /// partitioned, or no tile crop meets the tolerance
    pub fn plan<R>(&self, reference: &R, entries: &[CandidateEntry]) -> Result<PlannedGrid>
    where
        R: PixelSource + Sync + ?Sized,
    {
        let started = self.start_stage("plan", 1);
        let min_candidate = minimum_dimensions(entries)?;
        let planned = plan_mosaic(
            reference,
            min_candidate,
            self.config.grid_size,
            self.config.aspect_tolerance,
        )?;
        self.finish_stage("plan", started);
        Ok(planned)
    }

    /// Sign every candidate over the planned tile crop
    ///
    /// # Errors
    ///
    /// Returns an error if any candidate fails to load or sign
    pub fn sign_candidates<S, F>(
        &self,
        entries: &[CandidateEntry],
        plan: &GridPlan,
        load: F,
    ) -> Result<CandidateRegistry>
    where
        S: PixelSource,
        F: Fn(usize, &CandidateEntry) -> Result<S> + Sync,
    {
        let started = self.start_stage("sign", entries.len());
        let registry =
            CandidateRegistry::sign(entries, plan.tile_width, plan.tile_height, |index, entry| {
                let pixels = load(index, entry);
                self.progress.inc(1);
                pixels
            })?;
        self.finish_stage("sign", started);
        Ok(registry)
    }

    /// Rank every candidate for every cell
    pub fn rank(&self, cells: &[Cell], registry: &CandidateRegistry) -> Vec<Vec<RankedCandidate>> {
        let started = self.start_stage("rank", cells.len());
        let rankings = rank_cells(cells, registry, self.config.distance_metric);
        self.finish_stage("rank", started);
        rankings
    }

    /// Assign a candidate to every cell in row-major order
    ///
    /// Assignments are written into `cells` as they are committed, so on
    /// failure the cells fitted before the failing one keep their candidate.
    ///
    /// # Errors
    ///
    /// Returns an error if the rankings do not match the cells or a cell
    /// cannot be filled under the exhaustion policy
    pub fn fit(
        &self,
        plan: &GridPlan,
        cells: &mut [Cell],
        rankings: &[Vec<RankedCandidate>],
        candidate_count: usize,
    ) -> Result<FitOutcome> {
        if rankings.len() != cells.len() {
            return Err(invalid_parameter(
                "rankings",
                &rankings.len(),
                &format!("expected one ranking per cell ({})", cells.len()),
            ));
        }

        let started = self.start_stage("fit", cells.len());
        let mut fitter = GreedyFitter::new(
            self.config.fit_mode,
            self.config.repeat_cap,
            self.config.exhaustion_policy,
            plan.rows,
            plan.cols,
            candidate_count,
        )?;

        for (cell, ranking) in cells.iter_mut().zip(rankings) {
            let (candidate, _) = fitter.fit_cell(cell.index, ranking)?;
            cell.assigned = Some(candidate);
            self.progress.inc(1);
        }

        let (_, ledger, report) = fitter.into_parts();
        tracing::info!(
            preferred = report.preferred,
            spatial_relaxed = report.spatial_relaxed,
            cap_relaxed = report.cap_relaxed,
            "Fitted cells"
        );
        self.finish_stage("fit", started);
        Ok(FitOutcome { ledger, report })
    }

    /// Stamp every assigned cell into `sink`
    ///
    /// # Errors
    ///
    /// Returns an error if a cell is unassigned, refers to an unknown
    /// candidate, or a candidate fails to load
    pub fn composite<S, F, K>(
        &self,
        cells: &[Cell],
        registry: &CandidateRegistry,
        load: F,
        sink: &mut K,
    ) -> Result<()>
    where
        S: PixelSource,
        F: Fn(usize) -> Result<S> + Sync,
        K: CompositeSink + ?Sized,
    {
        assigned_candidates(cells, registry.len())?;
        let started = self.start_stage("composite", cells.len());
        composite(cells, self.config.color_filter()?, load, sink)?;
        self.finish_stage("composite", started);
        Ok(())
    }

    /// Run every stage and return the assignment table and composite
    ///
    /// `load` provides pixels for candidate `index`; it is used both for
    /// signing and for compositing.
    ///
    /// # Errors
    ///
    /// Returns an error if any stage fails
    pub fn run<R, S, F>(
        &self,
        reference: &R,
        entries: &[CandidateEntry],
        load: F,
    ) -> Result<MosaicOutcome>
    where
        R: PixelSource + Sync + ?Sized,
        S: PixelSource,
        F: Fn(usize) -> Result<S> + Sync,
    {
        let PlannedGrid { plan, mut cells } = self.plan(reference, entries)?;
        let registry = self.sign_candidates(entries, &plan, |index, _| load(index))?;
        let rankings = self.rank(&cells, &registry);
        let fit = self.fit(&plan, &mut cells, &rankings, registry.len())?;

        let mut composite = RgbImage::new(plan.mosaic_width, plan.mosaic_height);
        self.composite(&cells, &registry, &load, &mut composite)?;
        self.progress.finish_and_clear();

        Ok(MosaicOutcome {
            plan,
            cells,
            registry,
            fit,
            composite,
        })
    }
}
