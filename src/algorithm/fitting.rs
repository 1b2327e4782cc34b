//! Greedy candidate assignment under a repeat cap and spatial exclusion
//!
//! Cells are fitted one at a time in row-major order. Each cell walks its
//! ranked candidates and takes the first one that is still under the repeat
//! cap and, in sparse mode, not already held by a cell within the exclusion
//! radius. Earlier cells therefore deplete the shared budget first.
//!
//! When every ranked candidate is rejected, the configured
//! [`ExhaustionPolicy`] decides whether to relax constraints or fail. A
//! failed cell leaves the ledger and all earlier assignments untouched.

use clap::ValueEnum;
use serde::Serialize;

use crate::{
    algorithm::ranking::RankedCandidate,
    io::error::{MosaicError, Result, invalid_parameter},
    spatial::grid::{AssignmentGrid, grid_position},
};

/// Acceptability rules applied while walking a ranked list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Only the repeat cap is enforced
    BestPick,
    /// Repeat cap plus no identical candidate within `exclusion_radius`
    /// (Chebyshev distance) of an assigned cell
    Sparse {
        /// Minimum grid distance between two cells holding the same candidate
        exclusion_radius: usize,
    },
}

impl FitMode {
    /// Exclusion radius, if spatial exclusion is enforced
    pub const fn exclusion_radius(self) -> Option<usize> {
        match self {
            Self::BestPick => None,
            Self::Sparse { exclusion_radius } => Some(exclusion_radius),
        }
    }
}

/// What to do when no ranked candidate is acceptable for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum ExhaustionPolicy {
    /// Report `RepeatBudgetExhausted` immediately
    Fail,
    /// Retry ignoring spatial exclusion; fail if the cap still rejects all
    RelaxSpatial,
    /// Retry ignoring spatial exclusion, then ignore the cap and take the
    /// least-placed candidate (ties broken by rank)
    #[default]
    RelaxSpatialThenCap,
}

/// How a cell's candidate was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Placement {
    /// First acceptable candidate under all constraints
    Preferred,
    /// Spatial exclusion was ignored for this cell
    SpatialRelaxed,
    /// Both spatial exclusion and the repeat cap were ignored
    CapRelaxed,
}

/// Placement counters per candidate
///
/// Counters start at zero and only ever increase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageLedger {
    counts: Vec<u32>,
}

impl UsageLedger {
    /// Create a ledger for `candidate_count` candidates
    pub fn new(candidate_count: usize) -> Self {
        Self {
            counts: vec![0; candidate_count],
        }
    }

    /// Times `candidate` has been placed (zero for unknown indices)
    pub fn count(&self, candidate: usize) -> u32 {
        self.counts.get(candidate).copied().unwrap_or(0)
    }

    /// Number of candidates tracked
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Whether no candidates are tracked
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all placements
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// All counters in candidate order
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    fn increment(&mut self, candidate: usize) {
        if let Some(count) = self.counts.get_mut(candidate) {
            *count = count.saturating_add(1);
        }
    }
}

/// Tally of how cells were filled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FitReport {
    /// Cells filled under all constraints
    pub preferred: usize,
    /// Cells filled after ignoring spatial exclusion
    pub spatial_relaxed: usize,
    /// Cells filled after ignoring both constraints
    pub cap_relaxed: usize,
}

impl FitReport {
    /// Total cells filled
    pub const fn total(&self) -> usize {
        self.preferred + self.spatial_relaxed + self.cap_relaxed
    }

    const fn record(&mut self, placement: Placement) {
        match placement {
            Placement::Preferred => self.preferred += 1,
            Placement::SpatialRelaxed => self.spatial_relaxed += 1,
            Placement::CapRelaxed => self.cap_relaxed += 1,
        }
    }
}

/// Sole owner of the usage ledger and assignment grid during fitting
#[derive(Debug, Clone)]
pub struct GreedyFitter {
    mode: FitMode,
    repeat_cap: u32,
    policy: ExhaustionPolicy,
    ledger: UsageLedger,
    grid: AssignmentGrid,
    report: FitReport,
}

impl GreedyFitter {
    /// Create a fitter for a `rows` x `cols` grid over `candidate_count`
    /// candidates
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `repeat_cap` is zero
    /// - `candidate_count` is zero
    pub fn new(
        mode: FitMode,
        repeat_cap: u32,
        policy: ExhaustionPolicy,
        rows: usize,
        cols: usize,
        candidate_count: usize,
    ) -> Result<Self> {
        if repeat_cap == 0 {
            return Err(invalid_parameter(
                "repeat_cap",
                &repeat_cap,
                &"every candidate must be placeable at least once",
            ));
        }
        if candidate_count == 0 {
            return Err(MosaicError::NoCandidates {
                reason: "cannot fit cells without candidates".to_string(),
            });
        }

        Ok(Self {
            mode,
            repeat_cap,
            policy,
            ledger: UsageLedger::new(candidate_count),
            grid: AssignmentGrid::new(rows, cols),
            report: FitReport::default(),
        })
    }

    /// Whether `candidate` is under the repeat cap
    pub fn under_cap(&self, candidate: usize) -> bool {
        candidate < self.ledger.len() && self.ledger.count(candidate) < self.repeat_cap
    }

    /// Whether `candidate` may be placed at (row, col) under all constraints
    pub fn is_acceptable(&self, row: usize, col: usize, candidate: usize) -> bool {
        self.under_cap(candidate)
            && self.mode.exclusion_radius().is_none_or(|radius| {
                !self.grid.holds_nearby(row, col, radius, candidate)
            })
    }

    /// Assign a candidate to the cell with row-major index `cell`
    ///
    /// Returns the chosen candidate index and how it was chosen.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `cell` is outside the grid or already assigned
    /// - The ranking refers to an unknown candidate
    /// - No candidate is acceptable and the exhaustion policy forbids a
    ///   fallback (`RepeatBudgetExhausted`)
    pub fn fit_cell(
        &mut self,
        cell: usize,
        ranking: &[RankedCandidate],
    ) -> Result<(usize, Placement)> {
        let cols = self.grid.cols();
        let (row, col) = grid_position(cell, cols);
        if row >= self.grid.rows() || col >= cols {
            return Err(invalid_parameter(
                "cell",
                &cell,
                &format!("grid has {} cells", self.grid.rows() * cols),
            ));
        }
        if self.grid.get(row, col).is_some() {
            return Err(invalid_parameter(
                "cell",
                &cell,
                &"cell is already assigned",
            ));
        }
        if let Some(bad) = ranking.iter().find(|r| r.index >= self.ledger.len()) {
            return Err(MosaicError::InvalidCandidateIndex {
                index: bad.index,
                candidate_count: self.ledger.len(),
            });
        }

        let (candidate, placement) = self
            .choose(row, col, ranking)
            .ok_or(MosaicError::RepeatBudgetExhausted { cell, row, col })?;

        self.ledger.increment(candidate);
        self.grid.assign(row, col, candidate);
        self.report.record(placement);

        if placement == Placement::Preferred {
            tracing::trace!(cell, candidate, "Placed candidate");
        } else {
            tracing::warn!(cell, row, col, candidate, ?placement, "Relaxed constraints to fill cell");
        }

        Ok((candidate, placement))
    }

    fn choose(
        &self,
        row: usize,
        col: usize,
        ranking: &[RankedCandidate],
    ) -> Option<(usize, Placement)> {
        if let Some(found) = ranking
            .iter()
            .find(|r| self.is_acceptable(row, col, r.index))
        {
            return Some((found.index, Placement::Preferred));
        }

        let relax_spatial = || {
            ranking
                .iter()
                .find(|r| self.under_cap(r.index))
                .map(|r| (r.index, Placement::SpatialRelaxed))
        };

        match self.policy {
            ExhaustionPolicy::Fail => None,
            ExhaustionPolicy::RelaxSpatial => relax_spatial(),
            ExhaustionPolicy::RelaxSpatialThenCap => relax_spatial().or_else(|| {
                // min_by_key keeps the first minimum, i.e. the best-ranked one
                ranking
                    .iter()
                    .min_by_key(|r| self.ledger.count(r.index))
                    .map(|r| (r.index, Placement::CapRelaxed))
            }),
        }
    }

    /// Fit every cell in row-major order
    ///
    /// `rankings[i]` is the ranked list for cell `i`. Stops at the first
    /// failing cell; cells fitted before it keep their assignments.
    ///
    /// # Errors
    ///
    /// Returns an error if the ranking count does not match the grid or any
    /// cell fails to fit
    pub fn fit_all(&mut self, rankings: &[Vec<RankedCandidate>]) -> Result<()> {
        let cell_count = self.grid.rows() * self.grid.cols();
        if rankings.len() != cell_count {
            return Err(invalid_parameter(
                "rankings",
                &rankings.len(),
                &format!("expected one ranking per cell ({cell_count})"),
            ));
        }

        for (cell, ranking) in rankings.iter().enumerate() {
            self.fit_cell(cell, ranking)?;
        }
        Ok(())
    }

    /// Placement counters
    pub const fn ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Assignments made so far
    pub const fn grid(&self) -> &AssignmentGrid {
        &self.grid
    }

    /// Tally of how cells were filled
    pub const fn report(&self) -> FitReport {
        self.report
    }

    /// Candidate assigned to the cell with row-major index `cell`
    pub fn assignment(&self, cell: usize) -> Option<usize> {
        let (row, col) = grid_position(cell, self.grid.cols());
        self.grid.get(row, col)
    }

    /// Consume the fitter, keeping the ledger and report
    pub fn into_parts(self) -> (AssignmentGrid, UsageLedger, FitReport) {
        (self.grid, self.ledger, self.report)
    }
}
