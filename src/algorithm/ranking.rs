use clap::ValueEnum;
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    analysis::{candidates::CandidateRegistry, signature::Signature},
    spatial::grid::Cell,
};

/// Color distance used to order candidates for a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize)]
pub enum DistanceMetric {
    /// `|ΔR + ΔG + ΔB|`; opposite-signed channel errors cancel
    #[default]
    SignedSum,
    /// Straight-line RGB distance, opt-in only
    Euclidean,
}

impl DistanceMetric {
    /// Distance between a candidate signature and a cell target
    pub fn distance(self, candidate: &Signature, target: &Signature) -> f64 {
        match self {
            Self::SignedSum => candidate.signed_difference_sum(target).abs(),
            Self::Euclidean => candidate.euclidean_distance(target),
        }
    }
}

/// Candidate position in a cell's preference order
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankedCandidate {
    /// Candidate index in the registry
    pub index: usize,
    /// Distance to the cell target (smaller is better)
    pub distance: f64,
}

/// Order every candidate by distance to `target`, nearest first
///
/// The sort is stable, so equal distances keep registry order.
pub fn rank_candidates(
    target: &Signature,
    registry: &CandidateRegistry,
    metric: DistanceMetric,
) -> Vec<RankedCandidate> {
    let mut ranked: Vec<RankedCandidate> = registry
        .iter()
        .enumerate()
        .map(|(index, candidate)| RankedCandidate {
            index,
            distance: metric.distance(&candidate.signature, target),
        })
        .collect();

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}

/// Rank candidates for every cell
///
/// Each cell depends only on its own target and the immutable registry, so
/// cells are ranked in parallel. Output order matches `cells`.
pub fn rank_cells(
    cells: &[Cell],
    registry: &CandidateRegistry,
    metric: DistanceMetric,
) -> Vec<Vec<RankedCandidate>> {
    cells
        .par_iter()
        .map(|cell| rank_candidates(&cell.target, registry, metric))
        .collect()
}
