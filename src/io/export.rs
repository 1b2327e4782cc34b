//! Assignment table and signature preview export

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::RgbImage;
use serde::Serialize;

use crate::algorithm::fitting::{FitReport, UsageLedger};
use crate::analysis::candidates::CandidateRegistry;
use crate::analysis::signature::Signature;
use crate::io::error::{MosaicError, Result};
use crate::spatial::grid::Cell;
use crate::spatial::pixels::CompositeSink;
use crate::spatial::planner::GridPlan;

/// Per-candidate record of the assignment table
#[derive(Debug, Clone, Serialize)]
pub struct CandidateUsage {
    /// Candidate index
    pub index: usize,
    /// Candidate handle
    pub source: String,
    /// Candidate signature over the tile crop
    pub signature: Signature,
    /// Number of cells holding this candidate
    pub placed: u32,
}

/// Serializable assignment table
#[derive(Debug, Clone, Serialize)]
pub struct AssignmentTable<'a> {
    /// Tile and mosaic geometry
    pub plan: &'a GridPlan,
    /// How cells were filled
    pub report: FitReport,
    /// Cells with targets and assignments
    pub cells: &'a [Cell],
    /// Candidates with placement counts
    pub candidates: Vec<CandidateUsage>,
}

impl<'a> AssignmentTable<'a> {
    /// Collect the table from a finished run
    pub fn new(
        plan: &'a GridPlan,
        cells: &'a [Cell],
        registry: &CandidateRegistry,
        ledger: &UsageLedger,
        report: FitReport,
    ) -> Self {
        let candidates = registry
            .iter()
            .enumerate()
            .map(|(index, candidate)| CandidateUsage {
                index,
                source: candidate.source.display().to_string(),
                signature: candidate.signature,
                placed: ledger.count(index),
            })
            .collect();

        Self {
            plan,
            report,
            cells,
            candidates,
        }
    }

    /// Write the table as pretty-printed JSON
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or serialization fails
    pub fn write_json(&self, output_path: &Path) -> Result<()> {
        let file = File::create(output_path).map_err(|e| MosaicError::FileSystem {
            path: output_path.to_path_buf(),
            operation: "create assignment table",
            source: e,
        })?;

        serde_json::to_writer_pretty(BufWriter::new(file), self).map_err(|e| {
            MosaicError::Serialization {
                path: output_path.to_path_buf(),
                source: e,
            }
        })?;

        tracing::info!(path = %output_path.display(), cells = self.cells.len(), "Wrote assignment table");
        Ok(())
    }
}

/// Render each cell as a flat block of its target color
///
/// Useful for checking that targets were sampled correctly before any
/// candidate is placed.
pub fn signature_preview(plan: &GridPlan, cells: &[Cell]) -> RgbImage {
    let mut preview = RgbImage::new(plan.mosaic_width, plan.mosaic_height);
    for cell in cells {
        let rgb = cell.target.to_rgb();
        for y in 0..cell.size.1 {
            for x in 0..cell.size.0 {
                preview.set_pixel(cell.offset.0 + x, cell.offset.1 + y, rgb);
            }
        }
    }
    preview
}
