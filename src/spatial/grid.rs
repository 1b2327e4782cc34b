//! Mosaic cells and the shared assignment grid
//!
//! Cells are stored row-major; the linear index `row * cols + col` fixes the
//! order in which the fitter visits them. The assignment grid records which
//! candidate each cell holds so spatial exclusion can inspect neighbours.

use std::ops::Range;

use ndarray::Array2;
use serde::Serialize;

use crate::analysis::signature::Signature;

/// One grid position of the mosaic
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    /// Grid row
    pub row: usize,
    /// Grid column
    pub col: usize,
    /// Row-major linear index
    pub index: usize,
    /// Pixel offset (x, y) in the composite
    pub offset: (u32, u32),
    /// Pixel size (width, height) in the composite
    pub size: (u32, u32),
    /// Target color sampled from the reference image
    pub target: Signature,
    /// Candidate index placed in this cell, once fitted
    pub assigned: Option<usize>,
}

impl Cell {
    /// Create an unassigned cell of a grid with `cols` columns
    pub const fn new(
        row: usize,
        col: usize,
        cols: usize,
        offset: (u32, u32),
        size: (u32, u32),
        target: Signature,
    ) -> Self {
        Self {
            row,
            col,
            index: linear_index(row, col, cols),
            offset,
            size,
            target,
            assigned: None,
        }
    }
}

/// Row-major linear index of (row, col)
pub const fn linear_index(row: usize, col: usize, cols: usize) -> usize {
    row * cols + col
}

/// Grid (row, col) of a row-major linear index
pub const fn grid_position(index: usize, cols: usize) -> (usize, usize) {
    if cols == 0 {
        return (0, 0);
    }
    (index / cols, index % cols)
}

/// Row and column ranges within Chebyshev distance `radius` of (row, col)
///
/// Ranges are clamped to the grid and include the centre position.
pub fn neighbourhood_spans(
    row: usize,
    col: usize,
    radius: usize,
    rows: usize,
    cols: usize,
) -> (Range<usize>, Range<usize>) {
    let row_start = row.saturating_sub(radius);
    let col_start = col.saturating_sub(radius);
    let row_end = row.saturating_add(radius).saturating_add(1).min(rows);
    let col_end = col.saturating_add(radius).saturating_add(1).min(cols);

    (row_start..row_end.max(row_start), col_start..col_end.max(col_start))
}

/// Candidate held by each cell, written once per cell
#[derive(Debug, Clone)]
pub struct AssignmentGrid {
    slots: Array2<Option<usize>>,
}

impl AssignmentGrid {
    /// Create an empty grid
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            slots: Array2::from_elem((rows, cols), None),
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.slots.nrows()
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.slots.ncols()
    }

    /// Candidate held at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Option<usize> {
        self.slots.get([row, col]).copied().flatten()
    }

    /// Record `candidate` at (row, col)
    ///
    /// Returns `false` without writing if the position is outside the grid
    /// or already assigned.
    pub fn assign(&mut self, row: usize, col: usize, candidate: usize) -> bool {
        match self.slots.get_mut([row, col]) {
            Some(slot) if slot.is_none() => {
                *slot = Some(candidate);
                true
            }
            _ => false,
        }
    }

    /// Whether any assigned cell within Chebyshev distance `radius` of
    /// (row, col) holds `candidate`
    ///
    /// Costs O(radius²) per call.
    pub fn holds_nearby(&self, row: usize, col: usize, radius: usize, candidate: usize) -> bool {
        let (mut row_span, col_span) =
            neighbourhood_spans(row, col, radius, self.rows(), self.cols());

        row_span.any(|r| {
            col_span
                .clone()
                .any(|c| self.slots.get([r, c]).copied().flatten() == Some(candidate))
        })
    }

    /// Number of assigned cells
    pub fn assigned_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}
