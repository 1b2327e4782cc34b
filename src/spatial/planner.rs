//! Grid planning: tile crop size, mosaic dimensions and per-cell targets
//!
//! Tiles are cropped from the smallest candidate dimensions so that the tile
//! aspect ratio matches the reference within a tolerance. The crop is found by
//! scanning the cropped dimension downward one pixel at a time in single
//! precision; the first dimension within tolerance wins, not the closest.

use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::signature::rms_signature;
use crate::io::configuration::{MAX_GRID_SIZE, MIN_TILE_DIMENSION};
use crate::io::error::{MosaicError, Result, invalid_parameter, invalid_reference};
use crate::spatial::grid::{Cell, grid_position};
use crate::spatial::pixels::{PixelSource, Region};

/// Dimension reduced to bring the tile aspect ratio in line with the reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CropAxis {
    /// Tile height was scanned downward; width is the candidate minimum
    Height,
    /// Tile width was scanned downward; height is the candidate minimum
    Width,
}

/// Tile and mosaic geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPlan {
    /// Tile width in pixels
    pub tile_width: u32,
    /// Tile height in pixels
    pub tile_height: u32,
    /// Number of grid rows
    pub rows: usize,
    /// Number of grid columns
    pub cols: usize,
    /// Composite width in pixels (`tile_width * cols`)
    pub mosaic_width: u32,
    /// Composite height in pixels (`tile_height * rows`)
    pub mosaic_height: u32,
    /// Reference pixels per cell horizontally (truncated)
    pub stride_x: u32,
    /// Reference pixels per cell vertically (truncated)
    pub stride_y: u32,
    /// Dimension that was cropped
    pub crop_axis: CropAxis,
}

impl GridPlan {
    /// Total number of cells
    pub const fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    /// Reference sub-rectangle scored for the cell at (row, col)
    ///
    /// Cells tile the area `stride_x * cols` by `stride_y * rows` from the
    /// origin; remainder pixels at the right and bottom edges are never
    /// scored.
    pub const fn sample_region(&self, row: usize, col: usize) -> Region {
        Region::new(
            col as u32 * self.stride_x,
            row as u32 * self.stride_y,
            self.stride_x,
            self.stride_y,
        )
    }

    /// Pixel offset of the cell at (row, col) in the composite
    pub const fn tile_offset(&self, row: usize, col: usize) -> (u32, u32) {
        (col as u32 * self.tile_width, row as u32 * self.tile_height)
    }
}

/// Grid plan together with its scored cells
#[derive(Debug, Clone)]
pub struct PlannedGrid {
    /// Tile and mosaic geometry
    pub plan: GridPlan,
    /// Row-major cells with target signatures, unassigned
    pub cells: Vec<Cell>,
}

/// Find the tile crop for a reference and the candidate minimums
///
/// Returns `(tile_width, tile_height, axis)`. When the candidate aspect is
/// narrower than the reference the height is scanned downward from
/// `min_candidate.1`, otherwise the width is scanned downward from
/// `min_candidate.0`. The first dimension within `tolerance` wins.
///
/// # Errors
///
/// Returns an error if:
/// - Any input dimension is zero
/// - The scan reaches [`MIN_TILE_DIMENSION`] without meeting the tolerance
pub fn crop_tile(
    reference: (u32, u32),
    min_candidate: (u32, u32),
    tolerance: f32,
) -> Result<(u32, u32, CropAxis)> {
    if reference.0 == 0 || reference.1 == 0 {
        return Err(invalid_reference(&format!(
            "reference is {}x{}",
            reference.0, reference.1
        )));
    }
    if min_candidate.0 == 0 || min_candidate.1 == 0 {
        return Err(invalid_parameter(
            "min_candidate",
            &format!("{}x{}", min_candidate.0, min_candidate.1),
            &"candidate dimensions must be non-zero",
        ));
    }

    let reference_aspect = reference.0 as f32 / reference.1 as f32;
    let candidate_aspect = min_candidate.0 as f32 / min_candidate.1 as f32;
    let give_up = |last_tested| MosaicError::AspectRatioUnreachable {
        tolerance,
        reference_aspect,
        last_tested,
    };

    if candidate_aspect < reference_aspect {
        let width = min_candidate.0 as f32;
        for height in (1..=min_candidate.1).rev() {
            if (reference_aspect - width / height as f32).abs() <= tolerance {
                return Ok((min_candidate.0, height, CropAxis::Height));
            }
            if height <= MIN_TILE_DIMENSION {
                return Err(give_up(height));
            }
        }
    } else {
        let height = min_candidate.1 as f32;
        for width in (1..=min_candidate.0).rev() {
            if (reference_aspect - width as f32 / height).abs() <= tolerance {
                return Ok((width, min_candidate.1, CropAxis::Width));
            }
            if width <= MIN_TILE_DIMENSION {
                return Err(give_up(width));
            }
        }
    }

    Err(give_up(1))
}

/// Compute the grid plan for an `grid_size` x `grid_size` mosaic
///
/// # Errors
///
/// Returns an error if:
/// - `grid_size` is zero or above [`MAX_GRID_SIZE`]
/// - `tolerance` is negative or not finite
/// - The reference is smaller than the grid in either dimension
/// - No tile crop satisfies the tolerance
/// - The mosaic dimensions overflow `u32`
pub fn plan_grid(
    reference: (u32, u32),
    min_candidate: (u32, u32),
    grid_size: usize,
    tolerance: f32,
) -> Result<GridPlan> {
    if grid_size == 0 || grid_size > MAX_GRID_SIZE {
        return Err(invalid_parameter(
            "grid_size",
            &grid_size,
            &format!("must be between 1 and {MAX_GRID_SIZE}"),
        ));
    }
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(invalid_parameter(
            "aspect_tolerance",
            &tolerance,
            &"must be a finite non-negative number",
        ));
    }

    let n = grid_size as u32;
    let stride_x = reference.0 / n;
    let stride_y = reference.1 / n;
    if stride_x == 0 || stride_y == 0 {
        return Err(invalid_reference(&format!(
            "{}x{} reference is smaller than a {grid_size}x{grid_size} grid",
            reference.0, reference.1
        )));
    }

    let (tile_width, tile_height, crop_axis) = crop_tile(reference, min_candidate, tolerance)?;

    let mosaic_width = tile_width.checked_mul(n);
    let mosaic_height = tile_height.checked_mul(n);
    let (mosaic_width, mosaic_height) = mosaic_width.zip(mosaic_height).ok_or_else(|| {
        invalid_parameter(
            "grid_size",
            &grid_size,
            &"mosaic dimensions overflow 32-bit pixel coordinates",
        )
    })?;

    Ok(GridPlan {
        tile_width,
        tile_height,
        rows: grid_size,
        cols: grid_size,
        mosaic_width,
        mosaic_height,
        stride_x,
        stride_y,
        crop_axis,
    })
}

/// Score every cell of `plan` against the reference image
///
/// Cells are scored in parallel and returned in row-major order.
///
/// # Errors
///
/// Returns an error if a sample region does not fit the reference
pub fn score_cells<S>(plan: &GridPlan, reference: &S) -> Result<Vec<Cell>>
where
    S: PixelSource + Sync + ?Sized,
{
    (0..plan.cell_count())
        .into_par_iter()
        .map(|index| {
            let (row, col) = grid_position(index, plan.cols);
            let target = rms_signature(reference, plan.sample_region(row, col))?;
            Ok(Cell::new(
                row,
                col,
                plan.cols,
                plan.tile_offset(row, col),
                (plan.tile_width, plan.tile_height),
                target,
            ))
        })
        .collect()
}

/// Plan the grid and score every cell in one step
///
/// # Errors
///
/// Returns an error if planning or scoring fails
pub fn plan_mosaic<S>(
    reference: &S,
    min_candidate: (u32, u32),
    grid_size: usize,
    tolerance: f32,
) -> Result<PlannedGrid>
where
    S: PixelSource + Sync + ?Sized,
{
    let plan = plan_grid(
        (reference.width(), reference.height()),
        min_candidate,
        grid_size,
        tolerance,
    )?;
    let cells = score_cells(&plan, reference)?;

    tracing::info!(
        rows = plan.rows,
        cols = plan.cols,
        tile_width = plan.tile_width,
        tile_height = plan.tile_height,
        mosaic_width = plan.mosaic_width,
        mosaic_height = plan.mosaic_height,
        crop = ?plan.crop_axis,
        "Planned mosaic grid"
    );

    Ok(PlannedGrid { plan, cells })
}
