//! Tile stamping with the optional dominant-channel color filter
//!
//! Every cell writes a disjoint tile-sized block of the composite, so blocks
//! are rendered in parallel (one load per distinct candidate) and stamped
//! into the sink afterwards.

use std::collections::BTreeMap;

use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::{
    analysis::signature::Signature,
    io::error::{MosaicError, Result, invalid_parameter},
    spatial::{
        grid::Cell,
        pixels::{CompositeSink, PixelSource},
    },
};

/// Single-channel tint toward the cell target
///
/// Only the target's strictly dominant channel is adjusted:
/// `adjusted = candidate + strength * (target - candidate)`, truncated.
/// Targets without a strictly dominant channel leave pixels unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorFilter {
    strength: f64,
}

impl ColorFilter {
    /// Create a filter with blend factor `strength` in `[0, 1]`
    ///
    /// # Errors
    ///
    /// Returns an error if `strength` is outside `[0, 1]` or not finite
    pub fn new(strength: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&strength) {
            return Err(invalid_parameter(
                "filter_strength",
                &strength,
                &"must lie within [0, 1]",
            ));
        }
        Ok(Self { strength })
    }

    /// Blend factor
    pub const fn strength(&self) -> f64 {
        self.strength
    }

    /// Apply the tint for `target` to one candidate pixel
    pub fn apply(&self, pixel: [u8; 3], target: &Signature) -> [u8; 3] {
        let Some(channel) = target.dominant_channel() else {
            return pixel;
        };

        let mut adjusted = pixel;
        if let Some(value) = adjusted.get_mut(channel.index()) {
            let current = f64::from(*value);
            let blended = self
                .strength
                .mul_add(target.channel(channel) - current, current);
            *value = num_traits::clamp(blended.trunc(), 0.0, 255.0)
                .to_u8()
                .unwrap_or(u8::MAX);
        }
        adjusted
    }
}

/// Rendered pixels for one cell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileBlock {
    /// Row-major index of the cell
    pub cell: usize,
    /// Pixel offset (x, y) in the composite
    pub offset: (u32, u32),
    /// Block width in pixels
    pub width: u32,
    /// Block height in pixels
    pub height: u32,
    pixels: Vec<[u8; 3]>,
}

impl TileBlock {
    /// Pixel at (x, y) within the block
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels
            .get(y as usize * self.width as usize + x as usize)
            .copied()
    }
}

/// Render the block for `cell` from its candidate's pixels
///
/// The block is the cell-sized crop from the candidate's origin, clipped to
/// the candidate bounds, with `filter` applied when present.
pub fn render_block<S: PixelSource + ?Sized>(
    source: &S,
    cell: &Cell,
    filter: Option<&ColorFilter>,
) -> TileBlock {
    let width = cell.size.0.min(source.width());
    let height = cell.size.1.min(source.height());

    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for y in 0..height {
        for x in 0..width {
            let rgb = source.pixel(x, y);
            pixels.push(filter.map_or(rgb, |f| f.apply(rgb, &cell.target)));
        }
    }

    TileBlock {
        cell: cell.index,
        offset: cell.offset,
        width,
        height,
        pixels,
    }
}

/// Render blocks for every assigned cell
///
/// `load` is called once per distinct assigned candidate, possibly from
/// several threads. Blocks are returned in cell order.
///
/// # Errors
///
/// Returns an error if:
/// - A cell has no assigned candidate
/// - `load` fails for any candidate
pub fn render_blocks<S, F>(
    cells: &[Cell],
    filter: Option<ColorFilter>,
    load: F,
) -> Result<Vec<TileBlock>>
where
    S: PixelSource,
    F: Fn(usize) -> Result<S> + Sync,
{
    let mut by_candidate: BTreeMap<usize, Vec<&Cell>> = BTreeMap::new();
    for cell in cells {
        let candidate = cell.assigned.ok_or_else(|| {
            invalid_parameter("assignment", &cell.index, &"cell has no assigned candidate")
        })?;
        by_candidate.entry(candidate).or_default().push(cell);
    }

    let groups: Vec<(usize, Vec<&Cell>)> = by_candidate.into_iter().collect();
    let rendered = groups
        .into_par_iter()
        .map(|(candidate, group)| {
            let source = load(candidate)?;
            tracing::trace!(candidate, cells = group.len(), "Rendering candidate blocks");
            Ok(group
                .into_iter()
                .map(|cell| render_block(&source, cell, filter.as_ref()))
                .collect::<Vec<_>>())
        })
        .collect::<Result<Vec<_>>>()?;

    let mut blocks: Vec<TileBlock> = rendered.into_iter().flatten().collect();
    blocks.sort_by_key(|block| block.cell);
    Ok(blocks)
}

/// Write `block` into `sink` at its offset
pub fn stamp<K: CompositeSink + ?Sized>(sink: &mut K, block: &TileBlock) {
    for y in 0..block.height {
        for x in 0..block.width {
            if let Some(rgb) = block.pixel(x, y) {
                sink.set_pixel(block.offset.0 + x, block.offset.1 + y, rgb);
            }
        }
    }
}

/// Render and stamp every cell into `sink`
///
/// # Errors
///
/// Returns an error if rendering fails; the sink is untouched in that case
pub fn composite<S, F, K>(
    cells: &[Cell],
    filter: Option<ColorFilter>,
    load: F,
    sink: &mut K,
) -> Result<()>
where
    S: PixelSource,
    F: Fn(usize) -> Result<S> + Sync,
    K: CompositeSink + ?Sized,
{
    let blocks = render_blocks(cells, filter, load)?;
    for block in &blocks {
        stamp(sink, block);
    }
    tracing::debug!(blocks = blocks.len(), "Stamped composite");
    Ok(())
}

/// Look up the assigned candidate of every cell
///
/// # Errors
///
/// Returns an error if a cell is unassigned or refers to a candidate at or
/// beyond `candidate_count`
pub fn assigned_candidates(cells: &[Cell], candidate_count: usize) -> Result<Vec<usize>> {
    cells
        .iter()
        .map(|cell| match cell.assigned {
            Some(index) if index < candidate_count => Ok(index),
            Some(index) => Err(MosaicError::InvalidCandidateIndex {
                index,
                candidate_count,
            }),
            None => Err(invalid_parameter(
                "assignment",
                &cell.index,
                &"cell has no assigned candidate",
            )),
        })
        .collect()
}
