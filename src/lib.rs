//! Greedy photo-mosaic assembly
//!
//! A reference image is partitioned into a square grid of cells, each scored
//! by its RMS color. Candidate images are signed the same way, ranked per
//! cell, and assigned greedily in row-major order under a repeat cap and an
//! optional spatial exclusion radius. Assigned candidates are then stamped
//! into the composite, optionally tinted toward each cell's dominant channel.

#![forbid(unsafe_code)]

/// Ranking, greedy fitting, compositing and the staged engine
pub mod algorithm;
/// Color signatures and the candidate registry
pub mod analysis;
/// Input/output operations, configuration and error handling
pub mod io;
/// Pixel access, grid planning and cell bookkeeping
pub mod spatial;

pub use io::error::{MosaicError, Result};
