//! Spatial data structures and grid planning
//!
//! This module contains spatial-related functionality including:
//! - Pixel access traits and regions
//! - Tile crop and grid planning
//! - Cell bookkeeping and the assignment grid

/// Cells and the assignment grid
pub mod grid;
/// Pixel source and sink traits
pub mod pixels;
/// Tile crop search and grid planning
pub mod planner;

pub use grid::{AssignmentGrid, Cell};
