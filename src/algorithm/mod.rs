/// Tile stamping and the dominant-channel color filter
pub mod compositing;
/// Staged mosaic engine and its configuration
pub mod executor;
/// Greedy assignment under the repeat cap and spatial exclusion
pub mod fitting;
/// Per-cell candidate ordering by color distance
pub mod ranking;
