//! Color analysis of reference cells and candidate images

/// Candidate enumeration results and the signed registry
pub mod candidates;
/// RMS color signatures over pixel regions
pub mod signature;
