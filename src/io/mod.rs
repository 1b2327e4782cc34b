/// Command-line parsing and batch processing
pub mod cli;
/// Constants and defaults
pub mod configuration;
/// Error types
pub mod error;
/// Assignment table and signature preview export
pub mod export;
/// Image decoding, enumeration and saving
pub mod image;
/// Tracing subscriber setup
pub mod logging;
/// Progress display
pub mod progress;
