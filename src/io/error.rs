//! Error types and path context for mosaic assembly

use std::fmt;
use std::path::{Path, PathBuf};

/// Main error type for all mosaic operations
#[derive(Debug)]
pub enum MosaicError {
    /// Failed to decode an image from the filesystem
    ImageLoad {
        /// Path to the image file
        path: PathBuf,
        /// Underlying image decoding error
        source: image::ImageError,
    },

    /// Reference image is unreadable or cannot be partitioned into the grid
    InvalidReferenceImage {
        /// Description of what's wrong with the reference image
        reason: String,
    },

    /// No tile crop satisfies the aspect-ratio tolerance
    ///
    /// The caller must raise the tolerance or supply a different reference.
    AspectRatioUnreachable {
        /// Tolerance that could not be met
        tolerance: f32,
        /// Aspect ratio of the reference image
        reference_aspect: f32,
        /// Last tile dimension tested before the scan hit its floor
        last_tested: u32,
    },

    /// Signature region has zero area
    EmptyRegion {
        /// Requested region width
        width: u32,
        /// Requested region height
        height: u32,
    },

    /// Signature region lies entirely outside the pixel source
    InvalidRegion {
        /// Region origin (x, y)
        origin: (u32, u32),
        /// Pixel source dimensions (width, height)
        bounds: (u32, u32),
    },

    /// Every ranked candidate was rejected for a cell and the exhaustion
    /// policy did not allow a fallback
    RepeatBudgetExhausted {
        /// Linear row-major index of the cell
        cell: usize,
        /// Cell row
        row: usize,
        /// Cell column
        col: usize,
    },

    /// Candidate set is empty or unusable
    NoCandidates {
        /// Description of why no candidates are available
        reason: String,
    },

    /// Configuration parameter validation failed
    InvalidParameter {
        /// Name of the invalid parameter
        parameter: &'static str,
        /// Provided value that failed validation
        value: String,
        /// Explanation of why the value is invalid
        reason: String,
    },

    /// Candidate index exceeds the registry
    InvalidCandidateIndex {
        /// The invalid candidate index
        index: usize,
        /// Number of registered candidates
        candidate_count: usize,
    },

    /// Failed to save an image to disk
    ImageExport {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying image encoding error
        source: image::ImageError,
    },

    /// Failed to serialize the assignment table
    Serialization {
        /// Path where export was attempted
        path: PathBuf,
        /// Underlying serialization error
        source: serde_json::Error,
    },

    /// General file system operation failure
    FileSystem {
        /// Path involved in the operation
        path: PathBuf,
        /// Description of the operation that failed
        operation: &'static str,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

impl fmt::Display for MosaicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ImageLoad { path, source } => {
                write!(f, "Failed to load image '{}': {source}", path.display())
            }
            Self::InvalidReferenceImage { reason } => {
                write!(f, "Invalid reference image: {reason}")
            }
            Self::AspectRatioUnreachable {
                tolerance,
                reference_aspect,
                last_tested,
            } => {
                write!(
                    f,
                    "No tile crop within {tolerance} of reference aspect {reference_aspect} \
                     (gave up at {last_tested} px); raise the tolerance or use another reference"
                )
            }
            Self::EmptyRegion { width, height } => {
                write!(f, "Signature region {width}x{height} has zero area")
            }
            Self::InvalidRegion { origin, bounds } => {
                write!(
                    f,
                    "Signature region at ({}, {}) lies outside {}x{} source",
                    origin.0, origin.1, bounds.0, bounds.1
                )
            }
            Self::RepeatBudgetExhausted { cell, row, col } => {
                write!(
                    f,
                    "Repeat budget exhausted at cell {cell} (row {row}, column {col})"
                )
            }
            Self::NoCandidates { reason } => {
                write!(f, "No candidate images: {reason}")
            }
            Self::InvalidParameter {
                parameter,
                value,
                reason,
            } => {
                write!(f, "Invalid parameter '{parameter}' = '{value}': {reason}")
            }
            Self::InvalidCandidateIndex {
                index,
                candidate_count,
            } => {
                write!(
                    f,
                    "Candidate index {index} is out of bounds ({candidate_count} candidates)"
                )
            }
            Self::ImageExport { path, source } => {
                write!(
                    f,
                    "Failed to export image to '{}': {source}",
                    path.display()
                )
            }
            Self::Serialization { path, source } => {
                write!(
                    f,
                    "Failed to write assignment table '{}': {source}",
                    path.display()
                )
            }
            Self::FileSystem {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "File system error during {operation} on '{}': {source}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for MosaicError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ImageLoad { source, .. } | Self::ImageExport { source, .. } => Some(source),
            Self::FileSystem { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for mosaic results
pub type Result<T> = std::result::Result<T, MosaicError>;

/// Attaches the offending path to errors raised by path-less conversions
pub trait WithPath<T> {
    /// Replace the placeholder path of a load or file system error
    ///
    /// # Errors
    ///
    /// Propagates the original error with the path applied
    fn with_path(self, path: &Path) -> Result<T>;
}

impl<T, E> WithPath<T> for std::result::Result<T, E>
where
    E: Into<MosaicError>,
{
    fn with_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| {
            let mut error = e.into();
            match &mut error {
                MosaicError::ImageLoad { path: p, .. }
                | MosaicError::ImageExport { path: p, .. }
                | MosaicError::Serialization { path: p, .. }
                | MosaicError::FileSystem { path: p, .. } => {
                    *p = path.to_path_buf();
                }
                _ => {}
            }
            error
        })
    }
}

impl From<image::ImageError> for MosaicError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageLoad {
            path: PathBuf::from("<unknown>"),
            source: err,
        }
    }
}

impl From<std::io::Error> for MosaicError {
    fn from(err: std::io::Error) -> Self {
        Self::FileSystem {
            path: PathBuf::from("<unknown>"),
            operation: "unknown",
            source: err,
        }
    }
}

/// Create an invalid parameter error
pub fn invalid_parameter(
    parameter: &'static str,
    value: &impl ToString,
    reason: &impl ToString,
) -> MosaicError {
    MosaicError::InvalidParameter {
        parameter,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// Create an invalid reference image error
pub fn invalid_reference(reason: &impl ToString) -> MosaicError {
    MosaicError::InvalidReferenceImage {
        reason: reason.to_string(),
    }
}
