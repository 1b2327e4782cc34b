//! Candidate image registry
//!
//! Candidates are enumerated once with their dimensions, then signed over the
//! tile-sized crop that will actually be stamped into the mosaic. After
//! signing the registry is read-only; placement counts live with the fitter.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::Serialize;

use crate::analysis::signature::{Signature, rms_signature};
use crate::io::error::{MosaicError, Result};
use crate::spatial::pixels::{PixelSource, Region};

/// Candidate discovered by enumeration, before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    /// Opaque handle identifying the candidate (its source path)
    pub source: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl CandidateEntry {
    /// Create an entry from a handle and dimensions
    pub const fn new(source: PathBuf, width: u32, height: u32) -> Self {
        Self {
            source,
            width,
            height,
        }
    }
}

/// Signed candidate image
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateImage {
    /// Opaque handle identifying the candidate (its source path)
    pub source: PathBuf,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// RMS color over the tile-sized crop
    pub signature: Signature,
}

/// Smallest width and smallest height across the candidate set
///
/// The two minimums are taken independently and may come from different
/// candidates.
///
/// # Errors
///
/// Returns an error if there are no entries or any entry has a zero dimension
pub fn minimum_dimensions(entries: &[CandidateEntry]) -> Result<(u32, u32)> {
    if let Some(entry) = entries.iter().find(|e| e.width == 0 || e.height == 0) {
        return Err(MosaicError::NoCandidates {
            reason: format!("'{}' has zero width or height", entry.source.display()),
        });
    }

    let width = entries.iter().map(|e| e.width).min();
    let height = entries.iter().map(|e| e.height).min();
    width.zip(height).ok_or_else(|| MosaicError::NoCandidates {
        reason: "candidate set is empty".to_string(),
    })
}

/// Indexed, read-only candidate set
///
/// Candidate indices are positions in enumeration order and are used
/// throughout ranking, fitting and compositing.
#[derive(Debug, Clone)]
pub struct CandidateRegistry {
    candidates: Vec<CandidateImage>,
}

impl CandidateRegistry {
    /// Build a registry from already signed candidates
    ///
    /// # Errors
    ///
    /// Returns an error if `candidates` is empty
    pub fn from_images(candidates: Vec<CandidateImage>) -> Result<Self> {
        if candidates.is_empty() {
            return Err(MosaicError::NoCandidates {
                reason: "candidate set is empty".to_string(),
            });
        }
        Ok(Self { candidates })
    }

    /// Sign every entry over its `tile_width` x `tile_height` crop
    ///
    /// `load` is called once per entry, possibly from several threads.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `entries` is empty
    /// - `load` fails for any entry
    /// - A signature region is empty or outside the loaded pixels
    pub fn sign<S, F>(
        entries: &[CandidateEntry],
        tile_width: u32,
        tile_height: u32,
        load: F,
    ) -> Result<Self>
    where
        S: PixelSource,
        F: Fn(usize, &CandidateEntry) -> Result<S> + Sync,
    {
        let crop = Region::new(0, 0, tile_width, tile_height);
        let candidates = entries
            .par_iter()
            .enumerate()
            .map(|(index, entry)| {
                let pixels = load(index, entry)?;
                let signature = rms_signature(&pixels, crop)?;
                tracing::trace!(index, source = %entry.source.display(), ?signature, "Signed candidate");
                Ok(CandidateImage {
                    source: entry.source.clone(),
                    width: entry.width,
                    height: entry.height,
                    signature,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_images(candidates)
    }

    /// Number of candidates
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Whether the registry holds no candidates
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Candidate at `index`
    pub fn get(&self, index: usize) -> Option<&CandidateImage> {
        self.candidates.get(index)
    }

    /// Iterate candidates in index order
    pub fn iter(&self) -> std::slice::Iter<'_, CandidateImage> {
        self.candidates.iter()
    }
}
