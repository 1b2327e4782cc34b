//! Image decoding, candidate enumeration and export

use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::analysis::candidates::CandidateEntry;
use crate::io::configuration::SUPPORTED_EXTENSIONS;
use crate::io::error::{MosaicError, Result, WithPath};

/// Whether `path` has a supported image extension (case-insensitive)
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| supported.eq_ignore_ascii_case(ext))
        })
}

/// Decode an image as 8-bit RGB
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path).with_path(path)?;
    Ok(img.to_rgb8())
}

/// Decode the reference image
///
/// # Errors
///
/// Returns `InvalidReferenceImage` if the file cannot be opened or decoded
pub fn load_reference(path: &Path) -> Result<RgbImage> {
    load_rgb(path).map_err(|e| MosaicError::InvalidReferenceImage {
        reason: e.to_string(),
    })
}

/// Decode a candidate and keep only its top-left `width` x `height` crop
///
/// # Errors
///
/// Returns an error if the file cannot be opened or decoded
pub fn load_candidate_crop(path: &Path, width: u32, height: u32) -> Result<RgbImage> {
    let img = load_rgb(path)?;
    if img.width() <= width && img.height() <= height {
        return Ok(img);
    }
    Ok(image::imageops::crop_imm(&img, 0, 0, width, height).to_image())
}

/// Enumerate candidate images in `directory`
///
/// Regular files with a supported extension are sorted by path and their
/// dimensions read from the image header. Files whose header cannot be read
/// are skipped with a warning.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be read
/// - No usable candidate images are found
pub fn collect_candidates(directory: &Path) -> Result<Vec<CandidateEntry>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    let entries = std::fs::read_dir(directory).map_err(|e| MosaicError::FileSystem {
        path: directory.to_path_buf(),
        operation: "read candidate directory",
        source: e,
    })?;
    for entry in entries {
        let path = entry.with_path(directory)?.path();
        if path.is_file() && is_supported_image(&path) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut candidates = Vec::with_capacity(paths.len());
    for path in paths {
        match image::image_dimensions(&path) {
            Ok((width, height)) => {
                tracing::trace!(path = %path.display(), width, height, "Found candidate");
                candidates.push(CandidateEntry::new(path, width, height));
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "Skipping unreadable candidate");
            }
        }
    }

    if candidates.is_empty() {
        return Err(MosaicError::NoCandidates {
            reason: format!("no supported images in '{}'", directory.display()),
        });
    }

    tracing::info!(count = candidates.len(), directory = %directory.display(), "Loaded candidate list");
    Ok(candidates)
}

/// Save an RGB image, creating parent directories as needed
///
/// # Errors
///
/// Returns an error if:
/// - The parent directory cannot be created
/// - The image cannot be encoded or written
pub fn save_rgb(img: &RgbImage, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| MosaicError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }
    }

    img.save(output_path)
        .map_err(|e| MosaicError::ImageExport {
            path: output_path.to_path_buf(),
            source: e,
        })?;

    tracing::info!(path = %output_path.display(), width = img.width(), height = img.height(), "Saved image");
    Ok(())
}
