//! Content directory scanning.
//!
//! The content directory is flat: every supported image sits directly in
//! it, no recursion. Discovery is sorted by filename so every downstream
//! stage sees a deterministic order.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Extensions (lowercased) accepted as gallery sources.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("content directory not found: {0}")]
    MissingContentDir(PathBuf),
}

/// List supported images in the content directory, sorted by filename.
/// Subdirectories and unsupported extensions are skipped silently.
pub fn discover_images(content_dir: &Path) -> Result<Vec<PathBuf>, ScanError> {
    if !content_dir.is_dir() {
        return Err(ScanError::MissingContentDir(content_dir.to_path_buf()));
    }
    let mut images = Vec::new();
    for entry in fs::read_dir(content_dir)? {
        let path = entry?.path();
        if path.is_file() && is_supported(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Find file stems shared by more than one source, case-insensitively.
///
/// Thumbnails are named by stem, so `Photo.jpg` and `photo.png` would
/// collide in the output directory. Returns the offending stems sorted.
pub fn find_duplicate_stems(images: &[PathBuf]) -> Vec<String> {
    let mut seen: std::collections::HashMap<String, u32> = std::collections::HashMap::new();
    for image in images {
        if let Some(stem) = image.file_stem().and_then(|s| s.to_str()) {
            *seen.entry(stem.to_ascii_lowercase()).or_default() += 1;
        }
    }
    let mut duplicates: Vec<String> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(stem, _)| stem)
        .collect();
    duplicates.sort();
    duplicates
}

/// Read pixel dimensions from the image header. Unreadable files log a
/// warning and yield `None`; the caller decides whether that matters.
pub fn read_dimensions(path: &Path) -> Option<(u32, u32)> {
    match image::image_dimensions(path) {
        Ok(dims) => Some(dims),
        Err(err) => {
            warn!("cannot read dimensions of {}: {err}", path.display());
            None
        }
    }
}
