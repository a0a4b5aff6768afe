//! Gallery metadata file handling.
//!
//! `gallery.yaml` is the user's editing surface: a list of category names
//! in display order plus one entry per image (category, optional title and
//! description). The build keeps it in sync with the content directory by
//! appending stub entries for newly discovered images; it never deletes or
//! reorders what the user wrote.
//!
//! ```yaml
//! categories:
//!   - Travel
//!   - Uncategorized
//! images:
//!   - filename: sunset.jpg
//!     category: Travel
//!     title: Golden hour
//!   - filename: new-photo.jpg
//!     category: Uncategorized
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse gallery file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("duplicate gallery entries: {0}")]
    DuplicateEntries(String),
}

/// One user-editable metadata entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YamlEntry {
    pub filename: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The whole gallery document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GalleryFile {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub images: Vec<YamlEntry>,
}

/// Load the gallery document. A missing file is the first-run case and
/// yields a fresh document seeded with the default category; a present
/// but unparseable file is a fatal error (never clobber user edits).
pub fn load_gallery_file(path: &Path, default_category: &str) -> Result<GalleryFile, SyncError> {
    if !path.is_file() {
        return Ok(GalleryFile {
            categories: vec![default_category.to_string()],
            images: Vec::new(),
        });
    }
    let content = fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

pub fn save_gallery_file(path: &Path, gallery: &GalleryFile) -> Result<(), SyncError> {
    let yaml = serde_yaml::to_string(gallery)?;
    fs::write(path, yaml)?;
    Ok(())
}

/// Reject documents listing the same filename twice; which entry wins
/// would otherwise be silent and order-dependent.
pub fn check_duplicates(gallery: &GalleryFile) -> Result<(), SyncError> {
    let mut seen: HashMap<&str, u32> = HashMap::new();
    for entry in &gallery.images {
        *seen.entry(entry.filename.as_str()).or_default() += 1;
    }
    let mut duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect();
    if duplicates.is_empty() {
        return Ok(());
    }
    duplicates.sort_unstable();
    Err(SyncError::DuplicateEntries(duplicates.join(", ")))
}

/// Append stub entries for scanned images the document does not know yet,
/// under the default category. Ensures the default category is declared
/// whenever a stub needs it. Returns the filenames that were added.
pub fn sync_stub_entries(
    gallery: &mut GalleryFile,
    scanned: &[PathBuf],
    default_category: &str,
) -> Vec<String> {
    let known: std::collections::HashSet<&str> =
        gallery.images.iter().map(|e| e.filename.as_str()).collect();
    let mut added = Vec::new();
    for path in scanned {
        let Some(filename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !known.contains(filename) {
            added.push(filename.to_string());
        }
    }
    if added.is_empty() {
        return added;
    }
    if !gallery.categories.iter().any(|c| c == default_category) {
        gallery.categories.push(default_category.to_string());
    }
    for filename in &added {
        gallery.images.push(YamlEntry {
            filename: filename.clone(),
            category: default_category.to_string(),
            title: None,
            description: None,
        });
        info!("added stub entry for {filename}");
    }
    added
}

/// Index the document's entries by filename for the assembler.
pub fn entry_map(gallery: &GalleryFile) -> HashMap<&str, &YamlEntry> {
    gallery
        .images
        .iter()
        .map(|entry| (entry.filename.as_str(), entry))
        .collect()
}
