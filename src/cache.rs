//! Incremental build cache for the thumbnail pipeline.
//!
//! Decoding, resizing, and dual-format encoding dominate build time, so
//! unchanged sources must be skipped. Each source file gets one entry
//! recording its last-known outputs, content hash, and enough derived data
//! (dimensions, byte sizes, blur placeholder fields) to rebuild a full
//! thumbnail record without reopening the image.
//!
//! # Freshness
//!
//! Two checks, cheap one first:
//!
//! 1. **Coarse** ([`BuildCache::should_regenerate`]): mtime only. An entry
//!    whose stored mtime is not older than the file's current mtime passes.
//! 2. **Fine** ([`CacheEntry::is_valid`]): content hash comparison plus a
//!    config check — when blur placeholders are enabled, an entry without
//!    placeholder data is stale even if the pixels are unchanged. This
//!    catches touched-but-identical files and config flips that mtime
//!    cannot see.
//!
//! # Storage
//!
//! One JSON document per output directory. The whole table is loaded once
//! at batch start and flushed once at batch end; a crash mid-batch leaves
//! the on-disk file at the previous build's state, never half-written.
//! A version mismatch or any parse error discards the entire cache —
//! a full rebuild is always safe, a partially-trusted cache is not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the cache document within the output directory.
const CACHE_FILENAME: &str = ".build-cache.json";

/// Version tag of the cache format. Bump to invalidate all existing
/// caches when fields or key computation change.
pub const CACHE_VERSION: &str = "1.0";

/// One row of the build cache: everything needed to decide freshness and
/// to reconstruct a thumbnail record on a hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub source_path: String,
    /// Seconds since the epoch at last build, fractional.
    pub source_mtime: f64,
    pub webp_path: String,
    pub jpeg_path: String,
    pub content_hash: String,
    pub thumbnail_generated_at: DateTime<Utc>,
    pub metadata_stripped: bool,
    pub width: u32,
    pub height: u32,
    pub webp_size_bytes: u64,
    pub jpeg_size_bytes: u64,
    pub source_size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_placeholder_data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_placeholder_dimensions: Option<(u32, u32)>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_placeholder_size_bytes: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_placeholder_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur_placeholder_generated_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    /// Fine-grained validity: content unchanged, and placeholder data
    /// present whenever the current configuration requires it.
    pub fn is_valid(&self, current_hash: &str, placeholder_required: bool) -> bool {
        self.content_hash == current_hash
            && (!placeholder_required || self.blur_placeholder_data_url.is_some())
    }
}

/// The persisted cache table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildCache {
    pub entries: HashMap<String, CacheEntry>,
    pub cache_version: String,
    pub last_updated: DateTime<Utc>,
}

impl BuildCache {
    /// An empty cache (first build, `--no-cache`, or invalidation).
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            cache_version: CACHE_VERSION.to_string(),
            last_updated: Utc::now(),
        }
    }

    /// Load from the output directory. Missing file, unparseable JSON, and
    /// version mismatches all yield an empty cache — cache problems are
    /// never build errors, only slower builds.
    pub fn load(output_dir: &Path) -> Self {
        let path = cache_path(output_dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(_) => return Self::empty(),
        };
        let cache: Self = match serde_json::from_str(&content) {
            Ok(cache) => cache,
            Err(err) => {
                debug!("discarding unreadable cache {}: {err}", path.display());
                return Self::empty();
            }
        };
        if cache.cache_version != CACHE_VERSION {
            debug!(
                "discarding cache with version {} (expected {CACHE_VERSION})",
                cache.cache_version
            );
            return Self::empty();
        }
        cache
    }

    /// Flush to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(cache_path(output_dir), json)
    }

    pub fn get(&self, source: &Path) -> Option<&CacheEntry> {
        self.entries.get(&key_for(source))
    }

    /// Coarse pre-check: regenerate when no entry exists or the file's
    /// current mtime is newer than the stored one. Deliberately avoids
    /// hashing so a no-change build stays cheap.
    pub fn should_regenerate(&self, source: &Path) -> bool {
        let Some(entry) = self.get(source) else {
            return true;
        };
        match source_mtime(source) {
            Ok(current) => current > entry.source_mtime,
            Err(_) => true,
        }
    }

    /// Overwrite (never merge) the entry for its source path and bump the
    /// table's last-updated timestamp.
    pub fn update_entry(&mut self, entry: CacheEntry) {
        self.entries.insert(entry.source_path.clone(), entry);
        self.last_updated = Utc::now();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn key_for(source: &Path) -> String {
    source.to_string_lossy().into_owned()
}

/// Resolve the cache document path for an output directory.
pub fn cache_path(output_dir: &Path) -> PathBuf {
    output_dir.join(CACHE_FILENAME)
}

/// A file's mtime as fractional seconds since the epoch. Pre-epoch
/// timestamps clamp to zero.
pub fn source_mtime(path: &Path) -> io::Result<f64> {
    let modified = std::fs::metadata(path)?.modified()?;
    Ok(modified
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64())
}

/// Per-batch pipeline counters for the summary log line.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub hits: u32,
    pub regenerated: u32,
    pub failed: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn regenerate(&mut self) {
        self.regenerated += 1;
    }

    pub fn fail(&mut self) {
        self.failed += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.regenerated + self.failed
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} cached, {} generated, {} failed ({} total)",
                self.hits,
                self.regenerated,
                self.failed,
                self.total()
            )
        } else if self.hits > 0 {
            write!(
                f,
                "{} cached, {} generated ({} total)",
                self.hits,
                self.regenerated,
                self.total()
            )
        } else {
            write!(f, "{} generated", self.regenerated)
        }
    }
}
