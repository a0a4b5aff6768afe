//! Thumbnail generation service.
//!
//! Drives the per-image pipeline and the batch loop over all scanned
//! sources. Per image:
//!
//! ```text
//! exists? → cache coarse check → cache fine check ──hit──→ rebuild record
//!                │                                          from entry
//!                └──miss──→ decode → orient → flatten → resize
//!                           → stale-output cleanup
//!                           → EXIF filter → WebP + JPEG encode
//!                           → blur placeholder → record + cache update
//! ```
//!
//! # Failure policy
//!
//! A missing source is a precondition violation and surfaces as
//! [`ThumbnailError::SourceNotFound`]. Every other per-image failure —
//! corrupt file, codec error, unwritable output — is recoverable: the
//! batch driver logs it, counts it, and moves on. One malformed photo
//! must never abort a build.
//!
//! The batch is strictly sequential. The target workload is tens to low
//! hundreds of images, and sequential processing keeps the shared cache
//! and stale-output cleanup race-free without locks.

use crate::cache::{self, BuildCache, CacheEntry, CacheStats};
use crate::config::{PlaceholderConfig, ThumbnailsConfig};
use crate::exif;
use crate::hashing::hash_bytes;
use crate::imaging::{
    BlurPlaceholder, apply_orientation, calculate_thumbnail_dimensions, encode, flatten_to_rgb,
    generate_blur_placeholder,
};
use chrono::{DateTime, Utc};
use image::{AnimationDecoder, ColorType, ImageFormat, ImageReader};
use image::codecs::gif::GifDecoder;
use image::imageops::FilterType;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum ThumbnailError {
    #[error("source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("source has no usable file name: {0}")]
    InvalidFileName(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Read-only snapshot of a source image's properties. Recomputed on every
/// regeneration, never cached on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata {
    pub format: Option<ImageFormat>,
    pub width: u32,
    pub height: u32,
    pub color: ColorType,
    pub has_alpha: bool,
    pub is_animated: bool,
    pub frame_count: u32,
    /// EXIF orientation (1-8), if stored.
    pub orientation: Option<u16>,
    /// Print resolution in whole DPI, if stored.
    pub dpi: Option<(u32, u32)>,
}

/// The durable work product of the pipeline for one source image.
/// Immutable once assembled; a changed source produces a new record.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRecord {
    pub filename: String,
    pub source_path: PathBuf,
    pub webp_path: PathBuf,
    pub jpeg_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub webp_size_bytes: u64,
    pub jpeg_size_bytes: u64,
    pub source_size_bytes: u64,
    /// 8 lowercase hex chars over the source bytes.
    pub content_hash: String,
    pub generated_at: DateTime<Utc>,
    /// Whether privacy filtering verifiably succeeded. When false the
    /// outputs carry no EXIF at all and `strip_warning` says why.
    pub metadata_stripped: bool,
    pub strip_warning: Option<String>,
    pub blur_placeholder: Option<BlurPlaceholder>,
}

impl ThumbnailRecord {
    /// Flatten into a cache row keyed by source path.
    pub fn to_cache_entry(&self, source_mtime: f64) -> CacheEntry {
        let blur = self.blur_placeholder.as_ref();
        CacheEntry {
            source_path: self.source_path.to_string_lossy().into_owned(),
            source_mtime,
            webp_path: self.webp_path.to_string_lossy().into_owned(),
            jpeg_path: self.jpeg_path.to_string_lossy().into_owned(),
            content_hash: self.content_hash.clone(),
            thumbnail_generated_at: self.generated_at,
            metadata_stripped: self.metadata_stripped,
            width: self.width,
            height: self.height,
            webp_size_bytes: self.webp_size_bytes,
            jpeg_size_bytes: self.jpeg_size_bytes,
            source_size_bytes: self.source_size_bytes,
            blur_placeholder_data_url: blur.map(|b| b.data_url.clone()),
            blur_placeholder_dimensions: blur.map(|b| (b.width, b.height)),
            blur_placeholder_size_bytes: blur.map(|b| b.size_bytes),
            blur_placeholder_hash: blur.map(|b| b.source_hash.clone()),
            blur_placeholder_generated_at: blur.map(|b| b.generated_at),
        }
    }
}

/// Result of a batch run: records for the sources that produced
/// thumbnails, paths for the ones that did not.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub successful: Vec<ThumbnailRecord>,
    pub failed: Vec<PathBuf>,
}

/// Service generating optimized thumbnails into one output directory.
pub struct ThumbnailGenerator {
    config: ThumbnailsConfig,
    placeholders: PlaceholderConfig,
    thumbnail_dir: PathBuf,
    use_cache: bool,
    cache: BuildCache,
    stats: CacheStats,
}

impl ThumbnailGenerator {
    /// Create the output directory and load the build cache from it.
    /// `use_cache: false` (the `--no-cache` path) starts from an empty
    /// cache, forcing regeneration of everything.
    pub fn new(
        config: &ThumbnailsConfig,
        placeholders: &PlaceholderConfig,
        thumbnail_dir: &Path,
        use_cache: bool,
    ) -> io::Result<Self> {
        fs::create_dir_all(thumbnail_dir)?;
        let use_cache = use_cache && config.enable_cache;
        let cache = if use_cache {
            BuildCache::load(thumbnail_dir)
        } else {
            BuildCache::empty()
        };
        Ok(Self {
            config: config.clone(),
            placeholders: placeholders.clone(),
            thumbnail_dir: thumbnail_dir.to_path_buf(),
            use_cache,
            cache,
            stats: CacheStats::default(),
        })
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Extract the metadata snapshot for a source image.
    pub fn extract_metadata(&self, source: &Path) -> Result<ImageMetadata, ThumbnailError> {
        if !source.is_file() {
            return Err(ThumbnailError::SourceNotFound(source.to_path_buf()));
        }
        let bytes = fs::read(source)?;
        metadata_from_bytes(&bytes)
    }

    /// Build or load the thumbnail record for one source image.
    pub fn generate_thumbnail(
        &mut self,
        source: &Path,
        metadata: Option<ImageMetadata>,
    ) -> Result<ThumbnailRecord, ThumbnailError> {
        if !source.is_file() {
            return Err(ThumbnailError::SourceNotFound(source.to_path_buf()));
        }
        if self.use_cache
            && !self.cache.should_regenerate(source)
            && let Some(record) = self.load_cached(source)
        {
            debug!("cache hit: {}", source.display());
            self.stats.hit();
            return Ok(record);
        }
        let record = self.regenerate(source, metadata)?;
        self.stats.regenerate();
        Ok(record)
    }

    /// Process sources sequentially, absorbing per-image failures, and
    /// flush the cache exactly once at the end.
    pub fn generate_batch(
        &mut self,
        sources: &[PathBuf],
        mut progress: Option<&mut dyn FnMut(usize, usize)>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (index, source) in sources.iter().enumerate() {
            match self.generate_thumbnail(source, None) {
                Ok(record) => outcome.successful.push(record),
                Err(err) => {
                    warn!("skipping {}: {err}", source.display());
                    self.stats.fail();
                    outcome.failed.push(source.clone());
                }
            }
            if let Some(callback) = progress.as_mut() {
                callback(index + 1, sources.len());
            }
        }
        if self.use_cache
            && let Err(err) = self.cache.save(&self.thumbnail_dir)
        {
            warn!("could not persist build cache: {err}");
        }
        info!("thumbnails: {}", self.stats);
        outcome
    }

    /// Rebuild a record from the cache. `None` falls through to
    /// regeneration: hash mismatch, placeholder config change, or output
    /// files gone from disk.
    fn load_cached(&self, source: &Path) -> Option<ThumbnailRecord> {
        let current_hash = crate::hashing::hash_file(source).ok()?;
        let entry = self.cache.get(source)?;
        if !entry.is_valid(&current_hash, self.placeholders.enabled) {
            return None;
        }
        let webp_path = PathBuf::from(&entry.webp_path);
        let jpeg_path = PathBuf::from(&entry.jpeg_path);
        if !webp_path.is_file() || !jpeg_path.is_file() {
            debug!("cache entry outputs missing for {}", source.display());
            return None;
        }
        let blur_placeholder = if self.placeholders.enabled {
            // Entries from before placeholders were cached lack the data;
            // regenerate just the placeholder, not the thumbnails
            self.placeholder_from_entry(entry)
                .or_else(|| generate_blur_placeholder(source, &self.placeholders))
        } else {
            None
        };
        Some(ThumbnailRecord {
            filename: source.file_name()?.to_string_lossy().into_owned(),
            source_path: source.to_path_buf(),
            webp_path,
            jpeg_path,
            width: entry.width,
            height: entry.height,
            webp_size_bytes: entry.webp_size_bytes,
            jpeg_size_bytes: entry.jpeg_size_bytes,
            source_size_bytes: entry.source_size_bytes,
            content_hash: entry.content_hash.clone(),
            generated_at: entry.thumbnail_generated_at,
            metadata_stripped: entry.metadata_stripped,
            strip_warning: None,
            blur_placeholder,
        })
    }

    fn placeholder_from_entry(&self, entry: &CacheEntry) -> Option<BlurPlaceholder> {
        let data_url = entry.blur_placeholder_data_url.clone()?;
        let (width, height) = entry.blur_placeholder_dimensions?;
        let size_bytes = entry.blur_placeholder_size_bytes?;
        Some(BlurPlaceholder {
            data_url,
            size_bytes,
            width,
            height,
            blur_radius: self.placeholders.blur_radius,
            source_hash: entry.blur_placeholder_hash.clone().unwrap_or_default(),
            generated_at: entry.blur_placeholder_generated_at.unwrap_or_else(Utc::now),
        })
    }

    fn regenerate(
        &mut self,
        source: &Path,
        metadata: Option<ImageMetadata>,
    ) -> Result<ThumbnailRecord, ThumbnailError> {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ThumbnailError::InvalidFileName(source.to_path_buf()))?
            .to_string();
        let filename = source
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ThumbnailError::InvalidFileName(source.to_path_buf()))?
            .to_string();

        let bytes = fs::read(source)?;
        let metadata = match metadata {
            Some(metadata) => metadata,
            None => metadata_from_bytes(&bytes)?,
        };
        let content_hash = hash_bytes(&bytes);

        let img = image::load_from_memory(&bytes)?;
        let rgb = flatten_to_rgb(apply_orientation(img, metadata.orientation));
        let (width, height) =
            calculate_thumbnail_dimensions(rgb.width(), rgb.height(), self.config.max_dimension);
        let resized = if (width, height) == (rgb.width(), rgb.height()) {
            rgb
        } else {
            image::imageops::resize(&rgb, width, height, FilterType::Lanczos3)
        };

        // Outputs from earlier contents of this source are now orphans
        self.cleanup_stale_outputs(&stem, &content_hash)?;

        let exif_blob = exif::filter_metadata_bytes(&bytes);
        let (metadata_stripped, strip_warning) = match &exif_blob {
            Some(_) => (true, None),
            None => (
                false,
                Some("metadata filtering failed, saved without EXIF".to_string()),
            ),
        };
        if let Some(warning) = &strip_warning {
            warn!("{}: {warning}", source.display());
        }

        let webp_path = self.thumbnail_dir.join(format!("{stem}-{content_hash}.webp"));
        let jpeg_path = self.thumbnail_dir.join(format!("{stem}-{content_hash}.jpg"));
        let webp_bytes = encode::encode_webp(&resized, self.config.webp_quality, exif_blob.as_deref());
        let jpeg_bytes = encode::encode_jpeg(&resized, self.config.jpeg_quality, exif_blob.as_deref())?;
        fs::write(&webp_path, &webp_bytes)?;
        fs::write(&jpeg_path, &jpeg_bytes)?;

        let blur_placeholder = if self.placeholders.enabled {
            generate_blur_placeholder(source, &self.placeholders)
        } else {
            None
        };

        let record = ThumbnailRecord {
            filename,
            source_path: source.to_path_buf(),
            webp_path,
            jpeg_path,
            width,
            height,
            webp_size_bytes: webp_bytes.len() as u64,
            jpeg_size_bytes: jpeg_bytes.len() as u64,
            source_size_bytes: bytes.len() as u64,
            content_hash,
            generated_at: Utc::now(),
            metadata_stripped,
            strip_warning,
            blur_placeholder,
        };
        if self.use_cache
            && let Ok(mtime) = cache::source_mtime(source)
        {
            self.cache.update_entry(record.to_cache_entry(mtime));
        }
        Ok(record)
    }

    /// Delete `{stem}-*.webp|jpg` outputs whose hash segment differs from
    /// the current one, so rebuilds never accumulate orphans.
    fn cleanup_stale_outputs(&self, stem: &str, keep_hash: &str) -> io::Result<()> {
        let prefix = format!("{stem}-");
        for entry in fs::read_dir(&self.thumbnail_dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            let Some((hash, ext)) = rest.split_once('.') else {
                continue;
            };
            if !matches!(ext, "webp" | "jpg") {
                continue;
            }
            let looks_hashed = hash.len() == crate::hashing::HASH_LENGTH
                && hash.chars().all(|c| c.is_ascii_hexdigit());
            if looks_hashed && hash != keep_hash {
                debug!("removing stale thumbnail {name}");
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }
}

/// Decode the metadata snapshot without decoding full pixel data (GIFs
/// additionally walk their frame list to detect animation).
fn metadata_from_bytes(bytes: &[u8]) -> Result<ImageMetadata, ThumbnailError> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    let format = reader.format();
    let decoder = reader.into_decoder()?;
    let (width, height) = image::ImageDecoder::dimensions(&decoder);
    let color = image::ImageDecoder::color_type(&decoder);

    let (frame_count, is_animated) = if format == Some(ImageFormat::Gif) {
        let frames = GifDecoder::new(Cursor::new(bytes))?.into_frames();
        let count = frames.take_while(|frame| frame.is_ok()).count() as u32;
        (count.max(1), count > 1)
    } else {
        (1, false)
    };

    let exif_data = exif::extract_exif(bytes);
    Ok(ImageMetadata {
        format,
        width,
        height,
        color,
        has_alpha: color.has_alpha(),
        is_animated,
        frame_count,
        orientation: exif_data.as_ref().and_then(|data| data.orientation()),
        dpi: exif_data.as_ref().and_then(|data| data.dpi()),
    })
}
