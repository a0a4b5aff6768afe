//! Blur placeholder generation.
//!
//! A placeholder is a ~20px JPEG of the source, base64-encoded into a data
//! URL small enough to inline into the page. The renderer shows it blurred
//! behind the real thumbnail while that loads; the blur itself is CSS, not
//! baked into the pixels.
//!
//! If the first encode overshoots the byte budget, quality drops in fixed
//! steps down to a floor. Going over budget at the floor is accepted — a
//! slightly heavy placeholder beats none at all.

use crate::config::PlaceholderConfig;
use crate::exif;
use crate::hashing::hash_bytes;
use crate::imaging::{apply_orientation, calculate_thumbnail_dimensions, flatten_to_rgb};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Required prefix of every placeholder data URL.
pub const DATA_URL_PREFIX: &str = "data:image/jpeg;base64,";

/// Quality reduction per retry when over the byte budget.
const QUALITY_STEP: u8 = 10;

/// Lowest quality the budget search will try.
const QUALITY_FLOOR: u8 = 10;

/// An inline-embeddable low-resolution preview of one source image.
#[derive(Debug, Clone, PartialEq)]
pub struct BlurPlaceholder {
    /// `data:image/jpeg;base64,…` — bounded by the configured budget in
    /// all but floor-quality cases.
    pub data_url: String,
    pub size_bytes: usize,
    pub width: u32,
    pub height: u32,
    /// CSS blur radius in pixels. Metadata for the renderer only.
    pub blur_radius: u32,
    /// Hash of the *source* bytes, for cache invalidation.
    pub source_hash: String,
    pub generated_at: DateTime<Utc>,
}

/// Generate a blur placeholder for a source image.
///
/// Every failure — unreadable file, undecodable image, encode error — is
/// logged and yields `None` so the pipeline proceeds without a placeholder.
pub fn generate_blur_placeholder(
    source: &Path,
    config: &PlaceholderConfig,
) -> Option<BlurPlaceholder> {
    let bytes = match fs::read(source) {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!("placeholder: cannot read {}: {err}", source.display());
            return None;
        }
    };
    let img = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(err) => {
            warn!("placeholder: cannot decode {}: {err}", source.display());
            return None;
        }
    };
    let source_hash = hash_bytes(&bytes);
    let orientation = exif::extract_exif(&bytes).and_then(|data| data.orientation());
    let rgb = flatten_to_rgb(apply_orientation(img, orientation));
    let (width, height) =
        calculate_thumbnail_dimensions(rgb.width(), rgb.height(), config.target_size);
    let tiny = image::imageops::resize(&rgb, width, height, FilterType::Lanczos3);

    let data_url = match shrink_to_budget(&tiny, config) {
        Some(url) => url,
        None => {
            warn!("placeholder: JPEG encode failed for {}", source.display());
            return None;
        }
    };
    Some(BlurPlaceholder {
        size_bytes: data_url.len(),
        data_url,
        width,
        height,
        blur_radius: config.blur_radius,
        source_hash,
        generated_at: Utc::now(),
    })
}

/// Encode at descending quality until the data URL fits the budget.
/// Returns the best attempt even if the floor quality still overshoots.
fn shrink_to_budget(img: &RgbImage, config: &PlaceholderConfig) -> Option<String> {
    let mut quality = config.start_quality.max(QUALITY_FLOOR);
    let mut best = encode_data_url(img, quality)?;
    while best.len() > config.max_data_url_bytes && quality > QUALITY_FLOOR {
        quality = quality.saturating_sub(QUALITY_STEP).max(QUALITY_FLOOR);
        best = encode_data_url(img, quality)?;
    }
    Some(best)
}

fn encode_data_url(img: &RgbImage, quality: u8) -> Option<String> {
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder
        .encode(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .ok()?;
    Some(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(&jpeg)))
}
