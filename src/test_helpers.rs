//! Shared fixtures for unit tests: tiny encoded images and a synthetic
//! EXIF structure mixing display-safe and identifying tags.

use crate::config::{PlaceholderConfig, ThumbnailsConfig};
use crate::exif::{self, ExifData, TagValue};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};

/// An RGB image with deterministic per-pixel noise. Flat color compresses
/// to nearly nothing at any quality, so size comparisons need texture.
pub fn noisy_image(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x2545_F491;
    RgbImage::from_fn(width, height, |_, _| {
        // xorshift32
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let [r, g, b, _] = state.to_le_bytes();
        Rgb([r, g, b])
    })
}

/// Encode a small gradient JPEG in memory.
pub fn tiny_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    });
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, 85);
    encoder
        .encode(
            img.as_raw(),
            width,
            height,
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
    out
}

/// Write a gradient JPEG into `dir` and return its path.
pub fn write_tiny_jpeg(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, tiny_jpeg(width, height)).unwrap();
    path
}

/// Write a PNG with a semi-transparent gradient into `dir`.
pub fn write_tiny_png_with_alpha(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            200,
            40,
            40,
            ((x + y) * 255 / (width + height).max(1)) as u8,
        ])
    });
    let path = dir.join(name);
    img.save(&path).unwrap();
    path
}

/// A JPEG whose only EXIF content is an orientation tag.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    let mut data = ExifData::default();
    data.ifd0
        .insert(exif::TAG_ORIENTATION, TagValue::Short(vec![orientation]));
    exif::embed_in_jpeg(&tiny_jpeg(width, height), &exif::serialize(&data))
}

/// A JPEG carrying the full [`sample_exif`] fixture (GPS excluded, since
/// the serializer never writes it).
pub fn jpeg_with_exif(width: u32, height: u32) -> Vec<u8> {
    exif::embed_in_jpeg(&tiny_jpeg(width, height), &exif::serialize(&sample_exif()))
}

fn ascii(s: &str) -> TagValue {
    let mut bytes = s.as_bytes().to_vec();
    bytes.push(0);
    TagValue::Ascii(bytes)
}

/// Synthetic camera metadata mixing allow-listed tags (orientation,
/// capture time, exposure) with identifying ones (artist, serial numbers,
/// GPS position). No pointer tags: sub-IFD wiring belongs to the
/// serializer, not the fixture.
pub fn sample_exif() -> ExifData {
    let mut data = ExifData::default();

    data.ifd0.insert(0x010F, ascii("ExampleCam"));
    data.ifd0.insert(0x0110, ascii("ExampleCam Z-1"));
    data.ifd0.insert(0x0112, TagValue::Short(vec![6]));
    data.ifd0.insert(0x011A, TagValue::Rational(vec![(300, 1)]));
    data.ifd0.insert(0x011B, TagValue::Rational(vec![(300, 1)]));
    data.ifd0.insert(0x0128, TagValue::Short(vec![2]));
    data.ifd0.insert(0x0132, ascii("2024:06:01 12:00:00"));
    // Identifying IFD0 tags the filter must drop
    data.ifd0.insert(0x0131, ascii("darkroom 9.9.9"));
    data.ifd0.insert(0x013B, ascii("A. Photographer"));
    data.ifd0.insert(0x8298, ascii("(c) A. Photographer"));

    data.exif.insert(0x829A, TagValue::Rational(vec![(1, 250)]));
    data.exif.insert(0x829D, TagValue::Rational(vec![(28, 10)]));
    data.exif.insert(0x8827, TagValue::Short(vec![200]));
    data.exif.insert(0x9003, ascii("2024:06:01 12:00:00"));
    data.exif.insert(0x9004, ascii("2024:06:01 12:00:00"));
    data.exif.insert(0x920A, TagValue::Rational(vec![(50, 1)]));
    data.exif.insert(0xA001, TagValue::Short(vec![1]));
    data.exif.insert(0xA434, ascii("50mm f/2.8"));
    // Identifying Exif tags the filter must drop
    data.exif.insert(0xA420, ascii("deadbeefdeadbeef"));
    data.exif.insert(0xA431, ascii("SN-0012345"));
    data.exif.insert(0xA435, ascii("LSN-998877"));

    // GPS position near a real place; must never reach any output
    data.gps.insert(0x0001, ascii("N"));
    data.gps.insert(
        0x0002,
        TagValue::Rational(vec![(52, 1), (30, 1), (0, 1)]),
    );
    data.gps.insert(0x0003, ascii("E"));
    data.gps.insert(
        0x0004,
        TagValue::Rational(vec![(13, 1), (24, 1), (0, 1)]),
    );

    data
}

pub fn test_thumbnails_config() -> ThumbnailsConfig {
    ThumbnailsConfig {
        max_dimension: 800,
        webp_quality: 85,
        jpeg_quality: 90,
        enable_cache: true,
    }
}

pub fn test_placeholder_config() -> PlaceholderConfig {
    PlaceholderConfig {
        enabled: true,
        target_size: 20,
        start_quality: 50,
        max_data_url_bytes: 2000,
        blur_radius: 12,
    }
}
