//! Dual-format thumbnail encoding.
//!
//! Every thumbnail is written twice: lossy WebP for modern browsers and a
//! JPEG fallback. Both carry the sanitized EXIF blob when filtering
//! succeeded, and no EXIF container at all when it did not.

use crate::exif;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;

/// Encode to lossy WebP at the given quality, optionally embedding a
/// sanitized EXIF blob via a VP8X extended container.
pub fn encode_webp(img: &RgbImage, quality: u8, exif_blob: Option<&[u8]>) -> Vec<u8> {
    let encoder = webp::Encoder::from_rgb(img.as_raw(), img.width(), img.height());
    let encoded = encoder.encode(quality as f32).to_vec();
    match exif_blob {
        Some(blob) => exif::embed_in_webp(&encoded, blob, (img.width(), img.height())),
        None => encoded,
    }
}

/// Encode to JPEG at the given quality, optionally embedding a sanitized
/// EXIF blob as an APP1 segment.
pub fn encode_jpeg(
    img: &RgbImage,
    quality: u8,
    exif_blob: Option<&[u8]>,
) -> Result<Vec<u8>, image::ImageError> {
    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder.encode(
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )?;
    Ok(match exif_blob {
        Some(blob) => exif::embed_in_jpeg(&jpeg, blob),
        None => jpeg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::sample_exif;

    fn flat_image(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]))
    }

    #[test]
    fn webp_output_is_a_riff_container() {
        let out = encode_webp(&flat_image(32, 24), 85, None);
        assert_eq!(&out[0..4], b"RIFF");
        assert_eq!(&out[8..12], b"WEBP");
    }

    #[test]
    fn webp_with_exif_decodes_to_same_dimensions() {
        let blob = exif::serialize(&sample_exif().filtered());
        let out = encode_webp(&flat_image(32, 24), 85, Some(&blob));
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (32, 24));
    }

    #[test]
    fn jpeg_output_decodes_with_same_dimensions() {
        let out = encode_jpeg(&flat_image(40, 30), 90, None).unwrap();
        let decoded = image::load_from_memory(&out).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (40, 30));
    }

    #[test]
    fn jpeg_with_exif_carries_the_blob() {
        let blob = exif::serialize(&sample_exif().filtered());
        let out = encode_jpeg(&flat_image(40, 30), 90, Some(&blob)).unwrap();

        let parsed = exif::extract_exif(&out).unwrap();
        assert_eq!(parsed.orientation(), sample_exif().orientation());
        assert!(parsed.gps.is_empty());
    }

    #[test]
    fn jpeg_without_blob_has_no_exif() {
        let out = encode_jpeg(&flat_image(16, 16), 90, None).unwrap();
        assert!(exif::extract_exif(&out).is_none());
    }

    #[test]
    fn lower_quality_webp_is_smaller() {
        let img = crate::test_helpers::noisy_image(64, 64);
        let high = encode_webp(&img, 95, None);
        let low = encode_webp(&img, 20, None);
        assert!(low.len() < high.len());
    }
}
