//! Image operations for the thumbnail pipeline.
//!
//! Split by concern:
//!
//! - [`calculations`] — pure dimension math, no I/O, no pixels
//! - [`orientation`] — EXIF orientation transforms over pixel data
//! - [`placeholder`] — tiny base64 blur previews
//! - [`encode`] — WebP/JPEG encoding with sanitized EXIF re-embedding

pub mod calculations;
pub mod encode;
pub mod orientation;
pub mod placeholder;

pub use calculations::calculate_thumbnail_dimensions;
pub use orientation::apply_orientation;
pub use placeholder::{BlurPlaceholder, generate_blur_placeholder};

use image::{DynamicImage, RgbImage};

/// Convert to a JPEG-safe color mode, compositing any alpha channel onto a
/// white background. Opaque images convert directly.
pub fn flatten_to_rgb(img: DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.into_rgb8();
    }
    let rgba = img.into_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let alpha = src[3] as u32;
        for c in 0..3 {
            let channel = src[c] as u32;
            dst[c] = ((channel * alpha + 255 * (255 - alpha)) / 255) as u8;
        }
    }
    out
}
