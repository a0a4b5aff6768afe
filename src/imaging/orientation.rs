//! EXIF orientation transforms.
//!
//! Cameras store sensor data as captured and record how it must be rotated
//! or flipped for display in orientation tag values 1-8. Thumbnails bake
//! the transform into the pixels so browsers never need the tag.

use image::DynamicImage;

/// Apply the stored orientation transform to pixel data.
///
/// `None`, 1, and out-of-range values are a no-op. Values follow the EXIF
/// convention:
///
/// ```text
/// 1  normal                 5  transpose (flip + 90° CW)
/// 2  mirror horizontal      6  rotate 90° CW
/// 3  rotate 180°            7  transverse (flip + 270° CW)
/// 4  mirror vertical        8  rotate 270° CW
/// ```
pub fn apply_orientation(img: DynamicImage, orientation: Option<u16>) -> DynamicImage {
    match orientation {
        Some(2) => img.fliph(),
        Some(3) => img.rotate180(),
        Some(4) => img.flipv(),
        Some(5) => img.rotate90().fliph(),
        Some(6) => img.rotate90(),
        Some(7) => img.rotate270().fliph(),
        Some(8) => img.rotate270(),
        _ => img,
    }
}
