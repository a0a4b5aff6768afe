//! Pure calculation functions for thumbnail dimensions.
//!
//! No I/O, no pixel data — everything here is testable with plain numbers.

/// Calculate target thumbnail dimensions for a source image.
///
/// Never upscales: if the larger source edge already fits within
/// `max_dim`, the source dimensions come back unchanged. Otherwise the
/// larger edge is clamped to `max_dim` and the other edge follows the
/// aspect ratio, rounded down. Square images count as landscape
/// (width-limited).
///
/// # Examples
/// ```
/// # use exposure::imaging::calculate_thumbnail_dimensions;
/// assert_eq!(calculate_thumbnail_dimensions(4000, 3000, 800), (800, 600));
/// assert_eq!(calculate_thumbnail_dimensions(600, 400, 800), (600, 400));
/// ```
pub fn calculate_thumbnail_dimensions(src_w: u32, src_h: u32, max_dim: u32) -> (u32, u32) {
    if src_w.max(src_h) <= max_dim {
        return (src_w, src_h);
    }
    if src_w >= src_h {
        // Landscape or square: width-limited
        let h = (max_dim as u64 * src_h as u64 / src_w as u64) as u32;
        (max_dim, h.max(1))
    } else {
        // Portrait: height-limited
        let w = (max_dim as u64 * src_w as u64 / src_h as u64) as u32;
        (w.max(1), max_dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // No-upscale invariant
    // =========================================================================

    #[test]
    fn smaller_than_max_is_unchanged() {
        assert_eq!(calculate_thumbnail_dimensions(600, 400, 800), (600, 400));
    }

    #[test]
    fn exactly_max_is_unchanged() {
        assert_eq!(calculate_thumbnail_dimensions(800, 600, 800), (800, 600));
    }

    #[test]
    fn tiny_image_is_unchanged() {
        assert_eq!(calculate_thumbnail_dimensions(1, 1, 800), (1, 1));
    }

    #[test]
    fn no_upscale_across_a_grid_of_inputs() {
        for w in [1u32, 50, 320, 799, 800] {
            for h in [1u32, 50, 320, 799, 800] {
                assert_eq!(calculate_thumbnail_dimensions(w, h, 800), (w, h));
            }
        }
    }

    // =========================================================================
    // Downscaling
    // =========================================================================

    #[test]
    fn landscape_is_width_limited() {
        assert_eq!(calculate_thumbnail_dimensions(4000, 3000, 800), (800, 600));
    }

    #[test]
    fn portrait_is_height_limited() {
        assert_eq!(calculate_thumbnail_dimensions(3000, 4000, 800), (600, 800));
    }

    #[test]
    fn square_scales_both_edges() {
        assert_eq!(calculate_thumbnail_dimensions(2000, 2000, 500), (500, 500));
    }

    #[test]
    fn inexact_ratio_rounds_down() {
        // 1000x999 at max 100: 100 * 999 / 1000 = 99.9 → 99
        assert_eq!(calculate_thumbnail_dimensions(1000, 999, 100), (100, 99));
    }

    #[test]
    fn extreme_aspect_never_collapses_to_zero() {
        let (w, h) = calculate_thumbnail_dimensions(10000, 2, 100);
        assert!(w > 0 && h > 0);
    }

    #[test]
    fn aspect_ratio_is_preserved_within_tolerance() {
        for (w, h) in [(4000u32, 3000u32), (3543, 2365), (1203, 4001), (4000, 2250)] {
            let (tw, th) = calculate_thumbnail_dimensions(w, h, 800);
            let src = w as f64 / h as f64;
            let out = tw as f64 / th as f64;
            assert!(
                (src - out).abs() < 0.01,
                "({w},{h}) -> ({tw},{th}): {src} vs {out}"
            );
        }
    }
}
