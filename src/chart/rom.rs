use image::RgbImage;

use super::round2;
use super::segmenter::{ColorMask, CurveColor, segment};

/// Range of motion from the vertical span of a kinematics curve.
///
/// The full bounding span of the set pixels, `max_row - min_row`, is scaled
/// by `degrees_per_pixel` and rounded to 2 decimals. `None` when the mask has
/// no set pixel.
pub fn resolve_rom(mask: &ColorMask, degrees_per_pixel: f64) -> Option<f64> {
    let (top, bottom) = mask.row_extent()?;
    Some(round2(f64::from(bottom - top) * degrees_per_pixel))
}

/// Segment `crop` for `color` and resolve its range of motion.
pub fn rom_from_crop(crop: &RgbImage, color: CurveColor, degrees_per_pixel: f64) -> Option<f64> {
    resolve_rom(&segment(crop, color), degrees_per_pixel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layout::DEGREES_PER_PIXEL;
    use image::Rgb;

    #[test]
    fn test_empty_mask_is_none() {
        assert_eq!(resolve_rom(&ColorMask::new(50, 50), DEGREES_PER_PIXEL), None);
        assert_eq!(resolve_rom(&ColorMask::new(0, 0), DEGREES_PER_PIXEL), None);
    }

    #[test]
    fn test_span_rows_100_to_300() {
        let mask = ColorMask::from_fn(20, 400, |x, y| x == 10 && (100..=300).contains(&y));
        assert_eq!(resolve_rom(&mask, DEGREES_PER_PIXEL), Some(100.0));
    }

    #[test]
    fn test_span_uses_whole_bounding_box() {
        // 別々の列にある点でも、行の最小・最大だけで決まる
        let mask = ColorMask::from_fn(20, 100, |x, y| (x == 0 && y == 13) || (x == 19 && y == 80));
        assert_eq!(resolve_rom(&mask, DEGREES_PER_PIXEL), Some(33.5));
    }

    #[test]
    fn test_single_row_is_zero() {
        let mask = ColorMask::from_fn(20, 10, |_, y| y == 4);
        assert_eq!(resolve_rom(&mask, DEGREES_PER_PIXEL), Some(0.0));
    }

    #[test]
    fn test_rom_from_crop_ignores_other_color() {
        let crop = RgbImage::from_fn(10, 60, |x, y| {
            if x == 3 && (10..=50).contains(&y) {
                Rgb([0, 0, 255])
            } else {
                Rgb([255, 255, 255])
            }
        });
        assert_eq!(rom_from_crop(&crop, CurveColor::Blue, DEGREES_PER_PIXEL), Some(20.0));
        assert_eq!(rom_from_crop(&crop, CurveColor::Red, DEGREES_PER_PIXEL), None);
    }

    #[test]
    fn test_rom_from_empty_crop_is_none() {
        let crop = RgbImage::new(0, 0);
        assert_eq!(rom_from_crop(&crop, CurveColor::Red, DEGREES_PER_PIXEL), None);
    }
}
