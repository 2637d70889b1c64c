// Phase 4: 切り出し: ページビットマップ -> 変数ごとの部分画像

use image::{RgbImage, imageops};

use crate::config::layout::CropRect;

/// Cut `rect` out of `bitmap`.
///
/// Coordinates beyond the bitmap clip to its bounds, and an inverted or fully
/// out-of-range rectangle yields an empty (0-width or 0-height) image.
pub fn crop_region(bitmap: &RgbImage, rect: CropRect) -> RgbImage {
    let (width, height) = bitmap.dimensions();

    let y1 = rect.y1.min(height);
    let y2 = rect.y2.min(height).max(y1);
    let x1 = rect.x1.min(width);
    let x2 = rect.x2.min(width).max(x1);

    imageops::crop_imm(bitmap, x1, y1, x2 - x1, y2 - y1).to_image()
}
