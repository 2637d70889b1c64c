// Phase 5: ピーク値: マスクの列ごとの中心線 -> 校正済みピーク

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::round2;
use super::segmenter::{ColorMask, segment_tag};

/// Peak selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakMode {
    /// Unipolar curves (force, power): the top-most excursion is the peak.
    Signed,
    /// Bipolar curves (moments): whichever excursion from the crop's bottom
    /// edge is larger in absolute terms.
    Magnitude,
}

/// Calibrated peak of the curve in `mask`.
///
/// The curve is reduced to one sample per column (mean row of the set
/// pixels). Deviations are measured from the bottom edge of the mask
/// (`height - row`), scaled by `units_per_pixel` and rounded to 2 decimals.
///
/// In [`PeakMode::Magnitude`], equal deviations resolve to the upper
/// excursion (the minimum row).
///
/// Returns `None` when no column has a set pixel.
pub fn resolve_peak(mask: &ColorMask, mode: PeakMode, units_per_pixel: f64) -> Option<f64> {
    let signal = mask.column_centerline();
    let min_row = signal.iter().copied().reduce(f64::min)?;
    let height = f64::from(mask.height());

    let pixel_peak = match mode {
        PeakMode::Signed => height - min_row,
        PeakMode::Magnitude => {
            let max_row = signal.iter().copied().reduce(f64::max)?;
            let upper = (height - min_row).abs();
            let lower = (height - max_row).abs();
            if upper >= lower { upper } else { lower }
        }
    };

    Some(round2(pixel_peak * units_per_pixel))
}

/// Segment `crop` for the color named by `tag` and resolve its peak.
///
/// # Errors
/// `GaitError::InvalidColor` unless `tag` is `"red"` or `"blue"`. A crop
/// without curve pixels is `Ok(None)`.
pub fn peak_from_crop(
    crop: &RgbImage,
    tag: &str,
    mode: PeakMode,
    units_per_pixel: f64,
) -> crate::error::Result<Option<f64>> {
    let mask = segment_tag(crop, tag)?;
    Ok(resolve_peak(&mask, mode, units_per_pixel))
}
