// Phase 5: 色分離: RGB切り出し画像 -> 曲線色のブールマスク

use std::str::FromStr;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::error::GaitError;

/// Inclusive saturation band shared by both curve colors.
pub const SATURATION_RANGE: (u8, u8) = (70, 255);

/// Inclusive value band shared by both curve colors.
pub const VALUE_RANGE: (u8, u8) = (50, 255);

/// Chart curve colors. Red plots the left side, blue the right side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveColor {
    Red,
    Blue,
}

impl CurveColor {
    /// Inclusive hue bands on the 8-bit `[0, 180)` hue circle.
    ///
    /// Red straddles hue 0, so it needs one band at each end of the circle.
    pub fn hue_bands(self) -> &'static [(u8, u8)] {
        match self {
            CurveColor::Red => &[(0, 10), (160, 180)],
            CurveColor::Blue => &[(90, 130)],
        }
    }

    /// Whether an 8-bit HSV triple falls inside this color's range.
    pub fn contains(self, (h, s, v): (u8, u8, u8)) -> bool {
        let in_band = |value: u8, (lo, hi): (u8, u8)| lo <= value && value <= hi;
        in_band(s, SATURATION_RANGE)
            && in_band(v, VALUE_RANGE)
            && self.hue_bands().iter().any(|&band| in_band(h, band))
    }
}

impl FromStr for CurveColor {
    type Err = GaitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "red" => Ok(CurveColor::Red),
            "blue" => Ok(CurveColor::Blue),
            other => Err(GaitError::invalid_color(other)),
        }
    }
}

/// Convert an RGB pixel to 8-bit HSV.
///
/// Hue is halved to fit a byte (`[0, 180)`); saturation and value span
/// `[0, 255]`. Gray pixels (no chroma) get hue 0 and saturation 0.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let (rf, gf, bf) = (f64::from(r), f64::from(g), f64::from(b));
    let v = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = f64::from(v - min);

    let s = if v == 0 {
        0.0
    } else {
        (255.0 * diff / f64::from(v)).round()
    };

    let hue = if diff == 0.0 {
        0.0
    } else if v == r {
        30.0 * (gf - bf) / diff
    } else if v == g {
        60.0 + 30.0 * (bf - rf) / diff
    } else {
        120.0 + 30.0 * (rf - gf) / diff
    };
    // Half-hues round toward +inf, so -20.5 becomes -20 and wraps to 160.
    let mut h = (hue + 0.5).floor() as i32;
    if h < 0 {
        h += 180;
    }

    (h as u8, s as u8, v)
}

/// Boolean segmentation of a crop. `true` marks a curve pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl ColorMask {
    /// All-clear mask of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![false; width as usize * height as usize],
        }
    }

    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> bool) -> Self {
        let mut mask = Self::new(width, height);
        for y in 0..height {
            for x in 0..width {
                mask.set(x, y, f(x, y));
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// Panics when `(x, y)` lies outside the mask.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        assert!(x < self.width && y < self.height, "mask index out of bounds");
        let i = self.index(x, y);
        self.bits[i] = value;
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[self.index(x, y)]
    }

    pub fn count(&self) -> usize {
        self.bits.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.contains(&true)
    }

    /// Top-most and bottom-most rows that contain a set pixel.
    pub fn row_extent(&self) -> Option<(u32, u32)> {
        if self.width == 0 {
            return None;
        }
        let mut rows = self
            .bits
            .chunks(self.width as usize)
            .enumerate()
            .filter(|(_, row)| row.contains(&true))
            .map(|(y, _)| y as u32);
        let top = rows.next()?;
        let bottom = rows.last().unwrap_or(top);
        Some((top, bottom))
    }

    /// Mean row of the set pixels in each column, left to right.
    ///
    /// Columns without a set pixel are skipped, so the result may be shorter
    /// than the mask width.
    pub fn column_centerline(&self) -> Vec<f64> {
        (0..self.width)
            .filter_map(|x| {
                let (sum, n) = (0..self.height)
                    .filter(|&y| self.bits[self.index(x, y)])
                    .fold((0u64, 0u64), |(sum, n), y| (sum + u64::from(y), n + 1));
                (n > 0).then(|| sum as f64 / n as f64)
            })
            .collect()
    }
}

/// Segment the pixels of `crop` that belong to a `color` curve.
pub fn segment(crop: &RgbImage, color: CurveColor) -> ColorMask {
    let mut mask = ColorMask::new(crop.width(), crop.height());
    for (x, y, pixel) in crop.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        if color.contains(rgb_to_hsv(r, g, b)) {
            mask.set(x, y, true);
        }
    }
    mask
}

/// [`segment`] with a textual color tag.
///
/// # Errors
/// `GaitError::InvalidColor` unless `tag` is `"red"` or `"blue"`.
pub fn segment_tag(crop: &RgbImage, tag: &str) -> crate::error::Result<ColorMask> {
    let color: CurveColor = tag.parse()?;
    Ok(segment(crop, color))
}
