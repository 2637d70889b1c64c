// Phase 2: 固定レイアウト表（ページ・切り出し矩形・曲線色・校正定数）

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, LazyLock};

use serde::{Deserialize, Serialize};

use crate::chart::peak::PeakMode;
use crate::chart::segmenter::CurveColor;
use crate::error::GaitError;

/// Degrees of joint angle per vertical pixel on the kinematics charts (300 DPI).
pub const DEGREES_PER_PIXEL: f64 = 0.5;

/// Physical units per vertical pixel on the dynamics charts (300 DPI).
pub const UNITS_PER_PIXEL: f64 = 0.008;

/// Kinematic variables recovered as a range of motion.
///
/// Left-side curves are drawn in red, right-side curves in blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum KinematicVariable {
    #[serde(rename = "ROM_Hanche_Gauche")]
    HipLeft,
    #[serde(rename = "ROM_Hanche_Droite")]
    HipRight,
    #[serde(rename = "ROM_Genou_Gauche")]
    KneeLeft,
    #[serde(rename = "ROM_Genou_Droite")]
    KneeRight,
    #[serde(rename = "ROM_Cheville_Gauche")]
    AnkleLeft,
    #[serde(rename = "ROM_Cheville_Droite")]
    AnkleRight,
    #[serde(rename = "Foot_Progression_Gauche")]
    FootProgressionLeft,
    #[serde(rename = "Foot_Progression_Droite")]
    FootProgressionRight,
}

impl KinematicVariable {
    pub const ALL: [KinematicVariable; 8] = [
        Self::HipLeft,
        Self::HipRight,
        Self::KneeLeft,
        Self::KneeRight,
        Self::AnkleLeft,
        Self::AnkleRight,
        Self::FootProgressionLeft,
        Self::FootProgressionRight,
    ];

    /// Column name in the `parametres_cinematiques` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::HipLeft => "ROM_Hanche_Gauche",
            Self::HipRight => "ROM_Hanche_Droite",
            Self::KneeLeft => "ROM_Genou_Gauche",
            Self::KneeRight => "ROM_Genou_Droite",
            Self::AnkleLeft => "ROM_Cheville_Gauche",
            Self::AnkleRight => "ROM_Cheville_Droite",
            Self::FootProgressionLeft => "Foot_Progression_Gauche",
            Self::FootProgressionRight => "Foot_Progression_Droite",
        }
    }
}

/// Dynamic variables recovered as a calibrated curve peak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DynamicVariable {
    #[serde(rename = "Peak_Force_Verticale")]
    VerticalForce,
    #[serde(rename = "Peak_Power_Knee")]
    KneePower,
    #[serde(rename = "Peak_Power_Ankle")]
    AnklePower,
    #[serde(rename = "Peak_Moment_Hip")]
    HipMoment,
    #[serde(rename = "Peak_Moment_Knee")]
    KneeMoment,
    #[serde(rename = "Peak_Moment_Ankle")]
    AnkleMoment,
}

impl DynamicVariable {
    pub const ALL: [DynamicVariable; 6] = [
        Self::VerticalForce,
        Self::KneePower,
        Self::AnklePower,
        Self::HipMoment,
        Self::KneeMoment,
        Self::AnkleMoment,
    ];

    /// Column name in the `parametres_dynamiques` table.
    pub fn column(self) -> &'static str {
        match self {
            Self::VerticalForce => "Peak_Force_Verticale",
            Self::KneePower => "Peak_Power_Knee",
            Self::AnklePower => "Peak_Power_Ankle",
            Self::HipMoment => "Peak_Moment_Hip",
            Self::KneeMoment => "Peak_Moment_Knee",
            Self::AnkleMoment => "Peak_Moment_Ankle",
        }
    }
}

/// Pixel rectangle `(y1, y2, x1, x2)`, half-open on both axes.
///
/// Serialized as a 4-element sequence in the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u32; 4]", into = "[u32; 4]")]
pub struct CropRect {
    pub y1: u32,
    pub y2: u32,
    pub x1: u32,
    pub x2: u32,
}

impl CropRect {
    pub const fn new(y1: u32, y2: u32, x1: u32, x2: u32) -> Self {
        Self { y1, y2, x1, x2 }
    }
}

impl From<[u32; 4]> for CropRect {
    fn from([y1, y2, x1, x2]: [u32; 4]) -> Self {
        Self { y1, y2, x1, x2 }
    }
}

impl From<CropRect> for [u32; 4] {
    fn from(rect: CropRect) -> Self {
        [rect.y1, rect.y2, rect.x1, rect.x2]
    }
}

/// Where a kinematic curve lives: 0-based page index, crop and curve color.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RomRegion {
    pub page_index: u32,
    pub crop: CropRect,
    pub color: CurveColor,
}

/// Where a dynamics curve lives.
///
/// `page` is 1-based, matching the page numbers printed on the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeakRegion {
    pub page: u32,
    pub crop: CropRect,
    pub color: CurveColor,
    pub mode: PeakMode,
}

impl PeakRegion {
    /// 0-based page index used when rendering.
    pub fn page_index(&self) -> u32 {
        self.page.saturating_sub(1)
    }
}

/// レポートテンプレートのレイアウト表。
///
/// プロセス起動時に一度だけ読み込み、以降は `Arc` で共有して変更しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutTable {
    /// テキスト抽出対象のページ（0始まり）。YAMLでは `"2-5"` のような範囲文字列。
    #[serde(deserialize_with = "deserialize_pages")]
    pub text_pages: Vec<u32>,
    pub rom_scale: f64,
    pub peak_scale: f64,
    pub kinematics: BTreeMap<KinematicVariable, RomRegion>,
    pub dynamics: BTreeMap<DynamicVariable, PeakRegion>,
}

static BUILTIN_LAYOUT: LazyLock<Arc<LayoutTable>> = LazyLock::new(|| Arc::new(build_builtin()));

/// 組み込みレイアウト（共有インスタンス）を返す。
pub fn builtin_layout() -> Arc<LayoutTable> {
    Arc::clone(&BUILTIN_LAYOUT)
}

fn build_builtin() -> LayoutTable {
    use CurveColor::{Blue, Red};
    use DynamicVariable as D;
    use KinematicVariable as K;

    let hip = CropRect::new(637, 1275, 0, 1100);
    let knee = CropRect::new(1275, 1912, 0, 1100);
    let ankle = CropRect::new(1912, 2550, 0, 1100);
    let foot = CropRect::new(0, 2550, 0, 1650);

    let rom = |page_index, crop, color| RomRegion {
        page_index,
        crop,
        color,
    };
    let kinematics = BTreeMap::from([
        (K::HipLeft, rom(4, hip, Red)),
        (K::HipRight, rom(4, hip, Blue)),
        (K::KneeLeft, rom(4, knee, Red)),
        (K::KneeRight, rom(4, knee, Blue)),
        (K::AnkleLeft, rom(4, ankle, Red)),
        (K::AnkleRight, rom(4, ankle, Blue)),
        (K::FootProgressionLeft, rom(5, foot, Red)),
        (K::FootProgressionRight, rom(5, foot, Blue)),
    ]);

    let peak = |page, crop, mode| PeakRegion {
        page,
        crop,
        color: Blue,
        mode,
    };
    let dynamics = BTreeMap::from([
        (
            D::VerticalForce,
            peak(5, CropRect::new(0, 2550, 1650, 3300), PeakMode::Signed),
        ),
        (
            D::KneePower,
            peak(6, CropRect::new(850, 1700, 2200, 3300), PeakMode::Signed),
        ),
        (
            D::AnklePower,
            peak(6, CropRect::new(1700, 2550, 2200, 3300), PeakMode::Signed),
        ),
        (
            D::HipMoment,
            peak(6, CropRect::new(0, 850, 1100, 2200), PeakMode::Magnitude),
        ),
        (
            D::KneeMoment,
            peak(6, CropRect::new(850, 1700, 1100, 2200), PeakMode::Magnitude),
        ),
        (
            D::AnkleMoment,
            peak(6, CropRect::new(1700, 2550, 1100, 2200), PeakMode::Magnitude),
        ),
    ]);

    LayoutTable {
        text_pages: vec![2, 3, 4, 5],
        rom_scale: DEGREES_PER_PIXEL,
        peak_scale: UNITS_PER_PIXEL,
        kinematics,
        dynamics,
    }
}

impl LayoutTable {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let layout: LayoutTable = serde_yml::from_str(yaml).map_err(|e| {
            GaitError::config(format!("Failed to parse layout YAML: {e}"))
        })?;
        layout.validate()?;
        Ok(layout)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// 全14変数が揃っていること、校正定数が正であることを検証する。
    pub fn validate(&self) -> crate::error::Result<()> {
        for scale in [self.rom_scale, self.peak_scale] {
            if !(scale.is_finite() && scale > 0.0) {
                return Err(GaitError::config(format!(
                    "calibration scale must be a positive number, got {scale}"
                )));
            }
        }
        if let Some(missing) = KinematicVariable::ALL
            .iter()
            .find(|v| !self.kinematics.contains_key(*v))
        {
            return Err(GaitError::config(format!(
                "layout is missing kinematic variable {}",
                missing.column()
            )));
        }
        if let Some(missing) = DynamicVariable::ALL
            .iter()
            .find(|v| !self.dynamics.contains_key(*v))
        {
            return Err(GaitError::config(format!(
                "layout is missing dynamic variable {}",
                missing.column()
            )));
        }
        if let Some((var, _)) = self.dynamics.iter().find(|(_, r)| r.page == 0) {
            return Err(GaitError::config(format!(
                "dynamic variable {} uses 1-based page numbers, got 0",
                var.column()
            )));
        }
        Ok(())
    }

    /// 描画が必要なページ（0始まり、重複なし、昇順）。
    pub fn render_pages(&self) -> BTreeSet<u32> {
        self.kinematics
            .values()
            .map(|r| r.page_index)
            .chain(self.dynamics.values().map(PeakRegion::page_index))
            .collect()
    }
}

/// ページ範囲文字列をパースしてページ番号のベクタに変換する。
///
/// 形式:
/// - 単一ページ: `"5"`
/// - 範囲: `"2-5"` (2, 3, 4, 5)
/// - 混合（カンマ区切り）: `"1, 3, 5-10"`
///
/// 結果はソート済み・重複なし。
pub fn parse_page_range(s: &str) -> crate::error::Result<Vec<u32>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(GaitError::config("Page range cannot be empty"));
    }

    let mut pages = Vec::new();

    for part in trimmed.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if let Some((start_str, end_str)) = part.split_once('-') {
            let start: u32 = start_str.trim().parse().map_err(|_| {
                GaitError::config(format!("Invalid page number in range: '{start_str}'"))
            })?;
            let end: u32 = end_str.trim().parse().map_err(|_| {
                GaitError::config(format!("Invalid page number in range: '{end_str}'"))
            })?;

            if start > end {
                return Err(GaitError::config(format!(
                    "Invalid page range: start ({start}) > end ({end})"
                )));
            }

            pages.extend(start..=end);
        } else {
            let page: u32 = part
                .parse()
                .map_err(|_| GaitError::config(format!("Invalid page number: '{part}'")))?;
            pages.push(page);
        }
    }

    if pages.is_empty() {
        return Err(GaitError::config("Page range resolved to empty set"));
    }

    pages.sort();
    pages.dedup();
    Ok(pages)
}

/// serdeのdeserialize_withで使用するページ範囲デシリアライザ。
///
/// 範囲文字列 (`"2-5"`) とページ番号の列 (`[2, 3, 4, 5]`) のどちらも受け付ける。
fn deserialize_pages<'de, D>(deserializer: D) -> Result<Vec<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Pages {
        Range(String),
        List(Vec<u32>),
    }

    match Pages::deserialize(deserializer)? {
        Pages::Range(s) => parse_page_range(&s).map_err(serde::de::Error::custom),
        Pages::List(mut pages) => {
            pages.sort_unstable();
            pages.dedup();
            Ok(pages)
        }
    }
}
