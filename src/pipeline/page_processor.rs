// Phase 5: ページ単位処理: ページ上の全変数を 切り出し → 色分離 → 校正

use image::RgbImage;
use tracing::debug;

use crate::chart::crop::crop_region;
use crate::chart::peak::resolve_peak;
use crate::chart::rom::rom_from_crop;
use crate::chart::segmenter::segment;
use crate::config::layout::LayoutTable;
use crate::record::ChartValues;

/// Resolve every layout variable that lives on `page_index` from its bitmap.
///
/// Variables on other pages are left untouched in `charts`, so a caller can
/// feed pages one at a time and drop each bitmap afterwards.
pub fn process_page(
    page_index: u32,
    bitmap: &RgbImage,
    layout: &LayoutTable,
    charts: &mut ChartValues,
) {
    for (&var, region) in layout
        .kinematics
        .iter()
        .filter(|(_, r)| r.page_index == page_index)
    {
        let crop = crop_region(bitmap, region.crop);
        let value = rom_from_crop(&crop, region.color, layout.rom_scale);
        debug!(page = page_index, variable = var.column(), ?value, "resolved ROM");
        charts.kinematics.set(var, value);
    }

    for (&var, region) in layout
        .dynamics
        .iter()
        .filter(|(_, r)| r.page_index() == page_index)
    {
        let crop = crop_region(bitmap, region.crop);
        let mask = segment(&crop, region.color);
        let value = resolve_peak(&mask, region.mode, layout.peak_scale);
        debug!(page = page_index, variable = var.column(), ?value, "resolved peak");
        charts.dynamics.set(var, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layout::{DynamicVariable, KinematicVariable, builtin_layout};
    use image::Rgb;

    fn blank_page() -> RgbImage {
        RgbImage::from_pixel(3300, 2550, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_blank_page_leaves_everything_none() {
        let layout = builtin_layout();
        let mut charts = ChartValues::default();
        process_page(4, &blank_page(), &layout, &mut charts);
        process_page(5, &blank_page(), &layout, &mut charts);
        assert_eq!(charts, ChartValues::default());
    }

    #[test]
    fn test_red_streak_in_hip_crop() {
        let layout = builtin_layout();
        let mut page = blank_page();
        for y in 700..=900 {
            page.put_pixel(500, y, Rgb([255, 0, 0]));
        }

        let mut charts = ChartValues::default();
        process_page(4, &page, &layout, &mut charts);

        assert_eq!(charts.kinematics.get(KinematicVariable::HipLeft), Some(100.0));
        assert_eq!(charts.kinematics.get(KinematicVariable::HipRight), None);
        assert_eq!(charts.kinematics.get(KinematicVariable::KneeLeft), None);
    }

    #[test]
    fn test_other_page_is_ignored() {
        let layout = builtin_layout();
        let mut page = blank_page();
        for y in 700..=900 {
            page.put_pixel(500, y, Rgb([255, 0, 0]));
        }

        let mut charts = ChartValues::default();
        // ページ3はレイアウトに含まれない
        process_page(3, &page, &layout, &mut charts);
        assert_eq!(charts, ChartValues::default());
    }

    #[test]
    fn test_blue_vertical_force_peak() {
        let layout = builtin_layout();
        let mut page = blank_page();
        // 垂直床反力: ダイナミクス5ページ目(=index 4)の右半分、行2050 → 偏差500px
        for x in 2000..2100 {
            page.put_pixel(x, 2050, Rgb([0, 0, 255]));
        }

        let mut charts = ChartValues::default();
        process_page(4, &page, &layout, &mut charts);

        assert_eq!(charts.dynamics.get(DynamicVariable::VerticalForce), Some(4.0));
        assert_eq!(charts.dynamics.get(DynamicVariable::KneePower), None);
    }
}
