pub mod crop;
pub mod peak;
pub mod rom;
pub mod segmenter;

/// Round to 2 decimal places, the precision stored for every chart value.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
