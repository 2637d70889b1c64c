// Phase 3: ラベル付きテキストからスカラー値を抽出する

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

/// Capture patterns for the English labels printed on the report.
///
/// Every pattern has exactly one capture group. Patterns compiled with `(?s)`
/// may cross line breaks between a label and its value.
pub struct FieldPatterns {
    pub date_of_birth: Regex,
    pub test_date: Regex,
    pub sex: Regex,
    pub height: Regex,
    pub weight: Regex,
    pub speed: Regex,
    pub step_length_left: Regex,
    pub step_length_right: Regex,
    pub cycle_time_left: Regex,
    pub cycle_time_right: Regex,
    pub steps_per_minute_left: Regex,
    pub steps_per_minute_right: Regex,
    pub double_support: Regex,
}

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("field patterns are compile-time constants")
}

pub static FIELD_PATTERNS: LazyLock<FieldPatterns> = LazyLock::new(|| FieldPatterns {
    date_of_birth: re(r"(?s)Date of Birth \(mm/dd/yyyy\)\s*:\s*(\d{2}/\d{2}/\d{4})"),
    test_date: re(r"(?s)Test Date \(mm/dd/yyyy\)\s*:\s*(\d{2}/\d{2}/\d{4})"),
    sex: re(r"(?s)Sex\s*:\s*(Male|Female)"),
    height: re(r"(?s)Height\s*:\s*([\d.]+)m"),
    weight: re(r"(?s)Weight\s*:\s*([\d.]+)Kg"),
    speed: re(r"(?s)Speed\s*([\d.]+)"),
    step_length_left: re(r"(?s)Step Length.*?Left\s*:\s*([\d.]+)"),
    step_length_right: re(r"(?s)Step Length.*?Right\s*:\s*([\d.]+)"),
    cycle_time_left: re(r"(?s)Cycle Time.*?Left\s*:\s*([\d.]+)"),
    cycle_time_right: re(r"(?s)Cycle Time.*?Right\s*:\s*([\d.]+)"),
    steps_per_minute_left: re(r"(?s)Steps\s*/\s*Minute.*?Left\s*:\s*([\d.]+)"),
    steps_per_minute_right: re(r"(?s)Steps\s*/\s*Minute.*?Right\s*:\s*([\d.]+)"),
    double_support: re(r"(?s)Dbl Limb Support.*?([0-9]+\.[0-9]+)"),
});

/// First capture group of `pattern` in `text`, parsed as `T`.
///
/// `None` when the pattern does not match or the capture does not parse.
pub fn extract_field<T: FromStr>(text: &str, pattern: &Regex) -> Option<T> {
    let captures = pattern.captures(text)?;
    captures.get(1)?.as_str().parse().ok()
}

/// [`extract_field`] for measurements. Non-finite results count as missing.
pub fn extract_number(text: &str, pattern: &Regex) -> Option<f64> {
    extract_field::<f64>(text, pattern).filter(|v| v.is_finite())
}
