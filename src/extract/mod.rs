pub mod age;
pub mod fields;

use crate::record::{Demographics, Sex, SpatioTemporal};

use self::age::calculate_age;
use self::fields::{FIELD_PATTERNS, extract_field, extract_number};

/// Scalars recovered from the report's text layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextFields {
    pub demographics: Demographics,
    pub spatio_temporal: SpatioTemporal,
}

impl TextFields {
    /// Run every field pattern over the newline-joined text corpus.
    ///
    /// Never fails: each field that does not match is left as `None`.
    pub fn from_corpus(text: &str) -> Self {
        let p = &*FIELD_PATTERNS;

        let dob: Option<String> = extract_field(text, &p.date_of_birth);
        let test_date: Option<String> = extract_field(text, &p.test_date);
        let age = match (dob.as_deref(), test_date.as_deref()) {
            (Some(dob), Some(test)) => calculate_age(dob, test),
            _ => None,
        };
        let sex = extract_field::<String>(text, &p.sex).and_then(|s| Sex::from_label(&s));

        let demographics = Demographics {
            age,
            sex,
            height: extract_number(text, &p.height),
            weight: extract_number(text, &p.weight),
        };

        let spatio_temporal = SpatioTemporal {
            speed: extract_number(text, &p.speed),
            step_length_left: extract_number(text, &p.step_length_left),
            step_length_right: extract_number(text, &p.step_length_right),
            cycle_time_left: extract_number(text, &p.cycle_time_left),
            cycle_time_right: extract_number(text, &p.cycle_time_right),
            steps_per_min_left: extract_number(text, &p.steps_per_minute_left),
            steps_per_min_right: extract_number(text, &p.steps_per_minute_right),
            double_support_time: extract_number(text, &p.double_support),
        };

        Self {
            demographics,
            spatio_temporal,
        }
    }
}
