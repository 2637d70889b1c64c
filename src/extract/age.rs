use chrono::{Datelike, NaiveDate};

const REPORT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Birthday-aware age in whole years at `test_date`.
///
/// Both dates use the report's `mm/dd/yyyy` format. One year is subtracted
/// when the test date's (month, day) falls before the birthday's. `None` if
/// either date fails to parse.
pub fn calculate_age(date_of_birth: &str, test_date: &str) -> Option<i32> {
    let dob = NaiveDate::parse_from_str(date_of_birth.trim(), REPORT_DATE_FORMAT).ok()?;
    let test = NaiveDate::parse_from_str(test_date.trim(), REPORT_DATE_FORMAT).ok()?;

    let before_birthday = (test.month(), test.day()) < (dob.month(), dob.day());
    Some(test.year() - dob.year() - i32::from(before_birthday))
}
