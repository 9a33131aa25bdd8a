use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// Day/month-first numeric dates (`01/02/2021`, `1-2-21`) can't be told apart
/// from month/day-first ones, so they are never treated as dates.
static AMBIGUOUS_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}\b").expect("valid regex"));

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d-%b-%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
];

/// Parse a date or date-time string into its calendar date.
///
/// Accepts ISO dates (dash or slash separated), English month-name forms
/// such as `September 25, 2021` or `25-Sep-2021`, date-times in the same
/// layouts and RFC 3339 timestamps. The time part is dropped. Purely numeric
/// day/month forms and years outside `1000..=9999` are rejected.
pub fn try_parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.len() < 6 || AMBIGUOUS_NUMERIC.is_match(s) {
        return None;
    }

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.date_naive())
        })?;

    (1000..=9999).contains(&date.year()).then_some(date)
}
