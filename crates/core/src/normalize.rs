//! Normalization of payload values before they are written into a template.

use regex::Regex;
use std::sync::LazyLock;

/// Regex to find a year-first date such as `2024-1-5` or `2024/01/05`.
static YEAR_FIRST_DATE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})").unwrap());

/// Rewrite a year-first date into `DD-MM-YYYY`.
///
/// The first `YYYY-M-D` (or `/`-separated) occurrence wins and any
/// surrounding text is dropped, so `"2024-01-05T08:00:00"` becomes
/// `"05-01-2024"`. Values without such a date are returned trimmed.
pub fn normalize_date(value: &str) -> String {
    let trimmed = value.trim();

    match YEAR_FIRST_DATE_REGEX.captures(trimmed) {
        Some(caps) => format!("{:0>2}-{:0>2}-{}", &caps[3], &caps[2], &caps[1]),
        None => trimmed.to_string(),
    }
}
