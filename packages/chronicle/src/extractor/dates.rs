//! Deterministic date parsing for oracle answers and article phrases.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// Answer the date-resolution prompt uses for unresolvable phrases.
pub const UNRESOLVED_MARKER: &str = "UNABLE_TO_RESOLVE";

// The whole answer must be the date; a time of day is the only suffix allowed.
static ISO_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[T ]\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$",
    )
    .expect("valid regex")
});
static ISO_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-(\d{1,2})$").expect("valid regex"));
static ISO_YEAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d{4})$").expect("valid regex"));

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})[/-](\d{1,2})[/-](\d{4})").expect("valid regex")
});
static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?\s+(\d{1,2}),?\s+(\d{4})\b").expect("valid regex")
});
static DAY_MONTH_YEAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,2})\s+([a-z]{3,9})\.?\s+(\d{4})\b").expect("valid regex")
});

/// Whether a date phrase carries no temporal information.
pub fn is_unspecified(date_text: &str) -> bool {
    let text = date_text.trim().to_lowercase();
    text.is_empty() || text == "not specified" || text == "unknown" || text == "none"
}

/// Parse the oracle's answer to a date-resolution request.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM` (first of the month) and `YYYY`
/// (January 1st) when they make up the whole answer; a trailing time of day
/// is ignored. The unresolved marker and anything else yield `None`.
pub fn parse_oracle_date(answer: &str) -> Option<NaiveDate> {
    let answer = answer
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '`')
        .trim();
    if answer.is_empty() || answer.to_uppercase().contains(UNRESOLVED_MARKER) {
        return None;
    }

    if let Some(caps) = ISO_DAY.captures(answer) {
        return ymd(&caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = ISO_MONTH.captures(answer) {
        return ymd(&caps[1], &caps[2], "1");
    }
    if let Some(caps) = ISO_YEAR.captures(answer) {
        return ymd(&caps[1], "1", "1");
    }
    None
}

/// Parse a fully specified calendar date written in prose.
///
/// Handles `MM/DD/YYYY`, `MM-DD-YYYY`, `Month D, YYYY`, `D Month YYYY`
/// and abbreviated month names.
pub fn parse_date_text(text: &str) -> Option<NaiveDate> {
    if is_unspecified(text) {
        return None;
    }
    if let Some(date) = parse_oracle_date(text).filter(|_| ISO_DAY.is_match(text.trim())) {
        return Some(date);
    }
    if let Some(caps) = NUMERIC_DATE.captures(text) {
        return ymd(&caps[3], &caps[1], &caps[2]);
    }
    MONTH_DAY_YEAR
        .captures_iter(text)
        .find_map(|caps| ymd_named(&caps[3], &caps[1], &caps[2]))
        .or_else(|| {
            DAY_MONTH_YEAR
                .captures_iter(text)
                .find_map(|caps| ymd_named(&caps[3], &caps[2], &caps[1]))
        })
}

/// Month number for a full or three-letter English month name.
pub fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    let name = name.to_lowercase();
    let name = name.trim_end_matches('.');
    MONTHS
        .iter()
        .position(|m| {
            *m == name || (name.len() == 3 && m.starts_with(name)) || (name == "sept" && *m == "september")
        })
        .map(|i| i as u32 + 1)
}

fn ymd_named(year: &str, month_name: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month_number(month_name)?, day.parse().ok()?)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_oracle_full_date() {
        assert_eq!(parse_oracle_date("2024-03-31"), date(2024, 3, 31));
        assert_eq!(parse_oracle_date("  \"2024-3-5\"\n"), date(2024, 3, 5));
    }

    #[test]
    fn test_oracle_month_and_year() {
        assert_eq!(parse_oracle_date("2023-07"), date(2023, 7, 1));
        assert_eq!(parse_oracle_date("2020"), date(2020, 1, 1));
    }

    #[test]
    fn test_oracle_unresolved() {
        assert_eq!(parse_oracle_date("UNABLE_TO_RESOLVE"), None);
        assert_eq!(parse_oracle_date("unable_to_resolve"), None);
        assert_eq!(parse_oracle_date(""), None);
    }

    #[test]
    fn test_oracle_garbage_is_none() {
        assert_eq!(parse_oracle_date("sometime in spring"), None);
        assert_eq!(parse_oracle_date("2024-13-45"), None);
        assert_eq!(parse_oracle_date("The date is 2024-01-01"), None);
        assert_eq!(parse_oracle_date("20240115"), None);
        assert_eq!(parse_oracle_date("202401"), None);
        assert_eq!(parse_oracle_date("1234567"), None);
        assert_eq!(parse_oracle_date("2024 or maybe 2025, unclear"), None);
        assert_eq!(parse_oracle_date("99999-01-01"), None);
        assert_eq!(parse_oracle_date("2024-01-15 (estimated)"), None);
    }

    #[test]
    fn test_oracle_date_with_time_of_day() {
        assert_eq!(parse_oracle_date("2024-01-15T10:30:00Z"), date(2024, 1, 15));
        assert_eq!(parse_oracle_date("2024-01-15 10:30"), date(2024, 1, 15));
        assert_eq!(parse_oracle_date("2024-01-15T10:30:00+02:00"), date(2024, 1, 15));
    }

    #[test]
    fn test_date_text_formats() {
        assert_eq!(parse_date_text("January 11, 2024"), date(2024, 1, 11));
        assert_eq!(parse_date_text("on 11 January 2024"), date(2024, 1, 11));
        assert_eq!(parse_date_text("Jan. 11, 2024"), date(2024, 1, 11));
        assert_eq!(parse_date_text("3/15/2023"), date(2023, 3, 15));
        assert_eq!(parse_date_text("2022-02-24"), date(2022, 2, 24));
    }

    #[test]
    fn test_date_text_unspecified() {
        assert_eq!(parse_date_text("not specified"), None);
        assert_eq!(parse_date_text("Unknown"), None);
        assert_eq!(parse_date_text("last quarter"), None);
    }

    #[test]
    fn test_month_number() {
        assert_eq!(month_number("March"), Some(3));
        assert_eq!(month_number("sep"), Some(9));
        assert_eq!(month_number("Sept"), Some(9));
        assert_eq!(month_number("Dec."), Some(12));
        assert_eq!(month_number("Monday"), None);
    }
}
