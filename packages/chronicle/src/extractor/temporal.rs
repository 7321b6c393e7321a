//! Pattern-based temporal references.
//!
//! Complements the oracle's per-event dates with every date-like phrase in
//! the article. Relative phrases resolve against the publish date.

use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

use super::dates::parse_date_text;
use crate::types::extraction::{TemporalKind, TemporalReference};

const RESOLVED_CONFIDENCE: f32 = 0.8;
const UNRESOLVED_CONFIDENCE: f32 = 0.3;

static ABSOLUTE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b",
        r"(?i)\b(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+\d{4}\b",
        r"(?i)\b\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4}\b",
        r"(?i)\b(?:Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\.?\s+\d{1,2},?\s+\d{4}\b",
    ])
});

static RELATIVE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    compile(&[
        r"(?i)\b(?:yesterday|today|tomorrow)\b",
        r"(?i)\b(?:last|this|next)\s+(?:week|month|year|quarter)\b",
        r"(?i)\b\d+\s+(?:days?|weeks?|months?|years?)\s+ago\b",
        r"(?i)\b(?:earlier|later)\s+(?:this|that)\s+(?:week|month|year)\b",
        r"(?i)\b(?:recently|shortly|soon)\b",
    ])
});

static UNITS_AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s+(day|week|month|year)s?\s+ago").expect("valid regex")
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
}

/// Find every date-like phrase in `text`, absolute patterns first.
pub fn extract_temporal_references(text: &str, reference: NaiveDate) -> Vec<TemporalReference> {
    let absolute = ABSOLUTE_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| reference_for(m.as_str(), parse_date_text(m.as_str()), TemporalKind::Absolute));

    let relative = RELATIVE_PATTERNS
        .iter()
        .flat_map(|re| re.find_iter(text))
        .map(|m| {
            reference_for(
                m.as_str(),
                resolve_relative(m.as_str(), reference),
                TemporalKind::Relative,
            )
        });

    absolute.chain(relative).collect()
}

fn reference_for(text: &str, resolved: Option<NaiveDate>, kind: TemporalKind) -> TemporalReference {
    TemporalReference {
        text: text.to_string(),
        resolved,
        kind,
        confidence: if resolved.is_some() {
            RESOLVED_CONFIDENCE
        } else {
            UNRESOLVED_CONFIDENCE
        },
    }
}

/// Resolve a relative phrase against `reference`.
///
/// Weeks are 7 days, months 30 and years 365. Phrases without a fixed
/// offset (`recently`, `last quarter`, ...) stay unresolved.
pub fn resolve_relative(phrase: &str, reference: NaiveDate) -> Option<NaiveDate> {
    let lower = phrase.to_lowercase();

    const FIXED: &[(&str, i64)] = &[
        ("yesterday", -1),
        ("today", 0),
        ("tomorrow", 1),
        ("last week", -7),
        ("this week", 0),
        ("next week", 7),
        ("last month", -30),
        ("this month", 0),
        ("next month", 30),
        ("last year", -365),
        ("this year", 0),
        ("next year", 365),
    ];
    if let Some((_, offset)) = FIXED.iter().find(|(key, _)| lower.contains(key)) {
        return shift(reference, *offset);
    }

    let caps = UNITS_AGO.captures(&lower)?;
    let count: i64 = caps[1].parse().ok()?;
    let unit_days = match &caps[2] {
        "day" => 1,
        "week" => 7,
        "month" => 30,
        _ => 365,
    };
    shift(reference, -count.checked_mul(unit_days)?)
}

fn shift(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    if days >= 0 {
        date.checked_add_days(Days::new(days.unsigned_abs()))
    } else {
        date.checked_sub_days(Days::new(days.unsigned_abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_fixed_phrases() {
        let today = date(2024, 3, 15);
        assert_eq!(resolve_relative("Yesterday", today), Some(date(2024, 3, 14)));
        assert_eq!(resolve_relative("next week", today), Some(date(2024, 3, 22)));
        assert_eq!(resolve_relative("last month", today), Some(date(2024, 2, 14)));
        assert_eq!(resolve_relative("last year", today), Some(date(2023, 3, 16)));
        assert_eq!(resolve_relative("earlier this week", today), Some(today));
    }

    #[test]
    fn test_resolve_units_ago() {
        let today = date(2024, 3, 15);
        assert_eq!(resolve_relative("3 days ago", today), Some(date(2024, 3, 12)));
        assert_eq!(resolve_relative("2 weeks ago", today), Some(date(2024, 3, 1)));
        assert_eq!(resolve_relative("1 month ago", today), Some(date(2024, 2, 14)));
    }

    #[test]
    fn test_unresolvable_phrases() {
        let today = date(2024, 3, 15);
        assert_eq!(resolve_relative("recently", today), None);
        assert_eq!(resolve_relative("last quarter", today), None);
        assert_eq!(resolve_relative("99999999999999999999 days ago", today), None);
    }

    #[test]
    fn test_extract_references() {
        let text = "On January 11, 2024 the firms agreed to merge. Shares fell yesterday \
                    and analysts expect approval recently discussed last quarter.";
        let refs = extract_temporal_references(text, date(2024, 1, 12));

        let merge = refs.iter().find(|r| r.text == "January 11, 2024").unwrap();
        assert_eq!(merge.kind, TemporalKind::Absolute);
        assert_eq!(merge.resolved, Some(date(2024, 1, 11)));
        assert_eq!(merge.confidence, 0.8);

        let yesterday = refs.iter().find(|r| r.text == "yesterday").unwrap();
        assert_eq!(yesterday.kind, TemporalKind::Relative);
        assert_eq!(yesterday.resolved, Some(date(2024, 1, 11)));

        let quarter = refs.iter().find(|r| r.text == "last quarter").unwrap();
        assert_eq!(quarter.resolved, None);
        assert_eq!(quarter.confidence, 0.3);

        assert!(refs.iter().any(|r| r.text == "recently"));
    }

    #[test]
    fn test_no_references() {
        assert!(extract_temporal_references("No dates here.", date(2024, 1, 1)).is_empty());
    }
}
