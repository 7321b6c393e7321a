//! The assembled timeline handed to report generation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::event::TimelineEvent;

/// Earliest and latest effective dates over the timeline's events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: Option<NaiveDate>,
    pub latest: Option<NaiveDate>,
}

impl DateRange {
    /// Range over `date ?? estimated_date`; both bounds `None` if no event has either.
    pub fn over(events: &[TimelineEvent]) -> Self {
        let mut dates = events.iter().filter_map(TimelineEvent::effective_date);
        let Some(first) = dates.next() else {
            return Self::default();
        };
        let (earliest, latest) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Self {
            earliest: Some(earliest),
            latest: Some(latest),
        }
    }
}

/// Counts taken before the final importance cutoff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineMetadata {
    pub total_events: usize,
    pub dated_events: usize,
    pub estimated_dates: usize,
    pub causal_relationships: usize,
}

/// How strongly one event led to another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CausalKind {
    DirectCause,
    #[default]
    ContributingFactor,
    Reaction,
}

impl CausalKind {
    /// Parse an oracle label; unknown labels become `ContributingFactor`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "direct_cause" => Self::DirectCause,
            "reaction" => Self::Reaction,
            _ => Self::ContributingFactor,
        }
    }
}

/// An accepted cause/effect pair between two timeline events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CausalLink {
    /// Id of the causing event.
    pub cause: String,
    /// Id of the resulting event.
    pub effect: String,
    pub kind: CausalKind,
    pub confidence: f32,
}

/// A chronological, deduplicated and scored account of a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
    /// Events in chronological order, undated ones last.
    pub events: Vec<TimelineEvent>,
    pub topic: String,
    pub date_range: DateRange,
    /// Mean of member confidences.
    pub confidence: f32,
    pub completeness_score: f32,
    pub consistency_score: f32,
    #[serde(default)]
    pub causal_links: Vec<CausalLink>,
    pub metadata: TimelineMetadata,
}

impl Timeline {
    /// A timeline with no events and every score at zero.
    pub fn empty(topic: impl Into<String>) -> Self {
        Self {
            events: Vec::new(),
            topic: topic.into(),
            date_range: DateRange::default(),
            confidence: 0.0,
            completeness_score: 0.0,
            consistency_score: 0.0,
            causal_links: Vec::new(),
            metadata: TimelineMetadata::default(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Look up an event by id.
    pub fn event(&self, id: &str) -> Option<&TimelineEvent> {
        self.events.iter().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::event::RawEvent;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_date_range_uses_estimates() {
        let mut a = TimelineEvent::from_raw(
            &RawEvent::new("First event here", 0.8, "a").with_date("x", date(2024, 3, 1)),
        );
        let mut b = TimelineEvent::from_raw(&RawEvent::new("Second event here", 0.8, "b"));
        b.estimated_date = date(2023, 12, 31);
        let c = TimelineEvent::from_raw(&RawEvent::new("Third event here", 0.8, "c"));
        a.estimated_date = date(2030, 1, 1);

        let range = DateRange::over(&[a, b, c]);
        assert_eq!(range.earliest, date(2023, 12, 31));
        assert_eq!(range.latest, date(2024, 3, 1));
    }

    #[test]
    fn test_date_range_empty() {
        let undated = TimelineEvent::from_raw(&RawEvent::new("Nothing dated", 0.8, "a"));
        assert_eq!(DateRange::over(&[undated]), DateRange::default());
        assert_eq!(DateRange::over(&[]), DateRange::default());
    }

    #[test]
    fn test_causal_kind_labels() {
        assert_eq!(CausalKind::from_label("direct_cause"), CausalKind::DirectCause);
        assert_eq!(CausalKind::from_label("Reaction"), CausalKind::Reaction);
        assert_eq!(CausalKind::from_label("unrelated"), CausalKind::ContributingFactor);
    }

    #[test]
    fn test_empty_timeline() {
        let timeline = Timeline::empty("topic");
        assert!(timeline.is_empty());
        assert_eq!(timeline.confidence, 0.0);
        assert_eq!(timeline.date_range, DateRange::default());
    }
}
