//! Chronological ordering.

use std::cmp::Ordering;

use crate::types::event::TimelineEvent;

/// Stable ascending sort by `date ?? estimated_date`, undated events last.
pub fn sort_chronologically(events: &mut [TimelineEvent]) {
    events.sort_by(|a, b| match (a.effective_date(), b.effective_date()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::event::RawEvent;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn event(description: &str, when: Option<NaiveDate>) -> TimelineEvent {
        TimelineEvent::from_raw(&RawEvent::new(description, 0.8, "doc").with_date("x", when))
    }

    fn descriptions(events: &[TimelineEvent]) -> Vec<&str> {
        events.iter().map(|e| e.description.as_str()).collect()
    }

    #[test]
    fn test_undated_events_go_last() {
        let mut events = vec![
            event("march", NaiveDate::from_ymd_opt(2024, 3, 1)),
            event("undated", None),
            event("january", NaiveDate::from_ymd_opt(2024, 1, 1)),
        ];
        sort_chronologically(&mut events);
        assert_eq!(descriptions(&events), vec!["january", "march", "undated"]);
    }

    #[test]
    fn test_estimates_sort_with_dates() {
        let mut estimated = event("estimated", None);
        estimated.estimated_date = NaiveDate::from_ymd_opt(2024, 2, 1);
        let mut events = vec![
            event("no date", None),
            event("march", NaiveDate::from_ymd_opt(2024, 3, 1)),
            estimated,
            event("also no date", None),
        ];
        sort_chronologically(&mut events);
        assert_eq!(
            descriptions(&events),
            vec!["estimated", "march", "no date", "also no date"]
        );
    }

    proptest! {
        #[test]
        fn prop_sort_is_ordered_and_stable(days in prop::collection::vec(prop::option::of(0u64..40), 0..30)) {
            let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
            let mut events: Vec<TimelineEvent> = days
                .iter()
                .enumerate()
                .map(|(i, d)| event(&format!("event {i}"), d.and_then(|d| base.checked_add_days(chrono::Days::new(d)))))
                .collect();
            sort_chronologically(&mut events);

            let position = |e: &TimelineEvent| -> usize {
                e.description.trim_start_matches("event ").parse().unwrap()
            };
            for pair in events.windows(2) {
                match (pair[0].effective_date(), pair[1].effective_date()) {
                    (Some(a), Some(b)) => {
                        prop_assert!(a <= b);
                        if a == b {
                            prop_assert!(position(&pair[0]) < position(&pair[1]));
                        }
                    }
                    (None, Some(_)) => prop_assert!(false, "undated event before a dated one"),
                    (None, None) => prop_assert!(position(&pair[0]) < position(&pair[1])),
                    (Some(_), None) => {}
                }
            }
        }
    }
}
