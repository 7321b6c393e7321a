//! Topical importance scoring.

use serde_json::Value;
use tracing::{debug, warn};

use crate::contract::{fields, StructuredClient};
use crate::prompts::format_importance_prompt;
use crate::traits::oracle::TextOracle;
use crate::types::event::TimelineEvent;

use super::SYNTHESIS_TEMPERATURE;

/// Score every event's relevance to `topic`.
///
/// Every event starts at `default_importance`; valid oracle scores replace
/// it. A failed request leaves every event at the default. Returns the
/// number of events the oracle scored.
pub async fn score_importance<O: TextOracle>(
    client: &StructuredClient<O>,
    events: &mut [TimelineEvent],
    topic: &str,
    default_importance: f32,
) -> usize {
    for event in events.iter_mut() {
        event.importance_score = default_importance;
    }
    if events.is_empty() {
        return 0;
    }

    let prompt = format_importance_prompt(topic, events);
    match client
        .json_array(&prompt, &client.params_at(SYNTHESIS_TEMPERATURE))
        .await
    {
        Ok(items) => {
            let scored = apply_scores(events, &items);
            debug!(events = events.len(), scored, "Scored importance");
            scored
        }
        Err(e) => {
            warn!(
                error = %e,
                default_importance,
                "Importance scoring failed, using the default for every event"
            );
            0
        }
    }
}

/// Apply `{event_id, importance_score}` records. Out-of-range ids and scores
/// outside [0, 1] are ignored.
pub fn apply_scores(events: &mut [TimelineEvent], items: &[Value]) -> usize {
    let mut scored = 0;
    for object in items.iter().filter_map(Value::as_object) {
        let Some(index) = fields::index(object, "event_id").filter(|&i| i < events.len()) else {
            continue;
        };
        let Some(score) = fields::number(object, "importance_score")
            .filter(|s| (0.0..=1.0).contains(s))
        else {
            continue;
        };
        events[index].importance_score = score as f32;
        scored += 1;
    }
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracle;
    use crate::types::config::OracleConfig;
    use crate::types::event::RawEvent;

    fn events(n: usize) -> Vec<TimelineEvent> {
        (0..n)
            .map(|i| TimelineEvent::from_raw(&RawEvent::new(format!("Event number {i}"), 0.8, "doc")))
            .collect()
    }

    fn client(mock: &MockOracle) -> StructuredClient<MockOracle> {
        StructuredClient::new(mock.clone(), &OracleConfig::default())
    }

    #[tokio::test]
    async fn test_invalid_scores_keep_default() {
        let mock = MockOracle::new().with_response(
            "Score the importance",
            r#"[{"event_id": 0, "importance_score": 0.9},
                {"event_id": 1, "importance_score": 1.7},
                {"event_id": 5, "importance_score": 0.2},
                {"event_id": 2, "importance_score": 0.05}]"#,
        );
        let mut events = events(4);

        let scored = score_importance(&client(&mock), &mut events, "mergers", 0.5).await;

        assert_eq!(scored, 2);
        let scores: Vec<f32> = events.iter().map(|e| e.importance_score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.05, 0.5]);
        assert!(mock.calls()[0].prompt.contains("timeline about \"mergers\""));
    }

    #[tokio::test]
    async fn test_failed_request_sets_default_everywhere() {
        let mock = MockOracle::new().with_failure("Score the importance", "down");
        let mut events = events(3);
        events[1].importance_score = 0.1;
        assert_eq!(score_importance(&client(&mock), &mut events, "t", 0.5).await, 0);
        assert!(events.iter().all(|e| e.importance_score == 0.5));
    }

    #[tokio::test]
    async fn test_scoring_twice_is_idempotent() {
        let mock = MockOracle::new()
            .with_response("Score the importance", r#"[{"event_id": 1, "importance_score": 0.2}]"#);
        let client = client(&mock);
        let mut events = events(2);

        score_importance(&client, &mut events, "t", 0.5).await;
        let first = events.clone();
        score_importance(&client, &mut events, "t", 0.5).await;

        assert_eq!(events, first);
    }
}
