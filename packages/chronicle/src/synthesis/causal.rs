//! Causal link inference over the sorted events.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::contract::{fields, StructuredClient};
use crate::prompts::format_causal_prompt;
use crate::traits::oracle::TextOracle;
use crate::types::event::TimelineEvent;
use crate::types::timeline::{CausalKind, CausalLink};

use super::SYNTHESIS_TEMPERATURE;

/// Ask the oracle for cause/effect pairs and record them on the events.
///
/// Each accepted link appends the effect's id to the cause's
/// `causal_successors`. A failed request adds no links.
pub async fn infer_causal_links<O: TextOracle>(
    client: &StructuredClient<O>,
    events: &mut [TimelineEvent],
) -> Vec<CausalLink> {
    if events.len() < 2 {
        return Vec::new();
    }

    let prompt = format_causal_prompt(events);
    let items = match client
        .json_array(&prompt, &client.params_at(SYNTHESIS_TEMPERATURE))
        .await
    {
        Ok(items) => items,
        Err(e) => {
            warn!(error = %e, "Causal link inference failed, continuing without links");
            return Vec::new();
        }
    };

    let links = apply_links(events, &items);
    debug!(proposed = items.len(), accepted = links.len(), "Inferred causal links");
    links
}

/// Validate oracle link records against `events` and apply the accepted ones.
///
/// Records with out-of-range or missing indices, self links and repeated
/// pairs are discarded.
pub fn apply_links(events: &mut [TimelineEvent], items: &[Value]) -> Vec<CausalLink> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for item in items {
        let Some(object) = item.as_object() else {
            continue;
        };
        let (Some(cause), Some(effect)) = (
            fields::index(object, "cause_event_id"),
            fields::index(object, "effect_event_id"),
        ) else {
            continue;
        };
        if cause >= events.len() || effect >= events.len() || cause == effect {
            debug!(cause, effect, "Discarding causal link");
            continue;
        }
        if !seen.insert((cause, effect)) {
            continue;
        }

        let effect_id = events[effect].id.clone();
        events[cause].causal_successors.insert(effect_id.clone());
        links.push(CausalLink {
            cause: events[cause].id.clone(),
            effect: effect_id,
            kind: CausalKind::from_label(&fields::string(object, "relationship_type")),
            confidence: fields::number(object, "confidence")
                .map(|c| (c as f32).clamp(0.0, 1.0))
                .unwrap_or(0.5),
        });
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracle;
    use crate::types::config::OracleConfig;
    use crate::types::event::RawEvent;
    use serde_json::json;

    fn events(n: usize) -> Vec<TimelineEvent> {
        (0..n)
            .map(|i| TimelineEvent::from_raw(&RawEvent::new(format!("Event number {i}"), 0.8, "doc")))
            .collect()
    }

    #[test]
    fn test_apply_links_discards_invalid_records() {
        let mut events = events(3);
        let items = vec![
            json!({"cause_event_id": 0, "effect_event_id": 2, "relationship_type": "direct_cause", "confidence": 0.9}),
            json!({"cause_event_id": 0, "effect_event_id": 2, "relationship_type": "reaction"}),
            json!({"cause_event_id": 1, "effect_event_id": 7}),
            json!({"cause_event_id": 1, "effect_event_id": 1}),
            json!({"cause_event_id": -1, "effect_event_id": 0}),
            json!({"effect_event_id": 0}),
            json!("0 -> 1"),
            json!({"cause_event_id": "1", "effect_event_id": 2, "relationship_type": "weird"}),
        ];

        let links = apply_links(&mut events, &items);

        assert_eq!(links.len(), 2);
        assert_eq!(links[0].cause, events[0].id);
        assert_eq!(links[0].effect, events[2].id);
        assert_eq!(links[0].kind, CausalKind::DirectCause);
        assert_eq!(links[1].kind, CausalKind::ContributingFactor);
        assert_eq!(links[1].confidence, 0.5);
        assert!(events[0].causal_successors.contains(&events[2].id));
        assert!(events[1].causal_successors.contains(&events[2].id));
        assert!(events[2].causal_successors.is_empty());
    }

    #[tokio::test]
    async fn test_failure_adds_no_links() {
        let mock = MockOracle::new().with_failure("Identify causal relationships", "down");
        let client = StructuredClient::new(mock.clone(), &OracleConfig::default());
        let mut events = events(2);
        assert!(infer_causal_links(&client, &mut events).await.is_empty());
        assert!(events.iter().all(|e| e.causal_successors.is_empty()));
    }

    #[tokio::test]
    async fn test_single_event_makes_no_call() {
        let mock = MockOracle::new();
        let client = StructuredClient::new(mock.clone(), &OracleConfig::default());
        let mut events = events(1);
        assert!(infer_causal_links(&client, &mut events).await.is_empty());
        assert!(mock.calls().is_empty());
    }
}
