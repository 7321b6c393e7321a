//! Merging of grouped raw events into timeline events.

use std::collections::HashSet;

use indexmap::IndexSet;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::contract::{fields, StructuredClient};
use crate::extractor::dates::is_unspecified;
use crate::prompts::format_merge_prompt;
use crate::traits::oracle::TextOracle;
use crate::types::event::{event_id, EventType, RawEvent, TimelineEvent};

use super::SYNTHESIS_TEMPERATURE;

/// Merge every group into exactly one timeline event, in group order.
///
/// Ids of the returned events are distinct, see [`disambiguate_ids`].
pub async fn merge_groups<O: TextOracle>(
    client: &StructuredClient<O>,
    events: &[RawEvent],
    groups: &[Vec<usize>],
) -> Vec<TimelineEvent> {
    let mut merged = Vec::with_capacity(groups.len());
    for group in groups {
        let members: Vec<&RawEvent> = group.iter().filter_map(|&i| events.get(i)).collect();
        if let Some(event) = merge_group(client, &members).await {
            merged.push(event);
        }
    }
    disambiguate_ids(&mut merged);
    merged
}

/// Suffix repeated ids with their occurrence number (`_2`, `_3`, ...).
///
/// Unmerged events with identical descriptions hash to the same id.
pub fn disambiguate_ids(events: &mut [TimelineEvent]) {
    let mut seen: HashSet<String> = HashSet::with_capacity(events.len());
    for event in events.iter_mut() {
        if seen.insert(event.id.clone()) {
            continue;
        }
        let mut n = 2;
        while seen.contains(&format!("{}_{n}", event.id)) {
            n += 1;
        }
        event.id = format!("{}_{n}", event.id);
        seen.insert(event.id.clone());
    }
}

/// Merge one group. Singletons are copied without asking the oracle.
///
/// Returns `None` only for an empty group.
pub async fn merge_group<O: TextOracle>(
    client: &StructuredClient<O>,
    members: &[&RawEvent],
) -> Option<TimelineEvent> {
    match members {
        [] => None,
        [single] => Some(TimelineEvent::from_raw(single)),
        _ => {
            let prompt = format_merge_prompt(members);
            let merged = match client
                .json_object(&prompt, &client.params_at(SYNTHESIS_TEMPERATURE))
                .await
            {
                Ok(object) => from_oracle(&object, members),
                Err(e) => {
                    warn!(error = %e, members = members.len(), "Merge request failed");
                    None
                }
            };
            Some(merged.unwrap_or_else(|| {
                debug!(members = members.len(), "Using first member as merge representative");
                fallback_merge(members)
            }))
        }
    }
}

/// Merge without the oracle: the first member stands for the group.
///
/// `members` holds at least two events.
fn fallback_merge(members: &[&RawEvent]) -> TimelineEvent {
    let primary = members[0];
    TimelineEvent {
        id: event_id(&primary.description),
        description: primary.description.clone(),
        date: first_date(members),
        date_text: primary.date_text.clone(),
        estimated_date: None,
        entities: union_entities(members),
        sources: union_sources(members),
        confidence: mean_confidence(members),
        causal_successors: IndexSet::new(),
        event_type: EventType::classify(&primary.description),
        importance_score: 0.0,
    }
}

/// Build the merged event from the oracle's answer, or `None` if it is unusable.
fn from_oracle(object: &Map<String, Value>, members: &[&RawEvent]) -> Option<TimelineEvent> {
    let description = fields::opt_string(object, "merged_description")?;

    let mean = mean_confidence(members);
    let confidence = fields::number(object, "confidence")
        .map(|c| (c as f32).clamp(0.0, 1.0).min(mean))
        .unwrap_or(mean);

    let mut entities: IndexSet<String> = fields::string_list(object, "all_entities")
        .into_iter()
        .collect();
    entities.extend(union_entities(members));

    let date_text = fields::opt_string(object, "primary_date_text")
        .filter(|t| !is_unspecified(t))
        .or_else(|| {
            members
                .iter()
                .map(|m| &m.date_text)
                .find(|t| !is_unspecified(t))
                .cloned()
        })
        .unwrap_or_else(|| "not specified".to_string());

    let event_type = fields::opt_string(object, "event_type")
        .and_then(|label| EventType::from_label(&label))
        .unwrap_or_else(|| EventType::classify(&description));

    Some(TimelineEvent {
        id: event_id(&description),
        description,
        date: first_date(members),
        date_text,
        estimated_date: None,
        entities,
        sources: union_sources(members),
        confidence,
        causal_successors: IndexSet::new(),
        event_type,
        importance_score: 0.0,
    })
}

/// First member date in group order.
fn first_date(members: &[&RawEvent]) -> Option<chrono::NaiveDate> {
    members.iter().find_map(|m| m.resolved_date)
}

fn union_entities(members: &[&RawEvent]) -> IndexSet<String> {
    members
        .iter()
        .flat_map(|m| m.entities.iter().cloned())
        .collect()
}

fn union_sources(members: &[&RawEvent]) -> IndexSet<String> {
    members
        .iter()
        .map(|m| m.source_document_id.clone())
        .collect()
}

/// Arithmetic mean of member confidences.
pub fn mean_confidence(members: &[&RawEvent]) -> f32 {
    if members.is_empty() {
        return 0.0;
    }
    members.iter().map(|m| m.confidence).sum::<f32>() / members.len() as f32
}
