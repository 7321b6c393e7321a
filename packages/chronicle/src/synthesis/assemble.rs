//! Final importance cutoff and timeline assembly.

use std::collections::HashSet;

use tracing::debug;

use crate::types::config::TimelineConfig;
use crate::types::event::TimelineEvent;
use crate::types::timeline::{CausalLink, DateRange, Timeline, TimelineMetadata};

/// Drop unimportant events and build the [`Timeline`].
///
/// `metadata` counts the events before the cutoff. Successor sets and
/// links are pruned to the surviving events.
pub fn assemble(
    events: Vec<TimelineEvent>,
    links: Vec<CausalLink>,
    topic: &str,
    config: &TimelineConfig,
) -> Timeline {
    let metadata = TimelineMetadata {
        total_events: events.len(),
        dated_events: events.iter().filter(|e| e.date.is_some()).count(),
        estimated_dates: events
            .iter()
            .filter(|e| e.date.is_none() && e.estimated_date.is_some())
            .count(),
        causal_relationships: links.len(),
    };

    let before = events.len();
    let mut events: Vec<TimelineEvent> = events
        .into_iter()
        .filter(|e| e.importance_score >= config.importance_threshold)
        .collect();
    debug!(
        before,
        after = events.len(),
        threshold = config.importance_threshold,
        "Applied importance cutoff"
    );

    if events.is_empty() {
        return Timeline {
            metadata,
            ..Timeline::empty(topic)
        };
    }

    let surviving: HashSet<String> = events.iter().map(|e| e.id.clone()).collect();
    for event in &mut events {
        event.causal_successors.retain(|id| surviving.contains(id));
    }
    let causal_links = links
        .into_iter()
        .filter(|l| surviving.contains(&l.cause) && surviving.contains(&l.effect))
        .collect();

    Timeline {
        date_range: DateRange::over(&events),
        confidence: mean_confidence(&events),
        completeness_score: completeness(&events, config.completeness_multiplier),
        consistency_score: consistency(&events, config.consistency_score),
        topic: topic.to_string(),
        causal_links,
        metadata,
        events,
    }
}

fn mean_confidence(events: &[TimelineEvent]) -> f32 {
    if events.is_empty() {
        return 0.0;
    }
    events.iter().map(|e| e.confidence).sum::<f32>() / events.len() as f32
}

/// Fraction of events with a date or estimate, scaled and capped at 1.
pub fn completeness(events: &[TimelineEvent], multiplier: f32) -> f32 {
    if events.is_empty() {
        return 0.0;
    }
    let dated = events.iter().filter(|e| e.effective_date().is_some()).count();
    (dated as f32 / events.len() as f32 * multiplier).min(1.0)
}

/// Coarse chronological coherence: 1.0 below two events, 0.8 with fewer
/// than two dated events, otherwise `dated_score`.
pub fn consistency(events: &[TimelineEvent], dated_score: f32) -> f32 {
    if events.len() < 2 {
        return 1.0;
    }
    let dated = events.iter().filter(|e| e.effective_date().is_some()).count();
    if dated < 2 {
        0.8
    } else {
        dated_score
    }
}
