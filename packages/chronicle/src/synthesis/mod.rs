//! Timeline synthesis.
//!
//! [`TimelineBuilder::construct_timeline`] turns a bag of raw events from
//! many documents into one [`Timeline`]. The stages run strictly in order:
//!
//! 1. filter low-confidence and trivially short events
//! 2. [`group`] duplicates into similarity groups
//! 3. [`merge`] each group into one timeline event
//! 4. [`estimate`] dates for undated events from dated neighbours
//! 5. [`sort`] chronologically, undated events last
//! 6. infer [`causal`] links
//! 7. score [`importance`] against the topic
//! 8. [`assemble`]: drop unimportant events and compute the scores
//!
//! Every oracle-backed stage has a fallback, so construction never fails.
//!
//! # Usage
//!
//! ```rust,ignore
//! let builder = TimelineBuilder::new(oracle, &config);
//! let timeline = builder.construct_timeline(&raw_events, "energy mergers").await;
//! ```

pub mod assemble;
pub mod causal;
pub mod estimate;
pub mod group;
pub mod importance;
pub mod merge;
pub mod sort;

use tracing::{debug, info};

use crate::contract::StructuredClient;
use crate::traits::oracle::TextOracle;
use crate::types::config::{ChronicleConfig, TimelineConfig};
use crate::types::event::RawEvent;
use crate::types::extraction::ExtractionResult;
use crate::types::timeline::Timeline;

/// Temperature for every synthesis request.
pub(crate) const SYNTHESIS_TEMPERATURE: f32 = 0.1;

/// Builds timelines from raw events.
pub struct TimelineBuilder<O> {
    client: StructuredClient<O>,
    config: TimelineConfig,
}

impl<O: TextOracle> TimelineBuilder<O> {
    /// Create a builder with the oracle and timeline settings from `config`.
    pub fn new(oracle: O, config: &ChronicleConfig) -> Self {
        Self {
            client: StructuredClient::new(oracle, &config.oracle),
            config: config.timeline.clone(),
        }
    }

    /// Create a builder around an existing client.
    pub fn with_client(client: StructuredClient<O>, config: TimelineConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Run every stage over `events` and assemble the timeline for `topic`.
    pub async fn construct_timeline(&self, events: &[RawEvent], topic: &str) -> Timeline {
        info!(events = events.len(), topic, "Constructing timeline");

        let filtered = filter_events(events, &self.config);
        info!(
            before = events.len(),
            after = filtered.len(),
            min_confidence = self.config.min_confidence,
            "Filtered events"
        );
        if filtered.is_empty() {
            return Timeline::empty(topic);
        }

        let groups = group::group_events(&self.client, &filtered).await;
        info!(events = filtered.len(), groups = groups.len(), "Grouped similar events");

        let mut merged = merge::merge_groups(&self.client, &filtered, &groups).await;
        info!(events = merged.len(), "Merged event groups");

        let estimated =
            estimate::estimate_missing_dates(&self.client, &mut merged, self.config.estimation_context)
                .await;
        info!(estimated, "Estimated missing dates");

        sort::sort_chronologically(&mut merged);
        debug!(events = merged.len(), "Sorted events chronologically");

        let links = causal::infer_causal_links(&self.client, &mut merged).await;
        info!(links = links.len(), "Inferred causal links");

        let scored = importance::score_importance(
            &self.client,
            &mut merged,
            topic,
            self.config.default_importance,
        )
        .await;
        info!(scored, events = merged.len(), "Scored event importance");

        let timeline = assemble::assemble(merged, links, topic, &self.config);
        info!(
            events = timeline.len(),
            confidence = timeline.confidence,
            completeness = timeline.completeness_score,
            "Created timeline"
        );
        timeline
    }

    /// Build a timeline from the events of several extraction results.
    pub async fn construct_from_extractions(
        &self,
        results: &[ExtractionResult],
        topic: &str,
    ) -> Timeline {
        let events: Vec<RawEvent> = results
            .iter()
            .flat_map(|r| r.events.iter().cloned())
            .collect();
        self.construct_timeline(&events, topic).await
    }
}

/// Keep events at or above `min_confidence` whose description is longer
/// than `min_description_chars`.
pub fn filter_events(events: &[RawEvent], config: &TimelineConfig) -> Vec<RawEvent> {
    events
        .iter()
        .filter(|e| {
            e.confidence >= config.min_confidence
                && e.description.trim().chars().count() > config.min_description_chars
        })
        .cloned()
        .collect()
}
