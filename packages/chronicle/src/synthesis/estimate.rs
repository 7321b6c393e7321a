//! Date estimation for undated events from their dated neighbours.

use tracing::{debug, warn};

use crate::contract::{fields, StructuredClient};
use crate::extractor::dates::parse_oracle_date;
use crate::prompts::format_estimate_prompt;
use crate::traits::oracle::TextOracle;
use crate::types::event::TimelineEvent;

use super::SYNTHESIS_TEMPERATURE;

/// Fill `estimated_date` for events without a confirmed date.
///
/// Each request shows the oracle up to `context_size` dated events nearest
/// by position. Nothing happens when no event is dated. Returns the number
/// of estimates made.
pub async fn estimate_missing_dates<O: TextOracle>(
    client: &StructuredClient<O>,
    events: &mut [TimelineEvent],
    context_size: usize,
) -> usize {
    let dated: Vec<usize> = events
        .iter()
        .enumerate()
        .filter(|(_, e)| e.date.is_some())
        .map(|(i, _)| i)
        .collect();
    if dated.is_empty() {
        debug!("No dated events, skipping date estimation");
        return 0;
    }

    let mut estimated = 0;
    for i in 0..events.len() {
        if events[i].date.is_some() {
            continue;
        }

        let prompt = {
            let context: Vec<&TimelineEvent> = nearest_dated(&dated, i, context_size)
                .into_iter()
                .map(|j| &events[j])
                .collect();
            format_estimate_prompt(&events[i], &context)
        };

        match client
            .json_object(&prompt, &client.params_at(SYNTHESIS_TEMPERATURE))
            .await
        {
            Ok(object) => {
                let estimate = fields::opt_string(&object, "estimated_date")
                    .and_then(|answer| parse_oracle_date(&answer));
                debug!(
                    event_id = %events[i].id,
                    estimate = ?estimate,
                    reasoning = %fields::string(&object, "reasoning"),
                    "Date estimate"
                );
                if estimate.is_some() {
                    events[i].estimated_date = estimate;
                    estimated += 1;
                }
            }
            Err(e) => {
                warn!(event_id = %events[i].id, error = %e, "Date estimation failed");
            }
        }
    }
    estimated
}

/// Up to `limit` dated positions closest to `target`, in ascending order.
///
/// Equal distances prefer the earlier position.
pub fn nearest_dated(dated: &[usize], target: usize, limit: usize) -> Vec<usize> {
    let mut by_distance: Vec<usize> = dated.to_vec();
    by_distance.sort_by_key(|&j| (j.abs_diff(target), j));
    by_distance.truncate(limit);
    by_distance.sort_unstable();
    by_distance
}
