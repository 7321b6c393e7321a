//! Grouping of raw events that describe the same occurrence.

use serde_json::Value;
use tracing::{debug, warn};

use crate::contract::{fields, StructuredClient};
use crate::prompts::format_group_prompt;
use crate::traits::oracle::TextOracle;
use crate::types::event::RawEvent;

use super::SYNTHESIS_TEMPERATURE;

/// Partition `events` into similarity groups of indices.
///
/// The result always covers every index exactly once. A failed request
/// yields one singleton group per event.
pub async fn group_events<O: TextOracle>(
    client: &StructuredClient<O>,
    events: &[RawEvent],
) -> Vec<Vec<usize>> {
    if events.len() <= 1 {
        return singleton_groups(events.len());
    }

    let prompt = format_group_prompt(events);
    match client
        .json_array(&prompt, &client.params_at(SYNTHESIS_TEMPERATURE))
        .await
    {
        Ok(items) => {
            let groups = complete_partition(parse_groups(&items), events.len());
            debug!(events = events.len(), groups = groups.len(), "Grouped events");
            groups
        }
        Err(e) => {
            warn!(error = %e, "Event grouping failed, keeping every event separate");
            singleton_groups(events.len())
        }
    }
}

/// One group per index.
pub fn singleton_groups(len: usize) -> Vec<Vec<usize>> {
    (0..len).map(|i| vec![i]).collect()
}

/// Read groups from an oracle array. A bare index counts as a singleton.
pub fn parse_groups(items: &[Value]) -> Vec<Vec<usize>> {
    items
        .iter()
        .filter_map(|item| match item {
            Value::Array(members) => Some(members.iter().filter_map(fields::index_value).collect()),
            other => fields::index_value(other).map(|i| vec![i]),
        })
        .collect()
}

/// Turn raw oracle groups into a partition of `0..len`.
///
/// Out-of-range and repeated indices are dropped, empty groups vanish and
/// every index the oracle left out is appended as its own group. Members are
/// sorted and groups ordered by their first member.
pub fn complete_partition(groups: Vec<Vec<usize>>, len: usize) -> Vec<Vec<usize>> {
    let mut seen = vec![false; len];
    let mut partition: Vec<Vec<usize>> = Vec::with_capacity(groups.len());

    for group in groups {
        let mut members: Vec<usize> = group
            .into_iter()
            .filter(|&i| {
                if i >= len || seen[i] {
                    return false;
                }
                seen[i] = true;
                true
            })
            .collect();
        if members.is_empty() {
            continue;
        }
        members.sort_unstable();
        partition.push(members);
    }

    let recovered = seen.iter().filter(|s| !**s).count();
    if recovered > 0 {
        debug!(recovered, "Recovered events omitted from grouping");
    }
    partition.extend((0..len).filter(|&i| !seen[i]).map(|i| vec![i]));

    partition.sort_by_key(|group| group[0]);
    partition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracle;
    use crate::types::config::OracleConfig;
    use serde_json::json;

    fn events(n: usize) -> Vec<RawEvent> {
        (0..n)
            .map(|i| RawEvent::new(format!("Event number {i} happened"), 0.8, format!("doc{i}")))
            .collect()
    }

    #[test]
    fn test_parse_groups_accepts_bare_indices() {
        let items = vec![json!([0, 2]), json!(1), json!("3"), json!({"x": 1}), json!([-1, 4.5])];
        assert_eq!(parse_groups(&items), vec![vec![0, 2], vec![1], vec![3], vec![]]);
    }

    #[test]
    fn test_complete_partition_recovers_omitted() {
        let partition = complete_partition(vec![vec![3, 0], vec![0, 9], vec![]], 5);
        assert_eq!(partition, vec![vec![0, 3], vec![1], vec![2], vec![4]]);
    }

    #[test]
    fn test_complete_partition_of_nothing() {
        assert_eq!(complete_partition(vec![vec![0, 1]], 0), Vec::<Vec<usize>>::new());
    }

    #[tokio::test]
    async fn test_group_events_uses_oracle_partition() {
        let mock = MockOracle::new().with_response("Group these", "[[0, 2], [1]]");
        let client = StructuredClient::new(mock.clone(), &OracleConfig::default());
        let groups = group_events(&client, &events(4)).await;
        assert_eq!(groups, vec![vec![0, 2], vec![1], vec![3]]);
    }

    #[tokio::test]
    async fn test_group_events_failure_is_all_singletons() {
        let mock = MockOracle::new().with_failure("Group these", "down");
        let client = StructuredClient::new(mock.clone(), &OracleConfig::default());
        let groups = group_events(&client, &events(3)).await;
        assert_eq!(groups, singleton_groups(3));
    }

    #[tokio::test]
    async fn test_single_event_makes_no_call() {
        let mock = MockOracle::new();
        let client = StructuredClient::new(mock.clone(), &OracleConfig::default());
        assert_eq!(group_events(&client, &events(1)).await, vec![vec![0]]);
        assert!(mock.calls().is_empty());
    }
}
