//! Multi-query document retrieval.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::traits::search::{DocumentSearch, SearchHit};
use crate::types::config::QueryConfig;

/// Run the first `search_queries` queries and merge their hits.
///
/// Hits are deduplicated by document id, keeping the first occurrence, and
/// capped at `max_documents`. A failing query is logged and skipped.
pub async fn gather_documents<S>(search: &S, queries: &[String], config: &QueryConfig) -> Vec<SearchHit>
where
    S: DocumentSearch + ?Sized,
{
    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for query in queries.iter().take(config.search_queries) {
        match search.search(query, config.results_per_query).await {
            Ok(results) => {
                debug!(query = %query, results = results.len(), "Search returned");
                hits.extend(
                    results
                        .into_iter()
                        .filter(|hit| seen.insert(hit.document_id.clone())),
                );
            }
            Err(e) => warn!(query = %query, error = %e, "Search failed, skipping query"),
        }
    }

    hits.truncate(config.max_documents);
    info!(documents = hits.len(), "Gathered documents");
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ChronicleError, Result};
    use crate::types::article::Article;
    use async_trait::async_trait;
    use chrono::Utc;

    /// Returns `limit` fixed hits per query, failing on queries containing "boom".
    struct ScriptedSearch;

    #[async_trait]
    impl DocumentSearch for ScriptedSearch {
        async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
            if query.contains("boom") {
                return Err(ChronicleError::search(std::io::Error::other("index offline")));
            }
            Ok((0..limit)
                .map(|i| SearchHit {
                    document_id: format!("{}-{i}", query.len() % 2),
                    score: 1.0,
                    title: query.to_string(),
                    snippet: String::new(),
                    published: Utc::now().fixed_offset(),
                })
                .collect())
        }

        async fn get_document(&self, _document_id: &str) -> Result<Option<Article>> {
            Ok(None)
        }
    }

    fn queries(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_deduplicates_and_caps() {
        let config = QueryConfig {
            max_documents: 4,
            results_per_query: 3,
            ..QueryConfig::default()
        };
        // "ab" and "cd" produce the same ids
        let hits = gather_documents(&ScriptedSearch, &queries(&["ab", "cd", "xyz"]), &config).await;
        let ids: Vec<&str> = hits.iter().map(|h| h.document_id.as_str()).collect();
        assert_eq!(ids, vec!["0-0", "0-1", "0-2", "1-0"]);
        assert_eq!(hits[0].title, "ab");
    }

    #[tokio::test]
    async fn test_failed_query_is_skipped() {
        let hits = gather_documents(
            &ScriptedSearch,
            &queries(&["boom", "xyz"]),
            &QueryConfig::default(),
        )
        .await;
        assert_eq!(hits.len(), 5);
        assert!(hits.iter().all(|h| h.title == "xyz"));
    }

    #[tokio::test]
    async fn test_only_first_queries_are_run() {
        let config = QueryConfig {
            search_queries: 1,
            ..QueryConfig::default()
        };
        let hits = gather_documents(&ScriptedSearch, &queries(&["ab", "xyz"]), &config).await;
        assert!(hits.iter().all(|h| h.title == "ab"));
    }
}
