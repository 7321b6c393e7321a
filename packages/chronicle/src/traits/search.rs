//! Document retrieval contract.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::article::Article;

/// One ranked search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub document_id: String,
    /// Relevance, higher is better. Only comparable within one result list.
    pub score: f32,
    pub title: String,
    pub snippet: String,
    pub published: DateTime<FixedOffset>,
}

/// A ranked document index.
#[async_trait]
pub trait DocumentSearch: Send + Sync {
    /// Return up to `limit` hits for `query`, best first.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>>;

    /// Fetch the full document behind a hit.
    async fn get_document(&self, document_id: &str) -> Result<Option<Article>>;
}

#[async_trait]
impl<T: DocumentSearch + ?Sized> DocumentSearch for std::sync::Arc<T> {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        (**self).search(query, limit).await
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Article>> {
        (**self).get_document(document_id).await
    }
}
