//! Extraction cache contract.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::extraction::ExtractionResult;

/// Key-value store for per-document extraction results.
///
/// Keys are stable document identifiers (see [`crate::types::article::Article::cache_key`]).
#[async_trait]
pub trait ExtractionCache: Send + Sync {
    /// Whether a result is stored under `key`.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Stored result for `key`, returned verbatim.
    async fn get_cached_extraction(&self, key: &str) -> Result<Option<ExtractionResult>>;

    /// Store `result` under `key`. Returns whether the write was accepted.
    async fn set_cached_extraction(&self, key: &str, result: &ExtractionResult) -> Result<bool>;
}

#[async_trait]
impl<T: ExtractionCache + ?Sized> ExtractionCache for std::sync::Arc<T> {
    async fn exists(&self, key: &str) -> Result<bool> {
        (**self).exists(key).await
    }

    async fn get_cached_extraction(&self, key: &str) -> Result<Option<ExtractionResult>> {
        (**self).get_cached_extraction(key).await
    }

    async fn set_cached_extraction(&self, key: &str, result: &ExtractionResult) -> Result<bool> {
        (**self).set_cached_extraction(key, result).await
    }
}
