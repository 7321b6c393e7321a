//! In-memory article index and extraction cache.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::cache::ExtractionCache;
use crate::traits::search::{DocumentSearch, SearchHit};
use crate::types::article::Article;
use crate::types::extraction::ExtractionResult;

/// Characters of article body returned as a hit snippet.
const SNIPPET_CHARS: usize = 200;

/// In-memory article index and extraction cache.
///
/// Useful for the CLI, tests and small corpora. Nothing is persisted.
pub struct MemoryStore {
    articles: RwLock<HashMap<String, Article>>,
    extractions: RwLock<HashMap<String, ExtractionResult>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            articles: RwLock::new(HashMap::new()),
            extractions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a store indexing `articles`.
    pub fn with_articles(articles: impl IntoIterator<Item = Article>) -> Self {
        let store = Self::new();
        for article in articles {
            store.add_article(article);
        }
        store
    }

    /// Index an article under its source id, replacing any previous version.
    pub fn add_article(&self, article: Article) {
        self.articles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(article.source_id(), article);
    }

    /// Number of indexed articles.
    pub fn article_count(&self) -> usize {
        self.articles.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of cached extractions.
    pub fn extraction_count(&self) -> usize {
        self.extractions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clear all stored data.
    pub fn clear(&self) {
        self.articles.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.extractions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl DocumentSearch for MemoryStore {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<SearchHit>> {
        let articles = self.articles.read().unwrap_or_else(PoisonError::into_inner);
        let query_lower = query.to_lowercase();
        let query_terms: Vec<&str> = query_lower.split_whitespace().collect();

        let mut scored: Vec<SearchHit> = articles
            .iter()
            .filter_map(|(id, article)| {
                let text = format!("{}\n{}", article.title, article.content).to_lowercase();
                let length_norm = 1.0 + (text.len().max(1) as f32).ln();

                // Term frequency, dampened and normalized by document length
                let score: f32 = query_terms
                    .iter()
                    .map(|term| text.matches(term).count())
                    .filter(|&count| count > 0)
                    .map(|count| (1.0 + (count as f32).ln()) / length_norm)
                    .sum();

                (score > 0.0).then(|| SearchHit {
                    document_id: id.clone(),
                    score,
                    title: article.title.clone(),
                    snippet: article.content.chars().take(SNIPPET_CHARS).collect(),
                    published: article.published,
                })
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        scored.truncate(limit);

        Ok(scored)
    }

    async fn get_document(&self, document_id: &str) -> Result<Option<Article>> {
        Ok(self
            .articles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(document_id)
            .cloned())
    }
}

#[async_trait]
impl ExtractionCache for MemoryStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self
            .extractions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key))
    }

    async fn get_cached_extraction(&self, key: &str) -> Result<Option<ExtractionResult>> {
        Ok(self
            .extractions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned())
    }

    async fn set_cached_extraction(&self, key: &str, result: &ExtractionResult) -> Result<bool> {
        self.extractions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), result.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(name: &str, title: &str, body: &str) -> Article {
        let text = format!("Title: {title}\nSubtitle:\nAuthors:\nPublished: 2024-01-11T07:00:00Z\n\n{body}");
        Article::parse(&text, format!("articles/{name}.txt")).unwrap()
    }

    #[tokio::test]
    async fn test_search_ranks_by_term_frequency() {
        let store = MemoryStore::with_articles([
            article("a", "Gas merger", "Chesapeake and Southwestern agreed to a gas merger. Merger talks."),
            article("b", "Weather", "Rain is expected across the region."),
            article("c", "Markets", "A merger was mentioned once."),
        ]);

        let hits = store.search("merger", 10).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].document_id, "articles/a.txt");
        assert_eq!(hits[0].title, "Gas merger");
        assert!(hits[0].score > hits[1].score);
        assert!(hits.iter().all(|h| h.document_id != "articles/b.txt"));
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let store = MemoryStore::with_articles(
            (0..5).map(|i| article(&format!("d{i}"), "Energy", "energy news")),
        );
        let hits = store.search("energy", 3).await.unwrap();
        assert_eq!(hits.len(), 3);
        // Equal scores fall back to id order
        assert_eq!(hits[0].document_id, "articles/d0.txt");
    }

    #[tokio::test]
    async fn test_get_document() {
        let store = MemoryStore::with_articles([article("a", "Title", "Body")]);
        assert!(store.get_document("articles/a.txt").await.unwrap().is_some());
        assert!(store.get_document("articles/zzz.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_extraction_cache_roundtrip() {
        let store = MemoryStore::new();
        let doc = article("a", "Title", "Body");
        let result = ExtractionResult {
            document_id: doc.source_id(),
            cache_key: doc.cache_key(),
            title: doc.title.clone(),
            published: doc.published,
            events: vec![],
            entities: vec![],
            temporal_references: vec![],
            extracted_at: Utc::now(),
        };

        assert!(!store.exists(&doc.cache_key()).await.unwrap());
        assert!(store.set_cached_extraction(&doc.cache_key(), &result).await.unwrap());
        assert!(store.exists(&doc.cache_key()).await.unwrap());
        assert_eq!(
            store.get_cached_extraction(&doc.cache_key()).await.unwrap(),
            Some(result)
        );
        assert_eq!(store.extraction_count(), 1);

        store.clear();
        assert_eq!(store.extraction_count(), 0);
    }
}
