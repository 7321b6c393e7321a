//! Event and entity extraction from single documents.
//!
//! # Usage
//!
//! ```rust,ignore
//! let extractor = EventExtractor::new(oracle, &config);
//! let results = extractor
//!     .extract_articles_with_cache(&articles, Some(&store), Some("energy mergers"))
//!     .await;
//! ```
//!
//! Oracle failures for one document are logged and that document is
//! skipped; sibling documents are unaffected.

pub mod dates;
pub mod temporal;

use chrono::{NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::contract::{fields, StructuredClient};
use crate::error::{ExtractResult, OracleResult};
use crate::prompts::{
    format_extract_entities_prompt, format_extract_events_prompt, format_resolve_date_prompt,
};
use crate::traits::cache::ExtractionCache;
use crate::traits::oracle::TextOracle;
use crate::types::article::Article;
use crate::types::config::{ChronicleConfig, ExtractorConfig};
use crate::types::event::RawEvent;
use crate::types::extraction::{Entity, EntityKind, ExtractionResult};

use self::dates::{is_unspecified, parse_oracle_date};
use self::temporal::extract_temporal_references;

/// Temperature for extraction and date resolution.
const EXTRACTION_TEMPERATURE: f32 = 0.1;

/// Confidence assumed when the oracle omits one.
const DEFAULT_CONFIDENCE: f32 = 0.5;

/// Turns document text into raw events, entities and temporal references.
pub struct EventExtractor<O> {
    client: StructuredClient<O>,
    config: ExtractorConfig,
}

impl<O: TextOracle> EventExtractor<O> {
    /// Create an extractor with the oracle and extraction settings from `config`.
    pub fn new(oracle: O, config: &ChronicleConfig) -> Self {
        Self {
            client: StructuredClient::new(oracle, &config.oracle),
            config: config.extraction.clone(),
        }
    }

    /// Create an extractor around an existing client.
    pub fn with_client(client: StructuredClient<O>, config: ExtractorConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract events from `text`, resolving each date phrase against `published`.
    ///
    /// Events below the confidence threshold are dropped. Items with missing
    /// fields get defaults rather than failing the document.
    pub async fn extract_events(
        &self,
        text: &str,
        document_id: &str,
        published: NaiveDate,
        topic_hint: Option<&str>,
    ) -> OracleResult<Vec<RawEvent>> {
        let prompt = format_extract_events_prompt(text, topic_hint);
        let items = self
            .client
            .json_array(&prompt, &self.client.params_at(EXTRACTION_TEMPERATURE))
            .await?;

        let mut events = Vec::new();
        let mut dropped = 0usize;

        for item in &items {
            let Some(object) = item.as_object() else {
                debug!(item = %item, "Skipping non-object event");
                continue;
            };

            let confidence = fields::number(object, "confidence")
                .map(|c| c as f32)
                .unwrap_or(DEFAULT_CONFIDENCE)
                .clamp(0.0, 1.0);
            if confidence < self.config.confidence_threshold {
                dropped += 1;
                continue;
            }

            let date_text = fields::opt_string(object, "date_text")
                .unwrap_or_else(|| "not specified".to_string());
            let resolved_date = self.resolve_date(&date_text, published, text).await;
            let snippet: String = fields::string(object, "source_text")
                .chars()
                .take(self.config.snippet_chars)
                .collect();

            events.push(
                RawEvent::new(fields::string(object, "description"), confidence, document_id)
                    .with_date(date_text, resolved_date)
                    .with_entities(fields::string_list(object, "entities"))
                    .with_snippet(snippet),
            );
        }

        debug!(
            document_id,
            returned = items.len(),
            kept = events.len(),
            dropped,
            "Extracted events"
        );
        Ok(events)
    }

    /// Resolve a date phrase to an absolute date, using `text` as context.
    ///
    /// Unspecified phrases are not sent to the oracle. Oracle failures and
    /// unresolvable answers yield `None`.
    pub async fn resolve_date(
        &self,
        date_text: &str,
        reference: NaiveDate,
        text: &str,
    ) -> Option<NaiveDate> {
        if is_unspecified(date_text) {
            return None;
        }

        let excerpt: String = text.chars().take(self.config.excerpt_chars).collect();
        let prompt = format_resolve_date_prompt(date_text, reference, &excerpt);

        match self
            .client
            .text(&prompt, &self.client.params_at(EXTRACTION_TEMPERATURE))
            .await
        {
            Ok(answer) => {
                let resolved = parse_oracle_date(&answer);
                debug!(date_text, answer = %answer, resolved = ?resolved, "Resolved date phrase");
                resolved
            }
            Err(e) => {
                warn!(date_text, error = %e, "Date resolution failed");
                None
            }
        }
    }

    /// Extract named entities from `text`, dropping those below the threshold.
    pub async fn extract_entities(&self, text: &str) -> OracleResult<Vec<Entity>> {
        let prompt = format_extract_entities_prompt(text);
        let items = self
            .client
            .json_array(&prompt, &self.client.params_at(EXTRACTION_TEMPERATURE))
            .await?;

        let entities = items
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|object| {
                let name = fields::opt_string(object, "name")?;
                let confidence = fields::number(object, "confidence")
                    .map(|c| c as f32)
                    .unwrap_or(DEFAULT_CONFIDENCE)
                    .clamp(0.0, 1.0);
                let mut mentions = fields::string_list(object, "mentions");
                if mentions.is_empty() {
                    mentions.push(name.clone());
                }
                Some(Entity {
                    kind: EntityKind::from_label(&fields::string(object, "type")),
                    name,
                    mentions,
                    confidence,
                })
            })
            .filter(|e| e.confidence >= self.config.confidence_threshold)
            .collect();

        Ok(entities)
    }

    /// Extract everything from one article.
    pub async fn extract_article(
        &self,
        article: &Article,
        topic_hint: Option<&str>,
    ) -> ExtractResult<ExtractionResult> {
        let text = article.full_text();
        let document_id = article.source_id();
        let published = article.published.date_naive();

        let events = self
            .extract_events(&text, &document_id, published, topic_hint)
            .await?;
        let entities = self.extract_entities(&text).await?;
        let temporal_references = extract_temporal_references(&text, published);

        info!(
            title = %article.title,
            events = events.len(),
            entities = entities.len(),
            temporal_references = temporal_references.len(),
            "Extracted article"
        );

        Ok(ExtractionResult {
            document_id,
            cache_key: article.cache_key(),
            title: article.title.clone(),
            published: article.published,
            events,
            entities,
            temporal_references,
            extracted_at: Utc::now(),
        })
    }

    /// Extract a batch of articles, consulting `cache` first when given.
    ///
    /// A cache hit is returned verbatim; a miss is extracted and stored.
    /// Failing articles are logged and left out. Up to
    /// `extraction.concurrency` articles are in flight at once; results keep
    /// input order.
    pub async fn extract_articles_with_cache<C>(
        &self,
        articles: &[Article],
        cache: Option<&C>,
        topic_hint: Option<&str>,
    ) -> Vec<ExtractionResult>
    where
        C: ExtractionCache + ?Sized,
    {
        let concurrency = self.config.concurrency.max(1);

        let outcomes: Vec<Outcome> = stream::iter(articles)
            .map(|article| self.extract_one(article, cache, topic_hint))
            .buffered(concurrency)
            .collect()
            .await;

        let hits = outcomes.iter().filter(|o| matches!(o, Outcome::Cached(_))).count();
        let failed = outcomes.iter().filter(|o| matches!(o, Outcome::Failed)).count();
        let misses = outcomes.len() - hits;

        if cache.is_some() {
            info!(hits, misses, "Extraction cache performance");
        }
        info!(
            articles = articles.len(),
            extracted = outcomes.len() - failed,
            failed,
            "Batch extraction complete"
        );

        outcomes
            .into_iter()
            .filter_map(|outcome| match outcome {
                Outcome::Cached(result) | Outcome::Extracted(result) => Some(result),
                Outcome::Failed => None,
            })
            .collect()
    }

    async fn extract_one<C>(
        &self,
        article: &Article,
        cache: Option<&C>,
        topic_hint: Option<&str>,
    ) -> Outcome
    where
        C: ExtractionCache + ?Sized,
    {
        let key = article.cache_key();

        if let Some(cache) = cache {
            match cache.get_cached_extraction(&key).await {
                Ok(Some(result)) => {
                    debug!(title = %article.title, "Using cached extraction");
                    return Outcome::Cached(result);
                }
                Ok(None) => {}
                Err(e) => warn!(title = %article.title, error = %e, "Cache lookup failed"),
            }
        }

        let result = match self.extract_article(article, topic_hint).await {
            Ok(result) => result,
            Err(e) => {
                warn!(title = %article.title, error = %e, "Extraction failed, skipping article");
                return Outcome::Failed;
            }
        };

        if let Some(cache) = cache {
            match cache.set_cached_extraction(&key, &result).await {
                Ok(true) => debug!(title = %article.title, "Cached extraction"),
                Ok(false) => warn!(title = %article.title, "Cache rejected extraction"),
                Err(e) => warn!(title = %article.title, error = %e, "Cache write failed"),
            }
        }

        Outcome::Extracted(result)
    }
}

enum Outcome {
    Cached(ExtractionResult),
    Extracted(ExtractionResult),
    Failed,
}
