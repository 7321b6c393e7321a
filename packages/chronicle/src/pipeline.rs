//! End-to-end driver from a question to a timeline.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;
use crate::extractor::EventExtractor;
use crate::query::{gather_documents, QueryAnalysis, QueryAnalyzer};
use crate::synthesis::TimelineBuilder;
use crate::traits::cache::ExtractionCache;
use crate::traits::oracle::TextOracle;
use crate::traits::search::{DocumentSearch, SearchHit};
use crate::types::config::ChronicleConfig;
use crate::types::extraction::ExtractionResult;
use crate::types::timeline::Timeline;

/// Everything one run produced, for the report generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub analysis: QueryAnalysis,
    pub hits: Vec<SearchHit>,
    pub extractions: Vec<ExtractionResult>,
    pub timeline: Timeline,
}

/// Owns the configuration and collaborators for question answering.
///
/// ```rust,ignore
/// let store = Arc::new(MemoryStore::with_articles(articles));
/// let chronicle = Chronicle::new(oracle, store.clone(), Some(store), config)?;
/// let output = chronicle.run("How did the merger unfold?", today).await;
/// ```
pub struct Chronicle<O, S, C> {
    config: ChronicleConfig,
    analyzer: QueryAnalyzer<O>,
    extractor: EventExtractor<O>,
    builder: TimelineBuilder<O>,
    search: S,
    cache: Option<C>,
}

impl<O, S, C> Chronicle<O, S, C>
where
    O: TextOracle + Clone,
    S: DocumentSearch,
    C: ExtractionCache,
{
    /// Wire the pipeline. Fails if `config` does not validate.
    pub fn new(oracle: O, search: S, cache: Option<C>, config: ChronicleConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            analyzer: QueryAnalyzer::new(oracle.clone(), &config),
            extractor: EventExtractor::new(oracle.clone(), &config),
            builder: TimelineBuilder::new(oracle, &config),
            search,
            cache,
            config,
        })
    }

    pub fn config(&self) -> &ChronicleConfig {
        &self.config
    }

    /// Answer `question` as asked on `today`.
    ///
    /// Oracle, search and fetch failures degrade the result; a run always
    /// ends with a timeline, empty when nothing relevant was found.
    pub async fn run(&self, question: &str, today: NaiveDate) -> PipelineOutput {
        info!(question, "Starting timeline run");

        let analysis = self.analyzer.analyze(question, today).await;
        let hits = gather_documents(&self.search, &analysis.expanded_queries, &self.config.query).await;

        if hits.is_empty() {
            warn!(question, "No documents found");
            return PipelineOutput {
                analysis,
                hits,
                extractions: Vec::new(),
                timeline: Timeline::empty(question),
            };
        }

        let mut articles = Vec::with_capacity(hits.len());
        for hit in &hits {
            match self.search.get_document(&hit.document_id).await {
                Ok(Some(article)) => articles.push(article),
                Ok(None) => warn!(document_id = %hit.document_id, "Document not found"),
                Err(e) => warn!(document_id = %hit.document_id, error = %e, "Document fetch failed"),
            }
        }
        info!(hits = hits.len(), articles = articles.len(), "Fetched documents");

        let extractions = self
            .extractor
            .extract_articles_with_cache(&articles, self.cache.as_ref(), Some(question))
            .await;
        let timeline = self
            .builder
            .construct_from_extractions(&extractions, question)
            .await;

        info!(
            documents = extractions.len(),
            events = timeline.len(),
            "Timeline run complete"
        );

        PipelineOutput {
            analysis,
            hits,
            extractions,
            timeline,
        }
    }
}
