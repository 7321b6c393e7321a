//! Question-Driven Timeline Synthesis
//!
//! Builds a chronological, deduplicated and causally linked account of a
//! topic from news articles, using a text-generation oracle for extraction
//! and judgement.
//!
//! # Design Philosophy
//!
//! - The oracle is an injected capability ([`TextOracle`]), never a global
//! - Malformed oracle output degrades to partial results, it does not fail
//! - Every synthesis stage has a fallback, so a run always yields a timeline
//! - Configuration is one explicit value threaded through constructors
//!
//! # Usage
//!
//! ```rust,ignore
//! use chronicle::{Chronicle, ChronicleConfig, MemoryStore, OpenAiOracle};
//!
//! let config = ChronicleConfig::from_env()?;
//! let oracle = OpenAiOracle::from_config(&config.oracle)?;
//! let store = Arc::new(MemoryStore::with_articles(load_articles(dir)?));
//!
//! let chronicle = Chronicle::new(oracle, store.clone(), Some(store), config)?;
//! let output = chronicle.run("How did the merger unfold?", today).await;
//! println!("{}", serde_json::to_string_pretty(&output.timeline)?);
//! ```
//!
//! # Modules
//!
//! - [`contract`] - Retrying, repairing structured requests to the oracle
//! - [`extractor`] - Per-document event, entity and date extraction
//! - [`synthesis`] - Timeline construction stages
//! - [`query`] - Question analysis and multi-query retrieval
//! - [`pipeline`] - End-to-end driver
//! - [`traits`] - Oracle, search and cache abstractions
//! - [`types`] - Data model and configuration
//! - [`oracle`] - HTTP oracle implementation
//! - [`stores`] - In-memory search index and cache
//! - [`testing`] - Mock implementations for testing

pub mod contract;
pub mod error;
pub mod extractor;
pub mod oracle;
pub mod pipeline;
pub mod prompts;
pub mod query;
pub mod stores;
pub mod synthesis;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use contract::{repair_and_parse, JsonShape, OutputKind, Structured, StructuredClient};
pub use error::{ChronicleError, ExtractError, OracleError, Result};
pub use extractor::EventExtractor;
pub use oracle::OpenAiOracle;
pub use pipeline::{Chronicle, PipelineOutput};
pub use query::{QueryAnalysis, QueryAnalyzer, QueryType, TemporalConstraint};
pub use stores::MemoryStore;
pub use synthesis::TimelineBuilder;
pub use traits::{
    cache::ExtractionCache,
    oracle::{GenerationParams, TextOracle},
    search::{DocumentSearch, SearchHit},
};
pub use types::{
    article::{load_articles, Article},
    config::{ChronicleConfig, ExtractorConfig, OracleConfig, QueryConfig, TimelineConfig},
    event::{EventType, RawEvent, TimelineEvent},
    extraction::{Entity, EntityKind, ExtractionResult, TemporalKind, TemporalReference},
    timeline::{CausalKind, CausalLink, DateRange, Timeline, TimelineMetadata},
};
