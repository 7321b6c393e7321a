//! Configuration for the oracle, extractor, synthesis engine and query assembly.
//!
//! A single [`ChronicleConfig`] value is built once (usually by the binary)
//! and handed to every component that needs it.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ChronicleError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronicleConfig {
    #[serde(default)]
    pub oracle: OracleConfig,

    #[serde(default)]
    pub extraction: ExtractorConfig,

    #[serde(default)]
    pub timeline: TimelineConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

/// Oracle connection and request defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Base URL of an OpenAI-compatible API.
    ///
    /// Default: `http://localhost:8001/v1`.
    pub endpoint: String,

    /// Model name sent with every request.
    ///
    /// Default: `qwen3-30b`.
    pub model: String,

    /// Bearer token, if the endpoint requires one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Sampling temperature for requests that do not set their own.
    ///
    /// Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens per response. Default: 2000.
    pub max_tokens: u32,

    /// Total attempts per request, including the first. Default: 3.
    pub max_retries: u32,

    /// Per-request HTTP timeout. Default: 60.
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8001/v1".to_string(),
            model: "qwen3-30b".to_string(),
            api_key: None,
            temperature: 0.3,
            max_tokens: 2000,
            max_retries: 3,
            timeout_secs: 60,
        }
    }
}

/// Per-document extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Events and entities below this confidence are dropped.
    ///
    /// Default: 0.7.
    pub confidence_threshold: f32,

    /// Maximum characters kept from an event's source snippet. Default: 200.
    pub snippet_chars: usize,

    /// Characters of article text given as context for date resolution.
    ///
    /// Default: 1000.
    pub excerpt_chars: usize,

    /// Documents extracted at once. 1 means strictly sequential.
    ///
    /// Default: 1.
    pub concurrency: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            snippet_chars: 200,
            excerpt_chars: 1000,
            concurrency: 1,
        }
    }
}

/// Timeline synthesis thresholds and scoring constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineConfig {
    /// Raw events below this confidence are filtered out. Default: 0.5.
    pub min_confidence: f32,

    /// Descriptions must be longer than this many characters. Default: 10.
    pub min_description_chars: usize,

    /// Events scoring below this importance are dropped. Default: 0.3.
    pub importance_threshold: f32,

    /// Importance given to events the oracle did not score. Default: 0.5.
    ///
    /// Also applied to every event when the scoring request fails.
    pub default_importance: f32,

    /// Dated events shown to the oracle when estimating a date. Default: 10.
    pub estimation_context: usize,

    /// Multiplier applied to the dated fraction for completeness. Default: 1.2.
    pub completeness_multiplier: f32,

    /// Consistency reported once at least two events are dated. Default: 0.9.
    pub consistency_score: f32,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.5,
            min_description_chars: 10,
            importance_threshold: 0.3,
            default_importance: 0.5,
            estimation_context: 10,
            completeness_multiplier: 1.2,
            consistency_score: 0.9,
        }
    }
}

/// Query expansion and retrieval limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Upper bound on expanded queries, original included. Default: 5.
    pub max_expanded_queries: usize,

    /// Expanded queries actually sent to search. Default: 3.
    pub search_queries: usize,

    /// Hits requested per query. Default: 5.
    pub results_per_query: usize,

    /// Documents kept after deduplication. Default: 10.
    pub max_documents: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_expanded_queries: 5,
            search_queries: 3,
            results_per_query: 5,
            max_documents: 10,
        }
    }
}

impl ChronicleConfig {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load defaults, then apply `CHRONICLE_*` environment overrides.
    ///
    /// A `.env` file in the working directory is read first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(endpoint) = env::var("CHRONICLE_LLM_ENDPOINT") {
            config.oracle.endpoint = endpoint;
        }
        if let Ok(model) = env::var("CHRONICLE_LLM_MODEL") {
            config.oracle.model = model;
        }
        if let Ok(key) = env::var("CHRONICLE_LLM_API_KEY") {
            if !key.is_empty() {
                config.oracle.api_key = Some(key);
            }
        }

        override_from_env("CHRONICLE_LLM_TEMPERATURE", &mut config.oracle.temperature)?;
        override_from_env("CHRONICLE_LLM_MAX_TOKENS", &mut config.oracle.max_tokens)?;
        override_from_env("CHRONICLE_LLM_MAX_RETRIES", &mut config.oracle.max_retries)?;
        override_from_env("CHRONICLE_LLM_TIMEOUT_SECS", &mut config.oracle.timeout_secs)?;
        override_from_env("CHRONICLE_MIN_CONFIDENCE", &mut config.timeline.min_confidence)?;
        override_from_env(
            "CHRONICLE_EXTRACTION_THRESHOLD",
            &mut config.extraction.confidence_threshold,
        )?;
        override_from_env(
            "CHRONICLE_IMPORTANCE_THRESHOLD",
            &mut config.timeline.importance_threshold,
        )?;

        config.validate()?;
        Ok(config)
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<()> {
        if self.oracle.endpoint.trim().is_empty() {
            return Err(ChronicleError::Config("oracle endpoint is empty".into()));
        }
        if self.oracle.model.trim().is_empty() {
            return Err(ChronicleError::Config("oracle model is empty".into()));
        }
        if !(0.0..=2.0).contains(&self.oracle.temperature) {
            return Err(ChronicleError::Config(format!(
                "temperature {} outside [0, 2]",
                self.oracle.temperature
            )));
        }
        if self.oracle.max_tokens == 0 {
            return Err(ChronicleError::Config("max_tokens must be positive".into()));
        }
        if self.oracle.max_retries == 0 {
            return Err(ChronicleError::Config("max_retries must be at least 1".into()));
        }

        for (name, value) in [
            ("extraction.confidence_threshold", self.extraction.confidence_threshold),
            ("timeline.min_confidence", self.timeline.min_confidence),
            ("timeline.importance_threshold", self.timeline.importance_threshold),
            ("timeline.default_importance", self.timeline.default_importance),
            ("timeline.consistency_score", self.timeline.consistency_score),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ChronicleError::Config(format!(
                    "{name} = {value} outside [0, 1]"
                )));
            }
        }

        Ok(())
    }

    /// Set the oracle endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.oracle.endpoint = endpoint.into();
        self
    }

    /// Set the oracle model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.oracle.model = model.into();
        self
    }

    /// Set the total attempts per oracle request.
    pub fn with_max_retries(mut self, attempts: u32) -> Self {
        self.oracle.max_retries = attempts;
        self
    }

    /// Set the extraction confidence threshold.
    pub fn with_extraction_threshold(mut self, threshold: f32) -> Self {
        self.extraction.confidence_threshold = threshold;
        self
    }

    /// Set how many documents are extracted at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.extraction.concurrency = concurrency;
        self
    }

    /// Set the synthesis filter threshold.
    pub fn with_min_confidence(mut self, min: f32) -> Self {
        self.timeline.min_confidence = min;
        self
    }

    /// Set the final importance cutoff.
    pub fn with_importance_threshold(mut self, threshold: f32) -> Self {
        self.timeline.importance_threshold = threshold;
        self
    }
}

fn override_from_env<T: FromStr>(key: &str, target: &mut T) -> Result<()>
where
    T::Err: std::fmt::Display,
{
    if let Ok(raw) = env::var(key) {
        *target = raw
            .trim()
            .parse()
            .map_err(|e| ChronicleError::Config(format!("{key}={raw:?}: {e}")))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ChronicleConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.oracle.max_retries, 3);
        assert_eq!(config.timeline.estimation_context, 10);
        assert_eq!(config.query.max_documents, 10);
    }

    #[test]
    fn test_validate_rejects_bad_temperature() {
        let mut config = ChronicleConfig::default();
        config.oracle.temperature = 2.5;
        assert!(matches!(config.validate(), Err(ChronicleError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let config = ChronicleConfig::default().with_max_retries(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_threshold_out_of_range() {
        let config = ChronicleConfig::default().with_importance_threshold(1.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: ChronicleConfig =
            serde_json::from_str(r#"{"query": {"max_expanded_queries": 4, "search_queries": 2, "results_per_query": 3, "max_documents": 6}}"#)
                .unwrap();
        assert_eq!(config.query.search_queries, 2);
        assert_eq!(config.oracle.model, "qwen3-30b");
        assert_eq!(config.timeline.min_confidence, 0.5);
    }
}
