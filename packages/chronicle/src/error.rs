//! Typed errors for the chronicle library.
//!
//! Only oracle exhaustion is a hard failure inside the pipeline. Malformed
//! output, failed documents and degraded synthesis stages are logged and
//! handled locally, so they have no variant here.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the oracle or the contract layer wrapping it.
#[derive(Debug, Error)]
pub enum OracleError {
    /// Every attempt failed at the transport level
    #[error("oracle unavailable after {attempts} attempt(s): {reason}")]
    Unavailable { attempts: u32, reason: String },

    /// The oracle answered, but with nothing usable on every attempt
    #[error("oracle returned an empty response after {attempts} attempt(s)")]
    EmptyResponse { attempts: u32 },

    /// Request parameters violate the contract (empty prompt, bad temperature, ...)
    #[error("invalid oracle request: {0}")]
    InvalidRequest(String),

    /// A single attempt failed; the contract layer retries these
    #[error("oracle transport error: {0}")]
    Transport(String),
}

/// Errors raised while turning one document into an extraction result.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The oracle could not be reached for this document
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The document could not be parsed
    #[error("invalid article {path}: {reason}")]
    InvalidArticle { path: PathBuf, reason: String },
}

/// Crate-level error.
#[derive(Debug, Error)]
pub enum ChronicleError {
    /// Oracle exhausted its retry budget
    #[error("oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Document extraction failed
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Search collaborator failed
    #[error("search error: {0}")]
    Search(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Cache collaborator failed
    #[error("cache error: {0}")]
    Cache(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Configuration is missing or invalid
    #[error("config error: {0}")]
    Config(String),

    /// Filesystem failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ChronicleError {
    /// Wrap any error as a search failure.
    pub fn search(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Search(Box::new(err))
    }

    /// Wrap any error as a cache failure.
    pub fn cache(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Cache(Box::new(err))
    }
}

/// Result type alias for oracle operations.
pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Result type alias for per-document extraction.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Result type alias for chronicle operations.
pub type Result<T> = std::result::Result<T, ChronicleError>;
