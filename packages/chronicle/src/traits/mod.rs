//! Collaborator interfaces.
//!
//! The pipeline consumes three external capabilities: a text-generation
//! oracle, a document search index and a key-value extraction cache.
//! Deterministic doubles live in [`crate::testing`].

pub mod cache;
pub mod oracle;
pub mod search;
