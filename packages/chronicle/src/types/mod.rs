//! Data model shared by the extractor, synthesis engine and collaborators.

pub mod article;
pub mod config;
pub mod event;
pub mod extraction;
pub mod timeline;
