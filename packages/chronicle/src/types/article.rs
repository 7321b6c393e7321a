//! News articles in the plain-text header format.
//!
//! ```text
//! Title: Chesapeake and Southwestern to merge
//! Subtitle: Deal creates largest US gas producer
//! Authors: Jane Doe, John Roe
//! Published: 2024-01-11T07:00:00Z
//!
//! Body text...
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{ExtractError, ExtractResult, Result};

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\ATitle:[ \t]*(.+?)\nSubtitle:[ \t]*(.*?)\nAuthors:[ \t]*(.*?)\nPublished:[ \t]*(.+?)\n\n",
    )
    .expect("valid regex")
});

/// A parsed news article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    pub subtitle: Option<String>,
    pub authors: Vec<String>,
    pub published: DateTime<FixedOffset>,
    pub content: String,
    pub path: PathBuf,
}

impl Article {
    /// Parse article text. `path` identifies the article for ids and errors.
    pub fn parse(text: &str, path: impl Into<PathBuf>) -> ExtractResult<Self> {
        let path = path.into();
        let text = text.replace("\r\n", "\n");

        let caps = HEADER.captures(&text).ok_or_else(|| ExtractError::InvalidArticle {
            path: path.clone(),
            reason: "missing Title/Subtitle/Authors/Published header".into(),
        })?;

        let title = caps[1].trim().to_string();
        let subtitle = Some(caps[2].trim().to_string()).filter(|s| !s.is_empty());
        let authors = caps[3]
            .split(',')
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(String::from)
            .collect();

        let published_raw = caps[4].trim();
        let published = parse_timestamp(published_raw).unwrap_or_else(|| {
            warn!(
                path = %path.display(),
                published = published_raw,
                "Could not parse publish date, using current time"
            );
            Utc::now().fixed_offset()
        });

        let body_start = caps.get(0).map(|m| m.end()).unwrap_or(0);
        let content = text[body_start..].trim().to_string();

        Ok(Self {
            title,
            subtitle,
            authors,
            published,
            content,
            path,
        })
    }

    /// Title, subtitle and body separated by blank lines.
    pub fn full_text(&self) -> String {
        let mut parts = vec![self.title.as_str()];
        if let Some(subtitle) = &self.subtitle {
            parts.push(subtitle);
        }
        parts.push(&self.content);
        parts.join("\n\n")
    }

    /// Document id used by search hits and raw events.
    pub fn source_id(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }

    /// Cache key derived from the article's path.
    ///
    /// The key does not depend on content: editing an article without
    /// renaming it keeps serving the previously cached extraction.
    pub fn cache_key(&self) -> String {
        Uuid::new_v5(&Uuid::NAMESPACE_DNS, self.source_id().as_bytes()).to_string()
    }

    /// Problems worth reporting before indexing. Empty when the article looks sane.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.title.is_empty() {
            issues.push("Missing title".to_string());
        }
        if self.content.is_empty() {
            issues.push("Missing content".to_string());
        }
        if self.published > Utc::now() {
            issues.push("Published date is in the future".to_string());
        }
        if self.content.chars().count() < 100 {
            issues.push("Content seems too short".to_string());
        }
        issues
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Parse every `*.txt` file in `dir`, in file-name order.
///
/// Files that fail to read or parse are logged and skipped.
pub fn load_articles(dir: &Path) -> Result<Vec<Article>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    paths.sort();

    info!(dir = %dir.display(), files = paths.len(), "Loading articles");

    let mut articles = Vec::with_capacity(paths.len());
    for path in paths {
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read article");
                continue;
            }
        };
        match Article::parse(&text, &path) {
            Ok(article) => articles.push(article),
            Err(e) => warn!(error = %e, "Skipping article"),
        }
    }

    Ok(articles)
}
