//! Raw per-document events and merged timeline events.

use chrono::NaiveDate;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One event as extracted from a single document, before deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// What happened, in one sentence.
    pub description: String,

    /// Temporal phrase as it appeared in the text, or "not specified".
    pub date_text: String,

    /// Absolute date resolved from `date_text`, when resolvable.
    pub resolved_date: Option<NaiveDate>,

    /// People, organizations and places involved.
    #[serde(default)]
    pub entities: IndexSet<String>,

    /// Extraction confidence in [0, 1].
    pub confidence: f32,

    /// Document the event was extracted from.
    pub source_document_id: String,

    /// Short excerpt supporting the event.
    #[serde(default)]
    pub source_snippet: String,
}

impl RawEvent {
    /// Create an undated event with no entities.
    pub fn new(
        description: impl Into<String>,
        confidence: f32,
        source_document_id: impl Into<String>,
    ) -> Self {
        Self {
            description: description.into(),
            date_text: "not specified".to_string(),
            resolved_date: None,
            entities: IndexSet::new(),
            confidence,
            source_document_id: source_document_id.into(),
            source_snippet: String::new(),
        }
    }

    /// Set the resolved date and its phrase.
    pub fn with_date(mut self, date_text: impl Into<String>, date: Option<NaiveDate>) -> Self {
        self.date_text = date_text.into();
        self.resolved_date = date;
        self
    }

    /// Add entities.
    pub fn with_entities(mut self, entities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.entities.extend(entities.into_iter().map(Into::into));
        self
    }

    /// Set the supporting snippet.
    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.source_snippet = snippet.into();
        self
    }
}

/// Coarse category of a timeline event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Announcement,
    Transaction,
    Decision,
    Regulatory,
    MarketAction,
    #[default]
    General,
}

const KEYWORD_TYPES: &[(EventType, &[&str])] = &[
    (
        EventType::Announcement,
        &["announced", "announces", "unveiled", "revealed"],
    ),
    (
        EventType::Transaction,
        &["acquired", "merger", "deal", "purchased", "bought"],
    ),
    (
        EventType::Decision,
        &["decided", "approved", "voted", "ruled"],
    ),
    (
        EventType::Regulatory,
        &["regulation", "policy", "law", "rule"],
    ),
    (
        EventType::MarketAction,
        &["market", "trading", "price", "exchange"],
    ),
];

impl EventType {
    /// Classify a description by keyword; the first matching category wins.
    pub fn classify(description: &str) -> Self {
        let lower = description.to_lowercase();
        KEYWORD_TYPES
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(kind, _)| *kind)
            .unwrap_or_default()
    }

    /// Parse a label returned by the oracle (`"market_action"`, `"Decision"`, ...).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "announcement" => Some(Self::Announcement),
            "transaction" => Some(Self::Transaction),
            "decision" => Some(Self::Decision),
            "regulatory" => Some(Self::Regulatory),
            "market_action" => Some(Self::MarketAction),
            "general" => Some(Self::General),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Announcement => "announcement",
            Self::Transaction => "transaction",
            Self::Decision => "decision",
            Self::Regulatory => "regulatory",
            Self::MarketAction => "market_action",
            Self::General => "general",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deduplicated event placed on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    /// Stable id derived from the description (see [`event_id`]).
    pub id: String,

    pub description: String,

    /// Confirmed date, taken from a member event.
    pub date: Option<NaiveDate>,

    pub date_text: String,

    /// Best-effort date, only set when `date` is absent.
    pub estimated_date: Option<NaiveDate>,

    /// Union of all member events' entities.
    pub entities: IndexSet<String>,

    /// Union of all member events' source documents. Never empty.
    pub sources: IndexSet<String>,

    /// Aggregated confidence, never above the members' mean.
    pub confidence: f32,

    /// Ids of events this one caused or contributed to.
    #[serde(default)]
    pub causal_successors: IndexSet<String>,

    pub event_type: EventType,

    /// Topic relevance in [0, 1]; zero until scored.
    #[serde(default)]
    pub importance_score: f32,
}

impl TimelineEvent {
    /// Copy a single raw event onto the timeline.
    pub fn from_raw(raw: &RawEvent) -> Self {
        Self {
            id: event_id(&raw.description),
            description: raw.description.clone(),
            date: raw.resolved_date,
            date_text: raw.date_text.clone(),
            estimated_date: None,
            entities: raw.entities.clone(),
            sources: IndexSet::from([raw.source_document_id.clone()]),
            confidence: raw.confidence,
            causal_successors: IndexSet::new(),
            event_type: EventType::classify(&raw.description),
            importance_score: 0.0,
        }
    }

    /// Confirmed date if present, otherwise the estimate.
    pub fn effective_date(&self) -> Option<NaiveDate> {
        self.date.or(self.estimated_date)
    }
}

/// Stable event id: `evt_` plus the first 16 hex chars of the description's SHA-256.
pub fn event_id(description: &str) -> String {
    let digest = format!("{:x}", Sha256::digest(description.as_bytes()));
    format!("evt_{}", &digest[..16])
}
