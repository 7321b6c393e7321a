//! Per-document extraction output, also the cached payload.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::event::RawEvent;

/// Kind of named entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityKind {
    Person,
    Organization,
    Location,
    #[default]
    Other,
}

impl EntityKind {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_uppercase().as_str() {
            "PERSON" => Self::Person,
            "ORGANIZATION" | "ORGANISATION" | "ORG" => Self::Organization,
            "LOCATION" | "PLACE" => Self::Location,
            _ => Self::Other,
        }
    }
}

/// A named entity found in one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    /// Surface forms seen in the text; at least the name itself.
    pub mentions: Vec<String>,
    pub confidence: f32,
}

/// Whether a temporal phrase names a date or is relative to publication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Absolute,
    Relative,
}

/// A date-like phrase found by pattern matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalReference {
    pub text: String,
    pub resolved: Option<NaiveDate>,
    pub kind: TemporalKind,
    pub confidence: f32,
}

/// Everything extracted from one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_id: String,
    pub cache_key: String,
    pub title: String,
    pub published: DateTime<FixedOffset>,
    #[serde(default)]
    pub events: Vec<RawEvent>,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub temporal_references: Vec<TemporalReference>,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.entities.is_empty()
    }
}
