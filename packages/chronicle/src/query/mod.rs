//! Question analysis and document retrieval.
//!
//! [`QueryAnalyzer`] classifies a question and pulls out its entities
//! and time window. It also expands the question into several search
//! queries, which [`retrieve::gather_documents`] runs against a
//! [`DocumentSearch`](crate::traits::search::DocumentSearch) index.

pub mod retrieve;

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Days, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::contract::{fields, StructuredClient};
use crate::prompts::{
    format_classify_query_prompt, format_expand_query_prompt, format_query_dates_prompt,
    format_query_entities_prompt,
};
use crate::traits::oracle::TextOracle;
use crate::types::config::{ChronicleConfig, QueryConfig};

pub use retrieve::gather_documents;

/// Temperature for classification, entities and dates.
const ANALYSIS_TEMPERATURE: f32 = 0.1;

/// Temperature for query expansion.
const EXPANSION_TEMPERATURE: f32 = 0.5;

/// Expansions below this count are topped up with templates.
const MIN_EXPANDED_QUERIES: usize = 3;

/// What kind of answer a question is after.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    Factual,
    #[default]
    Conceptual,
    Temporal,
    Entity,
    Comparative,
}

impl QueryType {
    pub const ALL: [QueryType; 5] = [
        Self::Factual,
        Self::Conceptual,
        Self::Temporal,
        Self::Entity,
        Self::Comparative,
    ];

    /// Upper-case label used in the classification prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Factual => "FACTUAL",
            Self::Conceptual => "CONCEPTUAL",
            Self::Temporal => "TEMPORAL",
            Self::Entity => "ENTITY",
            Self::Comparative => "COMPARATIVE",
        }
    }
}

/// Time window implied by a question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporalConstraint {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Relative phrases found in the question ("last week", "3 days ago").
    #[serde(default)]
    pub relative_terms: Vec<String>,
}

impl TemporalConstraint {
    pub fn is_bounded(&self) -> bool {
        self.start_date.is_some() || self.end_date.is_some()
    }
}

/// Everything learned about a question before retrieval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnalysis {
    pub original_query: String,
    pub query_type: QueryType,
    /// Search queries, the original question first.
    pub expanded_queries: Vec<String>,
    pub entities: Vec<String>,
    pub temporal_constraints: TemporalConstraint,
}

// =============================================================================
// Relative date patterns
// =============================================================================

/// Day offset from "today" implied by a relative phrase.
#[derive(Debug, Clone, Copy)]
enum Offset {
    Fixed(i64),
    /// "N days ago", N taken from the first capture.
    DaysAgo,
}

static RELATIVE_DATE_PATTERNS: LazyLock<Vec<(Regex, Offset)>> = LazyLock::new(|| {
    [
        (r"\b(today|now)\b", Offset::Fixed(0)),
        (r"\byesterday\b", Offset::Fixed(-1)),
        (r"\btomorrow\b", Offset::Fixed(1)),
        (r"\b(\d+)\s+days?\s+ago\b", Offset::DaysAgo),
        (r"\blast\s+week\b", Offset::Fixed(-7)),
        (r"\blast\s+month\b", Offset::Fixed(-30)),
        (r"\blast\s+year\b", Offset::Fixed(-365)),
        (r"\bthis\s+week\b", Offset::Fixed(0)),
        (r"\bthis\s+month\b", Offset::Fixed(0)),
        (r"\bthis\s+year\b", Offset::Fixed(0)),
    ]
    .into_iter()
    .map(|(pattern, offset)| (Regex::new(pattern).expect("valid regex"), offset))
    .collect()
});

static STRICT_ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid regex"));

static LIST_NUMBERING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+[.)]\s*").expect("valid regex"));

static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[*\-•🔹🔸]\s*").expect("valid regex"));

/// Lines containing any of these are model chatter, not queries.
const CHATTER: &[&str] = &["okay", "the user", "let me", "first", "alternative"];

/// Analyzes questions with the oracle.
pub struct QueryAnalyzer<O> {
    client: StructuredClient<O>,
    config: QueryConfig,
}

impl<O: TextOracle> QueryAnalyzer<O> {
    pub fn new(oracle: O, config: &ChronicleConfig) -> Self {
        Self {
            client: StructuredClient::new(oracle, &config.oracle),
            config: config.query.clone(),
        }
    }

    pub fn with_client(client: StructuredClient<O>, config: QueryConfig) -> Self {
        Self { client, config }
    }

    /// Analyze `question` as asked on `today`. Never fails.
    pub async fn analyze(&self, question: &str, today: NaiveDate) -> QueryAnalysis {
        let query_type = self.classify(question).await;
        let entities = self.extract_entities(question).await;
        let temporal_constraints = self.temporal_constraints(question, today).await;
        let expanded_queries = self.expand(question, query_type, &entities).await;

        info!(
            query_type = ?query_type,
            entities = entities.len(),
            expanded = expanded_queries.len(),
            bounded = temporal_constraints.is_bounded(),
            "Analyzed query"
        );

        QueryAnalysis {
            original_query: question.to_string(),
            query_type,
            expanded_queries,
            entities,
            temporal_constraints,
        }
    }

    /// Classify the question, defaulting to [`QueryType::Conceptual`].
    pub async fn classify(&self, question: &str) -> QueryType {
        let prompt = format_classify_query_prompt(question);
        match self
            .client
            .text(&prompt, &self.client.params_at(ANALYSIS_TEMPERATURE))
            .await
        {
            Ok(answer) => parse_query_type(&answer).unwrap_or_else(|| {
                warn!(answer = %answer.chars().take(100).collect::<String>(), "Unknown query category");
                QueryType::default()
            }),
            Err(e) => {
                warn!(error = %e, "Query classification failed");
                QueryType::default()
            }
        }
    }

    /// Named entities mentioned in the question.
    pub async fn extract_entities(&self, question: &str) -> Vec<String> {
        let prompt = format_query_entities_prompt(question);
        match self
            .client
            .json_array(&prompt, &self.client.params_at(ANALYSIS_TEMPERATURE))
            .await
        {
            Ok(items) => items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect(),
            Err(e) => {
                warn!(error = %e, "Query entity extraction failed");
                Vec::new()
            }
        }
    }

    /// Time window from relative phrases, or explicit dates from the oracle
    /// when no phrase sets one.
    pub async fn temporal_constraints(&self, question: &str, today: NaiveDate) -> TemporalConstraint {
        let mut constraint = relative_constraint(question, today);
        if constraint.is_bounded() {
            return constraint;
        }

        let prompt = format_query_dates_prompt(question, today);
        match self
            .client
            .json_object(&prompt, &self.client.params_at(ANALYSIS_TEMPERATURE))
            .await
        {
            Ok(object) => {
                constraint.start_date = strict_date(fields::opt_string(&object, "start_date"));
                constraint.end_date = strict_date(fields::opt_string(&object, "end_date"));
            }
            Err(e) => warn!(error = %e, "Explicit date extraction failed"),
        }
        constraint
    }

    /// Search queries for the question, the question itself first.
    pub async fn expand(
        &self,
        question: &str,
        query_type: QueryType,
        entities: &[String],
    ) -> Vec<String> {
        let mut expanded = vec![question.to_string()];
        let prompt = format_expand_query_prompt(question, query_type, entities);

        match self
            .client
            .text(&prompt, &self.client.params_at(EXPANSION_TEMPERATURE))
            .await
        {
            Ok(answer) => {
                for line in parse_expansion_lines(&answer) {
                    if expanded.len() >= self.config.max_expanded_queries {
                        break;
                    }
                    let lower = line.to_lowercase();
                    if !expanded.iter().any(|q| q.to_lowercase() == lower) {
                        expanded.push(line);
                    }
                }
            }
            Err(e) => warn!(error = %e, "Query expansion failed, using templates"),
        }

        if expanded.len() < MIN_EXPANDED_QUERIES {
            expanded.extend(template_queries(question, query_type, entities));
        }

        let limited = unique_queries(expanded, self.config.max_expanded_queries.max(1));
        debug!(queries = ?limited, "Expanded query");
        limited
    }
}

/// Read a category from the classifier's answer.
///
/// A line holding a category as a whole word wins, scanning from the last
/// line. Otherwise any mention anywhere counts.
pub fn parse_query_type(answer: &str) -> Option<QueryType> {
    for line in answer.lines().rev() {
        let upper = line.trim().to_uppercase();
        let words: Vec<&str> = upper
            .split(|c: char| !c.is_ascii_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();
        if let Some(kind) = QueryType::ALL
            .into_iter()
            .find(|kind| words.contains(&kind.label()))
        {
            return Some(kind);
        }
    }

    let upper = answer.to_uppercase();
    QueryType::ALL
        .into_iter()
        .find(|kind| upper.contains(kind.label()))
}

/// Window implied by relative phrases in `question`, anchored at `today`.
///
/// Later patterns override earlier ones. Phrases meaning "now" are recorded
/// without setting a window.
pub fn relative_constraint(question: &str, today: NaiveDate) -> TemporalConstraint {
    let lower = question.to_lowercase();
    let mut constraint = TemporalConstraint::default();

    for (pattern, offset) in RELATIVE_DATE_PATTERNS.iter() {
        let Some(caps) = pattern.captures(&lower) else {
            continue;
        };
        constraint.relative_terms.push(caps[0].to_string());

        let offset = match offset {
            Offset::Fixed(days) => *days,
            Offset::DaysAgo => match caps.get(1).and_then(|m| m.as_str().parse::<i64>().ok()) {
                Some(n) => -n,
                None => continue,
            },
        };
        let days = Days::new(offset.unsigned_abs());
        if offset < 0 {
            if let Some(target) = today.checked_sub_days(days) {
                constraint.start_date = Some(target);
                constraint.end_date = Some(today);
            }
        } else if offset > 0 {
            if let Some(target) = today.checked_add_days(days) {
                constraint.start_date = Some(today);
                constraint.end_date = Some(target);
            }
        }
    }

    constraint
}

fn strict_date(value: Option<String>) -> Option<NaiveDate> {
    let value = value?;
    if !STRICT_ISO_DATE.is_match(&value) {
        return None;
    }
    NaiveDate::parse_from_str(&value, "%Y-%m-%d").ok()
}

/// Clean a numbered list answer into candidate queries.
pub fn parse_expansion_lines(answer: &str) -> Vec<String> {
    answer
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.chars().count() < 5 {
                return None;
            }
            let line = LIST_NUMBERING.replace(line, "");
            let line = line.trim_matches(|c: char| c == '"' || c == '\'');

            let lower = line.to_lowercase();
            if CHATTER.iter().any(|word| lower.contains(word)) {
                return None;
            }

            let line = BULLET.replace(line, "").trim().to_string();
            let len = line.chars().count();
            (10..=150).contains(&len).then_some(line)
        })
        .collect()
}

/// Fallback queries for a question type.
pub fn template_queries(question: &str, query_type: QueryType, entities: &[String]) -> Vec<String> {
    match query_type {
        QueryType::Factual => vec![
            format!("latest news {question}"),
            format!("{question} recent developments"),
        ],
        QueryType::Conceptual => vec![
            format!("{question} trends analysis"),
            format!("{question} industry impact"),
        ],
        QueryType::Temporal => vec![format!("{question} timeline"), format!("chronology {question}")],
        QueryType::Entity => entities
            .iter()
            .take(2)
            .map(|entity| {
                let rest = question.replace(entity.as_str(), " ");
                let rest = rest.split_whitespace().collect::<Vec<_>>().join(" ");
                format!("{entity} news {rest}").trim().to_string()
            })
            .collect(),
        QueryType::Comparative => vec![
            format!("{question} comparison analysis"),
            format!("{question} differences similarities"),
        ],
    }
}

/// Case-insensitively unique queries, first occurrence kept, at most `limit`.
fn unique_queries(queries: Vec<String>, limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    queries
        .into_iter()
        .filter(|q| seen.insert(q.trim().to_lowercase()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockOracle;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn analyzer(mock: &MockOracle) -> QueryAnalyzer<MockOracle> {
        QueryAnalyzer::new(mock.clone(), &ChronicleConfig::default())
    }

    #[test]
    fn test_parse_query_type() {
        assert_eq!(parse_query_type("TEMPORAL"), Some(QueryType::Temporal));
        assert_eq!(
            parse_query_type("Let me think about FACTUAL vs others.\nAnswer: ENTITY"),
            Some(QueryType::Entity)
        );
        assert_eq!(parse_query_type("comparative."), Some(QueryType::Comparative));
        assert_eq!(parse_query_type("This is an ENTITY question"), Some(QueryType::Entity));
        assert_eq!(parse_query_type("It is about ENTITIES"), None);
        assert_eq!(parse_query_type("no idea"), None);
    }

    #[test]
    fn test_relative_constraint_windows() {
        let c = relative_constraint("What happened last week?", today());
        assert_eq!(c.start_date, NaiveDate::from_ymd_opt(2024, 6, 8));
        assert_eq!(c.end_date, Some(today()));
        assert_eq!(c.relative_terms, vec!["last week"]);

        let c = relative_constraint("Earnings reported 3 days ago", today());
        assert_eq!(c.start_date, NaiveDate::from_ymd_opt(2024, 6, 12));

        let c = relative_constraint("What is due tomorrow", today());
        assert_eq!(c.start_date, Some(today()));
        assert_eq!(c.end_date, NaiveDate::from_ymd_opt(2024, 6, 16));

        let c = relative_constraint("What happened this year", today());
        assert!(!c.is_bounded());
        assert_eq!(c.relative_terms, vec!["this year"]);
    }

    #[test]
    fn test_parse_expansion_lines() {
        let answer = "Okay, here are the queries:\n\
                      1. \"Chesapeake Southwestern merger\"\n\
                      2) natural gas producer consolidation\n\
                      - Expand Energy formation 2024\n\
                      3. short\n\
                      4. First, an alternative phrasing";
        assert_eq!(
            parse_expansion_lines(answer),
            vec![
                "Chesapeake Southwestern merger",
                "natural gas producer consolidation",
                "Expand Energy formation 2024",
            ]
        );
    }

    #[test]
    fn test_entity_templates_strip_entity() {
        let queries = template_queries(
            "Chesapeake deal with Southwestern",
            QueryType::Entity,
            &["Chesapeake".to_string()],
        );
        assert_eq!(queries, vec!["Chesapeake news deal with Southwestern"]);
    }

    #[tokio::test]
    async fn test_analyze_with_oracle() {
        let mock = MockOracle::new()
            .with_response("Classify this news search query", "TEMPORAL")
            .with_response("Extract the named entities (people", r#"["Chesapeake", "", 5]"#)
            .with_response(
                "Extract explicit dates",
                r#"{"start_date": "2024-01-01", "end_date": "January 2024"}"#,
            )
            .with_response(
                "alternative search queries",
                "1. Chesapeake Southwestern merger timeline\n2. Expand Energy merger history",
            );

        let analysis = analyzer(&mock)
            .analyze("How did the Chesapeake merger unfold?", today())
            .await;

        assert_eq!(analysis.query_type, QueryType::Temporal);
        assert_eq!(analysis.entities, vec!["Chesapeake", "5"]);
        assert_eq!(
            analysis.temporal_constraints.start_date,
            NaiveDate::from_ymd_opt(2024, 1, 1)
        );
        assert_eq!(analysis.temporal_constraints.end_date, None);
        assert_eq!(
            analysis.expanded_queries,
            vec![
                "How did the Chesapeake merger unfold?",
                "Chesapeake Southwestern merger timeline",
                "Expand Energy merger history",
            ]
        );
    }

    #[tokio::test]
    async fn test_analyze_degrades_when_oracle_is_down() {
        let mock = MockOracle::new();
        let analysis = analyzer(&mock).analyze("gas mergers", today()).await;

        assert_eq!(analysis.query_type, QueryType::Conceptual);
        assert!(analysis.entities.is_empty());
        assert!(!analysis.temporal_constraints.is_bounded());
        assert_eq!(
            analysis.expanded_queries,
            vec!["gas mergers", "gas mergers trends analysis", "gas mergers industry impact"]
        );
    }

    #[tokio::test]
    async fn test_relative_phrase_skips_date_request() {
        let mock = MockOracle::new().with_default("[]");
        analyzer(&mock)
            .temporal_constraints("news from yesterday", today())
            .await;
        assert_eq!(mock.calls_matching("Extract explicit dates"), 0);
    }

    #[tokio::test]
    async fn test_expansion_is_capped_and_unique() {
        let mock = MockOracle::new().with_response(
            "alternative search queries",
            "1. gas mergers\n2. GAS MERGERS\n3. natural gas deals 2024\n4. shale consolidation wave\n5. pipeline acquisitions news\n6. one more query here",
        );
        let queries = analyzer(&mock)
            .expand("gas mergers", QueryType::Factual, &[])
            .await;
        assert_eq!(queries.len(), 5);
        assert_eq!(queries[0], "gas mergers");
        assert!(!queries.iter().skip(1).any(|q| q.eq_ignore_ascii_case("gas mergers")));
    }
}
