//! End-to-end pipeline tests over an in-memory article index.

use std::sync::Arc;

use chrono::NaiveDate;
use chronicle::{
    load_articles, testing::MockOracle, Chronicle, ChronicleConfig, MemoryStore, QueryType,
};

const CHESAPEAKE: &str = "Title: Chesapeake to buy Southwestern\n\
Subtitle: All-stock deal creates the largest US gas producer\n\
Authors: Jane Doe\n\
Published: 2024-01-11T07:00:00Z\n\
\n\
Chesapeake Energy agreed on January 10, 2024 to acquire Southwestern Energy in an all-stock merger.\n";

const SOUTHWESTERN: &str = "Title: Southwestern holders back merger\n\
Subtitle:\n\
Authors:\n\
Published: 2024-06-19T12:00:00Z\n\
\n\
Southwestern Energy shareholders approved the Chesapeake merger at a special meeting.\n";

fn write_articles(dir: &std::path::Path) {
    std::fs::write(dir.join("01-chesapeake.txt"), CHESAPEAKE).unwrap();
    std::fs::write(dir.join("02-southwestern.txt"), SOUTHWESTERN).unwrap();
    std::fs::write(dir.join("notes.md"), "not an article").unwrap();
}

fn scripted_oracle() -> MockOracle {
    MockOracle::new()
        .with_response("Classify this news search query", "FACTUAL")
        .with_response("Extract the named entities (people", r#"["Chesapeake"]"#)
        .with_response("Extract explicit dates", r#"{"start_date": null, "end_date": null}"#)
        .with_response(
            "alternative search queries",
            "1. Chesapeake Southwestern merger news\n2. Southwestern Energy acquisition vote",
        )
        .with_response(
            "Extract key events",
            r#"```json
[
  {
    "description": "Chesapeake agreed to acquire Southwestern Energy",
    "date_text": "January 10, 2024",
    "entities": ["Chesapeake", "Southwestern Energy"],
    "confidence": 0.9,
    "source_text": "agreed on January 10, 2024 to acquire",
  },
  {"description": "Minor rumor", "confidence": 0.2}
]
```"#,
        )
        .with_response("Convert this temporal reference", "<think>anchor is 2024</think>2024-01-10")
        .with_response(
            "Extract the important named entities",
            r#"[{"name": "Chesapeake", "type": "ORGANIZATION", "confidence": 0.95}]"#,
        )
        .with_response("Group these", "[[0, 1]]")
        .with_response(
            "Merge these",
            r#"{"merged_description": "Chesapeake agreed to acquire Southwestern Energy", "event_type": "transaction", "confidence": 0.95}"#,
        )
        .with_response("Identify causal relationships", "[]")
        .with_response("Score the importance", r#"[{"event_id": 0, "importance_score": 0.9}]"#)
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
}

#[tokio::test]
async fn test_question_to_timeline() {
    let dir = tempfile::tempdir().unwrap();
    write_articles(dir.path());
    let articles = load_articles(dir.path()).unwrap();
    assert_eq!(articles.len(), 2);

    let store = Arc::new(MemoryStore::with_articles(articles));
    let mock = scripted_oracle();
    let chronicle =
        Chronicle::new(mock.clone(), store.clone(), Some(store.clone()), ChronicleConfig::default())
            .unwrap();

    let output = chronicle
        .run("How did the Chesapeake Southwestern merger unfold?", today())
        .await;

    assert_eq!(output.analysis.query_type, QueryType::Factual);
    assert_eq!(output.analysis.entities, vec!["Chesapeake"]);
    assert_eq!(output.hits.len(), 2);
    assert_eq!(output.extractions.len(), 2);
    assert!(output.extractions.iter().all(|r| r.events.len() == 1));
    assert_eq!(
        output.extractions[0].events[0].resolved_date,
        NaiveDate::from_ymd_opt(2024, 1, 10)
    );

    let timeline = &output.timeline;
    assert_eq!(timeline.topic, "How did the Chesapeake Southwestern merger unfold?");
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.events[0].sources.len(), 2);
    assert_eq!(timeline.events[0].date, NaiveDate::from_ymd_opt(2024, 1, 10));
    assert!((timeline.events[0].confidence - 0.9).abs() < 1e-6);
    assert_eq!(store.extraction_count(), 2);
}

#[tokio::test]
async fn test_second_run_uses_cached_extractions() {
    let dir = tempfile::tempdir().unwrap();
    write_articles(dir.path());
    let store = Arc::new(MemoryStore::with_articles(load_articles(dir.path()).unwrap()));
    let mock = scripted_oracle();
    let chronicle =
        Chronicle::new(mock.clone(), store.clone(), Some(store), ChronicleConfig::default())
            .unwrap();

    let first = chronicle.run("Chesapeake merger", today()).await;
    let extraction_calls = mock.calls_matching("Extract key events");
    let second = chronicle.run("Chesapeake merger", today()).await;

    assert_eq!(extraction_calls, 2);
    assert_eq!(mock.calls_matching("Extract key events"), extraction_calls);
    assert_eq!(first.extractions, second.extractions);
    assert_eq!(first.timeline.len(), second.timeline.len());
}

#[tokio::test]
async fn test_no_documents_gives_empty_timeline() {
    let store = Arc::new(MemoryStore::new());
    let mock = scripted_oracle();
    let chronicle =
        Chronicle::new(mock.clone(), store.clone(), Some(store), ChronicleConfig::default())
            .unwrap();

    let output = chronicle.run("volcanic eruptions in Iceland", today()).await;

    assert!(output.hits.is_empty());
    assert!(output.timeline.is_empty());
    assert_eq!(output.timeline.confidence, 0.0);
    assert_eq!(mock.calls_matching("Extract key events"), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let config = ChronicleConfig::default().with_min_confidence(1.5);
    assert!(Chronicle::new(MockOracle::new(), store.clone(), Some(store), config).is_err());
}
