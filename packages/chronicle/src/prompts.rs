//! Oracle prompts for extraction, synthesis and query analysis.
//!
//! Placeholders in `{braces}` are filled by the `format_*` helpers below.

use chrono::NaiveDate;

use crate::query::QueryType;
use crate::types::event::{RawEvent, TimelineEvent};

/// Prompt for extracting events from one article.
pub const EXTRACT_EVENTS_PROMPT: &str = r#"Extract key events from this news article. For each event, identify:
1. A clear description of what happened
2. When it happened, quoting ANY temporal reference from the article text
3. Who or what was involved (entities)
4. Your confidence that this is a significant event (0-1)
{topic_section}
Article text:
{text}

DATE EXTRACTION:
- Specific dates: "January 11, 2024", "March 2023", "2020"
- Relative dates: "last year", "this quarter", "next month", "yesterday"
- Periods: "second quarter", "Q4", "end of 2022"
- Contextual dates: "when the pandemic began", "since the war started"
- Copy the temporal reference exactly as written
- Use "not specified" only when the article has no temporal information for that event

Return a JSON array of events:
[
  {
    "description": "Clear description of the event",
    "date_text": "Exact temporal reference from the article or 'not specified'",
    "entities": ["entity1", "entity2"],
    "confidence": 0.9,
    "source_text": "Relevant snippet from the article"
  }
]

Focus on major events, announcements, decisions, transactions and significant developments."#;

/// Prompt for resolving a date phrase to an ISO date.
pub const RESOLVE_DATE_PROMPT: &str = r#"Convert this temporal reference to an absolute date in ISO format (YYYY-MM-DD).

Temporal reference: "{date_text}"
Reference date (article publication): {reference_date}

Article excerpt for context:
{excerpt}

Instructions:
- Convert relative dates like "last year", "second quarter", "end of 2022" to absolute dates
- For quarters, use the last day of the quarter
- For a bare year (like "2020"), use January 1st of that year
- For contextual references like "when the pandemic began", use the known historical date
- Calculate "last year", "this year" and similar relative to the reference date
- If the date cannot reasonably be determined, answer UNABLE_TO_RESOLVE

Examples:
- "2020" -> 2020-01-01
- "second quarter" -> 2024-06-30 (if the reference date is in 2024)
- "end of last year" -> 2023-12-31 (if the reference date is in 2024)
- "when the pandemic began" -> 2020-03-01
- "since the war in Ukraine began" -> 2022-02-24

Answer with only the ISO date (YYYY-MM-DD) or UNABLE_TO_RESOLVE:"#;

/// Prompt for extracting named entities from one article.
pub const EXTRACT_ENTITIES_PROMPT: &str = r#"Extract the important named entities from this news article:
- PERSON: individual people (executives, officials, analysts)
- ORGANIZATION: companies, institutions, agencies
- LOCATION: countries, cities, regions, facilities
- OTHER: products, technologies, financial instruments

Article text:
{text}

Return a JSON array:
[
  {
    "name": "Entity name (canonical form)",
    "type": "PERSON|ORGANIZATION|LOCATION|OTHER",
    "mentions": ["mention1", "mention2"],
    "confidence": 0.9
  }
]

Only include entities central to the article."#;

/// Prompt for grouping events that describe the same occurrence.
pub const GROUP_EVENTS_PROMPT: &str = r#"Group these {count} news events by similarity. Events belong in the same group if they:
1. Describe the same underlying occurrence or announcement
2. Involve the same key entities and actions
3. Refer to the same deal, policy decision or development

Events:
{events}

Return a JSON array of groups, each group listing the indices of events to merge:
[[0, 3, 7], [1], [2, 5], [4, 6, 8]]

Only group events that are clearly about the same occurrence. When in doubt, keep them separate."#;

/// Prompt for merging one group of duplicate events.
pub const MERGE_EVENTS_PROMPT: &str = r#"Merge these {count} reports of the same news event into one event.
Write a single description that keeps the key information from every source.

Reports to merge:
{events}

Return JSON:
{
  "merged_description": "Comprehensive description combining all sources",
  "primary_date_text": "Best date reference from the sources",
  "all_entities": ["entity1", "entity2"],
  "event_type": "announcement|transaction|decision|regulatory|market_action|general",
  "confidence": 0.85
}

The merged description should be clear and free of redundancy."#;

/// Prompt for estimating the date of an undated event.
pub const ESTIMATE_DATE_PROMPT: &str = r#"Given these dated events as context, estimate the most likely date of the undated event.

Context (dated events):
{context}

Undated event: {description}
Date reference: {date_text}

Use the context and any temporal clues in the undated event.

Return JSON:
{
  "estimated_date": "YYYY-MM-DD, or null if no reasonable estimate is possible",
  "confidence": 0.7,
  "reasoning": "Brief explanation"
}"#;

/// Prompt for finding cause and effect between ordered events.
pub const CAUSAL_LINKS_PROMPT: &str = r#"Identify causal relationships between these chronologically ordered events.
Look for events that directly caused or led to later events.

Events:
{events}

Return a JSON array of relationships:
[
  {
    "cause_event_id": 0,
    "effect_event_id": 3,
    "relationship_type": "direct_cause|contributing_factor|reaction",
    "confidence": 0.8
  }
]

Only include clear, high-confidence causal connections."#;

/// Prompt for scoring topical importance.
pub const SCORE_IMPORTANCE_PROMPT: &str = r#"Score the importance of each event for a timeline about "{topic}".
Consider:
1. Relevance to the topic. Events unrelated to "{topic}" must score very low (0.0-0.2), not be left out
2. Impact and significance within the topic
3. Whether it is a major milestone or a minor detail

Events:
{events}

Return a JSON array with one entry per event:
[
  {"event_id": 0, "importance_score": 0.9, "relevance_note": "Directly about the topic"},
  {"event_id": 1, "importance_score": 0.1, "relevance_note": "Unrelated"}
]

Scores range from 0.0 to 1.0, where 1.0 is most important."#;

/// Prompt for classifying a question.
pub const CLASSIFY_QUERY_PROMPT: &str = r#"Classify this news search query into one category:

Query: "{query}"

Categories:
- FACTUAL: looking for specific facts or events
- CONCEPTUAL: looking for broader concepts, trends or themes
- TEMPORAL: focused on time-based events or chronology
- ENTITY: focused on specific people, companies or organizations
- COMPARATIVE: comparing different events or entities

Answer with one word: FACTUAL, CONCEPTUAL, TEMPORAL, ENTITY or COMPARATIVE"#;

/// Prompt for pulling named entities out of a question.
pub const QUERY_ENTITIES_PROMPT: &str = r#"Extract the named entities (people, companies, organizations, locations) from this query.

Return ONLY a JSON array of strings.

Examples:
Query: "Apple CEO Tim Cook visited California"
["Apple", "Tim Cook", "California"]

Query: "What happened yesterday?"
[]

Query: "{query}"
JSON array:"#;

/// Prompt for explicit dates in a question.
pub const QUERY_DATES_PROMPT: &str = r#"Extract explicit dates from this query.

Query: "{query}"
Current date: {today}

Look for specific dates (January 1, 2024), months or years (March 2023) and ranges (between X and Y).

Return ONLY a JSON object with dates in YYYY-MM-DD format:
{"start_date": "YYYY-MM-DD", "end_date": "YYYY-MM-DD", "date_mentions": ["date1"]}

If there are no dates, return:
{"start_date": null, "end_date": null, "date_mentions": []}"#;

/// Prompt for alternative search queries.
pub const EXPAND_QUERY_PROMPT: &str = r#"Generate exactly 4 concise alternative search queries for: "{query}"

Guidelines: {guidance}

Each query must be:
- Short (at most 10-15 words)
- A complete search query
- Different from the original but related
- Free of explanations and bullet points

Format the response as a numbered list:
1. [query 1]
2. [query 2]
3. [query 3]
4. [query 4]

Do not include anything else."#;

/// Format the event extraction prompt.
pub fn format_extract_events_prompt(text: &str, topic_hint: Option<&str>) -> String {
    let topic_section = match topic_hint {
        Some(topic) if !topic.trim().is_empty() => {
            format!("\nPay particular attention to events related to: {topic}\n")
        }
        _ => String::new(),
    };
    EXTRACT_EVENTS_PROMPT
        .replace("{topic_section}", &topic_section)
        .replace("{text}", text)
}

/// Format the date resolution prompt.
pub fn format_resolve_date_prompt(date_text: &str, reference: NaiveDate, excerpt: &str) -> String {
    RESOLVE_DATE_PROMPT
        .replace("{date_text}", date_text)
        .replace("{reference_date}", &reference.format("%Y-%m-%d").to_string())
        .replace("{excerpt}", excerpt)
}

/// Format the entity extraction prompt.
pub fn format_extract_entities_prompt(text: &str) -> String {
    EXTRACT_ENTITIES_PROMPT.replace("{text}", text)
}

/// Format the grouping prompt as a numbered list of descriptions and entities.
pub fn format_group_prompt(events: &[RawEvent]) -> String {
    let lines = events
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let entities: Vec<&str> = e.entities.iter().map(String::as_str).collect();
            format!("Event {i}: {} (Entities: {})", e.description, entities.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    GROUP_EVENTS_PROMPT
        .replace("{count}", &events.len().to_string())
        .replace("{events}", &lines)
}

/// Format the merge prompt for one group.
pub fn format_merge_prompt(members: &[&RawEvent]) -> String {
    let lines = members
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let mut line = format!("Source {}: {}", i + 1, e.description);
            if !crate::extractor::dates::is_unspecified(&e.date_text) {
                line.push_str(&format!(" (Date: {})", e.date_text));
            }
            if !e.entities.is_empty() {
                let entities: Vec<&str> = e.entities.iter().map(String::as_str).collect();
                line.push_str(&format!(" (Entities: {})", entities.join(", ")));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n");

    MERGE_EVENTS_PROMPT
        .replace("{count}", &members.len().to_string())
        .replace("{events}", &lines)
}

/// Format the date estimation prompt with dated context events.
pub fn format_estimate_prompt(undated: &TimelineEvent, context: &[&TimelineEvent]) -> String {
    let lines = context
        .iter()
        .filter_map(|e| {
            e.date
                .map(|d| format!("- {} ({})", e.description, d.format("%Y-%m-%d")))
        })
        .collect::<Vec<_>>()
        .join("\n");

    ESTIMATE_DATE_PROMPT
        .replace("{context}", &lines)
        .replace("{description}", &undated.description)
        .replace("{date_text}", &undated.date_text)
}

/// Format the causal link prompt over the sorted events.
pub fn format_causal_prompt(events: &[TimelineEvent]) -> String {
    let lines = events
        .iter()
        .enumerate()
        .map(|(i, e)| {
            let date = e
                .effective_date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "undated".to_string());
            format!("{i}: {} ({date})", e.description)
        })
        .collect::<Vec<_>>()
        .join("\n");

    CAUSAL_LINKS_PROMPT.replace("{events}", &lines)
}

/// Format the importance prompt for a topic.
pub fn format_importance_prompt(topic: &str, events: &[TimelineEvent]) -> String {
    let lines = events
        .iter()
        .enumerate()
        .map(|(i, e)| format!("{i}: {}", e.description))
        .collect::<Vec<_>>()
        .join("\n");

    SCORE_IMPORTANCE_PROMPT
        .replace("{topic}", topic)
        .replace("{events}", &lines)
}

/// Format the query classification prompt.
pub fn format_classify_query_prompt(query: &str) -> String {
    CLASSIFY_QUERY_PROMPT.replace("{query}", query)
}

/// Format the query entity prompt.
pub fn format_query_entities_prompt(query: &str) -> String {
    QUERY_ENTITIES_PROMPT.replace("{query}", query)
}

/// Format the query date prompt.
pub fn format_query_dates_prompt(query: &str, today: NaiveDate) -> String {
    QUERY_DATES_PROMPT
        .replace("{query}", query)
        .replace("{today}", &today.format("%Y-%m-%d").to_string())
}

/// Format the query expansion prompt with type-specific guidance.
pub fn format_expand_query_prompt(query: &str, query_type: QueryType, entities: &[String]) -> String {
    let guidance = match query_type {
        QueryType::Factual => "Focus on specific facts, events and precise terminology".to_string(),
        QueryType::Conceptual => "Include related concepts, themes and broader terms".to_string(),
        QueryType::Temporal => "Emphasize time-related aspects and chronological terms".to_string(),
        QueryType::Entity => format!("Focus on variations of entity names: {}", entities.join(", ")),
        QueryType::Comparative => "Include comparison terms and contrasting elements".to_string(),
    };

    EXPAND_QUERY_PROMPT
        .replace("{query}", query)
        .replace("{guidance}", &guidance)
}
