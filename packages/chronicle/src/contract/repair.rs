//! Best-effort recovery of JSON from model output.
//!
//! Models wrap JSON in prose, code fences and reasoning blocks, leave
//! trailing commas and over-escape quotes. Everything here is heuristic and
//! must never panic: the worst outcome is `None`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static THINK_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid regex"));
static THINK_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</think>").expect("valid regex"));
static TRAILING_COMMA_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\}").expect("valid regex"));
static TRAILING_COMMA_ARRAY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*\]").expect("valid regex"));
// One level of nesting is enough for the flat records prompts ask for.
static FLAT_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("valid regex")
});

/// Which top-level JSON value a caller expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Array,
    Object,
}

impl JsonShape {
    fn delimiters(self) -> (char, char) {
        match self {
            Self::Array => ('[', ']'),
            Self::Object => ('{', '}'),
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// Remove `<think>...</think>` blocks, plus anything before an unpaired `</think>`.
pub fn strip_thinking(text: &str) -> String {
    let stripped = THINK_BLOCK.replace_all(text, "");
    match THINK_CLOSE.find_iter(&stripped).last() {
        Some(close) => stripped[close.end()..].to_string(),
        None => stripped.into_owned(),
    }
}

/// Fix the malformations models commonly produce.
///
/// Drops trailing commas before `}`/`]`, turns literal `\n` sequences into
/// spaces and unescapes stray `\"`. Only applied after a plain parse fails,
/// since unescaping can break JSON that was already valid.
pub fn clean_json(text: &str) -> String {
    let text = TRAILING_COMMA_OBJECT.replace_all(text, "}");
    let text = TRAILING_COMMA_ARRAY.replace_all(&text, "]");
    text.replace("\\n", " ").replace("\\\"", "\"")
}

/// Recover a value of the requested shape from `text`.
///
/// Tries, in order: the whole string, the first balanced span, the widest
/// span (first opener to last closer), each with and without [`clean_json`].
/// For arrays, falls back to parsing the individual objects inside the
/// widest span. Returns `None` when nothing usable was found.
pub fn repair_and_parse(text: &str, shape: JsonShape) -> Option<Value> {
    let trimmed = text.trim();
    if let Some(value) = parse_as(trimmed, shape) {
        return Some(value);
    }

    let (open, close) = shape.delimiters();
    let balanced = balanced_span(trimmed, open, close);
    let widest = widest_span(trimmed, open, close);

    let mut candidates: Vec<&str> = Vec::with_capacity(3);
    candidates.extend(balanced);
    candidates.extend(widest);
    if shape == JsonShape::Object {
        candidates.extend(FLAT_OBJECT.find(trimmed).map(|m| m.as_str()));
    }

    for candidate in &candidates {
        if let Some(value) = parse_as(candidate, shape) {
            return Some(value);
        }
        if let Some(value) = parse_as(&clean_json(candidate), shape) {
            return Some(value);
        }
    }

    if shape == JsonShape::Array {
        let span = widest.or(balanced)?;
        let objects = salvage_objects(span);
        if !objects.is_empty() {
            return Some(Value::Array(objects));
        }
    }

    None
}

fn parse_as(text: &str, shape: JsonShape) -> Option<Value> {
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(|value| shape.matches(value))
}

/// Parse every flat `{...}` inside `span` on its own, keeping those that parse.
fn salvage_objects(span: &str) -> Vec<Value> {
    FLAT_OBJECT
        .find_iter(span)
        .filter_map(|m| {
            parse_as(m.as_str(), JsonShape::Object)
                .or_else(|| parse_as(&clean_json(m.as_str()), JsonShape::Object))
        })
        .collect()
}

/// First `open` through its matching `close`, ignoring delimiters inside strings.
fn balanced_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

/// First `open` through the last `close`.
fn widest_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..end + close.len_utf8()])
}
