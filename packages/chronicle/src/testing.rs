//! Testing utilities including a scripted oracle.
//!
//! Useful for exercising extraction and synthesis without a model server.

use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::{OracleError, OracleResult};
use crate::traits::oracle::{GenerationParams, TextOracle};

/// A scripted [`TextOracle`].
///
/// Replies are chosen by the first rule whose pattern occurs in the prompt,
/// in the order rules were added. Prompts matching no rule get the default
/// reply, or a transport error when no default is set.
#[derive(Clone, Default)]
pub struct MockOracle {
    /// Scripted replies keyed by prompt substring
    rules: Arc<RwLock<Vec<MockRule>>>,

    /// Reply for prompts no rule matches
    default_reply: Arc<RwLock<Option<String>>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockOracleCall>>>,
}

/// Record of a call made to the mock oracle.
#[derive(Debug, Clone)]
pub struct MockOracleCall {
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Fail(String),
}

impl From<OracleResult<String>> for MockReply {
    fn from(result: OracleResult<String>) -> Self {
        match result {
            Ok(text) => Self::Text(text),
            Err(OracleError::Transport(reason)) => Self::Fail(reason),
            Err(e) => Self::Fail(e.to_string()),
        }
    }
}

struct MockRule {
    pattern: String,
    /// The last reply repeats once the queue is down to one.
    replies: VecDeque<MockReply>,
}

impl MockOracle {
    /// Create a mock with no rules and no default.
    pub fn new() -> Self {
        Self::default()
    }

    /// Always answer `response` to prompts containing `pattern`.
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.push_rule(pattern.into(), vec![MockReply::Text(response.into())])
    }

    /// Answer successive prompts containing `pattern` from `replies`.
    pub fn with_sequence(self, pattern: impl Into<String>, replies: Vec<OracleResult<String>>) -> Self {
        let replies = replies.into_iter().map(MockReply::from).collect();
        self.push_rule(pattern.into(), replies)
    }

    /// Fail every prompt containing `pattern` with a transport error.
    pub fn with_failure(self, pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        self.push_rule(pattern.into(), vec![MockReply::Fail(reason.into())])
    }

    /// Answer `response` to prompts no rule matches.
    pub fn with_default(self, response: impl Into<String>) -> Self {
        *self.default_reply.write().unwrap() = Some(response.into());
        self
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<MockOracleCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of recorded calls whose prompt contains `pattern`.
    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.prompt.contains(pattern))
            .count()
    }

    /// Clear recorded calls.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn push_rule(self, pattern: String, replies: Vec<MockReply>) -> Self {
        if !replies.is_empty() {
            self.rules.write().unwrap().push(MockRule {
                pattern,
                replies: replies.into(),
            });
        }
        self
    }

    fn next_reply(&self, prompt: &str) -> Option<MockReply> {
        let mut rules = self.rules.write().unwrap();
        let rule = rules.iter_mut().find(|r| prompt.contains(&r.pattern))?;
        if rule.replies.len() > 1 {
            rule.replies.pop_front()
        } else {
            rule.replies.front().cloned()
        }
    }
}

#[async_trait]
impl TextOracle for MockOracle {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> OracleResult<String> {
        self.calls.write().unwrap().push(MockOracleCall {
            prompt: prompt.to_string(),
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        });

        let reply = self
            .next_reply(prompt)
            .or_else(|| self.default_reply.read().unwrap().clone().map(MockReply::Text));

        match reply {
            Some(MockReply::Text(text)) => Ok(text),
            Some(MockReply::Fail(reason)) => Err(OracleError::Transport(reason)),
            None => Err(OracleError::Transport("no scripted response".into())),
        }
    }
}
