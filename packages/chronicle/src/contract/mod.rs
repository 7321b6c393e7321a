//! Structured extraction contract.
//!
//! [`StructuredClient`] turns one prompt into one typed value. It validates
//! the request, retries failed attempts up to a fixed budget, strips
//! reasoning blocks and repairs malformed JSON. Malformed-but-present
//! output never fails a request: it degrades to a partial or empty value
//! and is logged.

pub mod fields;
pub mod repair;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::{OracleError, OracleResult};
use crate::traits::oracle::{GenerationParams, TextOracle};
use crate::types::config::OracleConfig;

pub use repair::{clean_json, repair_and_parse, strip_thinking, JsonShape};

/// The value type a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Text,
    JsonArray,
    JsonObject,
}

/// A typed oracle result.
#[derive(Debug, Clone, PartialEq)]
pub enum Structured {
    Text(String),
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

/// Retrying, repairing wrapper around a [`TextOracle`].
#[derive(Debug, Clone)]
pub struct StructuredClient<O> {
    oracle: O,
    defaults: GenerationParams,
    max_attempts: u32,
}

impl<O: TextOracle> StructuredClient<O> {
    /// Create a client using the request defaults from `config`.
    pub fn new(oracle: O, config: &OracleConfig) -> Self {
        Self {
            oracle,
            defaults: GenerationParams::new(config.temperature, config.max_tokens),
            max_attempts: config.max_retries.max(1),
        }
    }

    /// Override the total attempts per request (minimum 1).
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Default request parameters.
    pub fn params(&self) -> GenerationParams {
        self.defaults
    }

    /// Default parameters at a different temperature.
    pub fn params_at(&self, temperature: f32) -> GenerationParams {
        self.defaults.with_temperature(temperature)
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Issue one typed request.
    ///
    /// Fails with [`OracleError::InvalidRequest`] on bad parameters, and with
    /// [`OracleError::Unavailable`] or [`OracleError::EmptyResponse`] once
    /// every attempt has failed.
    pub async fn request(
        &self,
        prompt: &str,
        kind: OutputKind,
        params: &GenerationParams,
    ) -> OracleResult<Structured> {
        validate_request(prompt, params)?;

        let raw = self.generate_with_retries(prompt, params).await?;

        Ok(match kind {
            OutputKind::Text => Structured::Text(raw),
            OutputKind::JsonArray => Structured::Array(parse_array(&raw)),
            OutputKind::JsonObject => Structured::Object(parse_object(&raw)),
        })
    }

    /// Request trimmed plain text.
    pub async fn text(&self, prompt: &str, params: &GenerationParams) -> OracleResult<String> {
        match self.request(prompt, OutputKind::Text, params).await? {
            Structured::Text(text) => Ok(text),
            _ => Ok(String::new()),
        }
    }

    /// Request a JSON array. An empty vector means no usable data.
    pub async fn json_array(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> OracleResult<Vec<Value>> {
        match self.request(prompt, OutputKind::JsonArray, params).await? {
            Structured::Array(items) => Ok(items),
            _ => Ok(Vec::new()),
        }
    }

    /// Request a JSON object. An empty map means no usable data.
    pub async fn json_object(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> OracleResult<Map<String, Value>> {
        match self.request(prompt, OutputKind::JsonObject, params).await? {
            Structured::Object(object) => Ok(object),
            _ => Ok(Map::new()),
        }
    }

    async fn generate_with_retries(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> OracleResult<String> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            debug!(attempt, prompt_len = prompt.len(), "Calling oracle");

            match self.oracle.generate(prompt, params).await {
                Ok(raw) => {
                    let text = strip_thinking(&raw).trim().to_string();
                    if !text.is_empty() {
                        debug!(attempt, response_len = text.len(), "Oracle response received");
                        return Ok(text);
                    }
                    warn!(attempt, max_attempts = self.max_attempts, "Oracle returned an empty response");
                    last_error = Some(OracleError::EmptyResponse { attempts: attempt });
                }
                Err(OracleError::InvalidRequest(reason)) => {
                    return Err(OracleError::InvalidRequest(reason));
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Oracle request failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        let attempts = self.max_attempts;
        Err(match last_error {
            Some(OracleError::EmptyResponse { .. }) => OracleError::EmptyResponse { attempts },
            Some(e) => OracleError::Unavailable {
                attempts,
                reason: e.to_string(),
            },
            None => OracleError::Unavailable {
                attempts,
                reason: "no attempt made".into(),
            },
        })
    }
}

fn validate_request(prompt: &str, params: &GenerationParams) -> OracleResult<()> {
    if prompt.trim().is_empty() {
        return Err(OracleError::InvalidRequest("prompt is empty".into()));
    }
    if !(0.0..=2.0).contains(&params.temperature) {
        return Err(OracleError::InvalidRequest(format!(
            "temperature {} outside [0, 2]",
            params.temperature
        )));
    }
    if params.max_tokens == 0 {
        return Err(OracleError::InvalidRequest("max_tokens must be positive".into()));
    }
    Ok(())
}

fn parse_array(raw: &str) -> Vec<Value> {
    match repair_and_parse(raw, JsonShape::Array) {
        Some(Value::Array(items)) => items,
        _ => {
            warn!(response_preview = %preview(raw), "Could not recover a JSON array from oracle output");
            Vec::new()
        }
    }
}

fn parse_object(raw: &str) -> Map<String, Value> {
    match repair_and_parse(raw, JsonShape::Object) {
        Some(Value::Object(object)) => object,
        _ => {
            warn!(response_preview = %preview(raw), "Could not recover a JSON object from oracle output");
            Map::new()
        }
    }
}

fn preview(raw: &str) -> String {
    raw.chars().take(200).collect()
}
