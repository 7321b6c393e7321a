//! OpenAI-compatible chat completions oracle.
//!
//! Works against any server exposing `/chat/completions` (vLLM, llama.cpp,
//! Ollama, OpenAI itself).
//!
//! # Example
//!
//! ```rust,ignore
//! use chronicle::oracle::OpenAiOracle;
//!
//! let oracle = OpenAiOracle::new("http://localhost:8001/v1", "qwen3-30b")?
//!     .with_api_key("sk-...");
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ChronicleError, OracleError, OracleResult, Result};
use crate::traits::oracle::{GenerationParams, TextOracle};
use crate::types::config::OracleConfig;

/// HTTP oracle speaking the OpenAI chat completions protocol.
///
/// Makes one attempt per call; [`crate::contract::StructuredClient`] retries.
#[derive(Clone)]
pub struct OpenAiOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

impl OpenAiOracle {
    /// Create an oracle for `base_url` (e.g. `http://localhost:8001/v1`).
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        Self::build(base_url.into(), model.into(), None, Duration::from_secs(60))
    }

    /// Create an oracle from the `oracle` section of the configuration.
    pub fn from_config(config: &OracleConfig) -> Result<Self> {
        Self::build(
            config.endpoint.clone(),
            config.model.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn build(
        base_url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChronicleError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Send a bearer token with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextOracle for OpenAiOracle {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> OracleResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.header("Authorization", format!("Bearer {key}"));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OracleError::Transport(format!(
                "chat completion returned {status}: {error_text}"
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| OracleError::Transport(e.to_string()))?;

        let content = chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| OracleError::Transport("response has no message content".into()))?;

        debug!(model = %self.model, response_len = content.len(), "Chat completion received");
        Ok(content)
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}
