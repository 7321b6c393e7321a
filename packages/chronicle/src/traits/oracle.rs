//! Text-generation oracle contract.

use async_trait::async_trait;

use crate::error::OracleResult;

/// Sampling constraints for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    /// Sampling temperature in [0, 2].
    pub temperature: f32,
    /// Upper bound on response tokens. Must be positive.
    pub max_tokens: u32,
}

impl GenerationParams {
    pub fn new(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature,
            max_tokens,
        }
    }

    /// Same limits with a different temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

/// A stateless prompt-in, text-out generation capability.
///
/// Implementations make exactly one attempt per call and report failures
/// as [`crate::error::OracleError::Transport`]. Retrying, validation and
/// output repair belong to [`crate::contract::StructuredClient`].
#[async_trait]
pub trait TextOracle: Send + Sync {
    /// Generate a raw completion for `prompt`.
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> OracleResult<String>;
}

#[async_trait]
impl<T: TextOracle + ?Sized> TextOracle for std::sync::Arc<T> {
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> OracleResult<String> {
        (**self).generate(prompt, params).await
    }
}
