//! Language-model providers
//!
//! The SQL agent only needs "prompt in, text out". `LlmProvider` is that
//! seam; `GeminiClient` is the hosted implementation.

pub mod gemini;
#[cfg(test)]
pub(crate) mod scripted;

pub use gemini::GeminiClient;

use async_trait::async_trait;

/// Errors raised by a provider
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Model returned no text")]
    EmptyResponse,

    #[error("Failed to parse model response: {0}")]
    ResponseParsing(String),

    #[error("Invalid client configuration: {0}")]
    Config(String),
}

impl LlmError {
    /// Classify a non-success HTTP reply from a provider
    pub fn from_api_failure(status: u16, message: String) -> Self {
        if status == 429 || is_quota_exhausted(&message) {
            Self::RateLimited(message)
        } else {
            Self::Api { status, message }
        }
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited(_))
    }
}

/// True when a provider message reports an exhausted quota.
///
/// Gemini signals this with a `RESOURCE_EXHAUSTED` status whose message
/// starts with "Quota exceeded". Both must be present.
pub fn is_quota_exhausted(message: &str) -> bool {
    message.contains("RESOURCE_EXHAUSTED") && message.contains("Quota exceeded")
}

/// A text-completion backend
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a single prompt
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;

    /// Short name for logs
    fn name(&self) -> &str;
}
