//! SQL agent - natural-language questions to SQL and back
//!
//! Per-question failures are returned as `AgentError` and rendered for the
//! user; they never stop the process.

pub mod prompt;
pub mod sql_agent;

pub use sql_agent::SqlAgent;

use serde::Serialize;

use crate::llm::LlmError;
use crate::storage::QueryOutput;

/// Shown instead of the raw provider message when the quota is exhausted
pub const RATE_LIMIT_MESSAGE: &str = "You've hit the API's rate limit. Please wait a moment and try again.";

/// A phrased answer together with the query that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    pub text: String,
    pub sql: String,
    pub rows: QueryOutput,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("Question is empty")]
    EmptyQuestion,

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("Database error: {0}")]
    Database(#[from] crate::Error),

    #[error("No valid query after {attempts} attempts: {last_error}")]
    GaveUp { attempts: usize, last_error: String },
}

impl AgentError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Llm(e) if e.is_rate_limited())
    }

    /// Message for the answer area
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyQuestion => "Please enter a question.".to_string(),
            e if e.is_rate_limited() => RATE_LIMIT_MESSAGE.to_string(),
            e => format!("An unexpected error occurred: {}", e),
        }
    }
}
