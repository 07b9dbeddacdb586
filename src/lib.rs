//! # dermsql - natural-language questions over a dermatologist directory
//!
//! dermsql provides:
//! - Idempotent provisioning of the SQLite directory at a persistent path
//! - A read-only store over the `dermatologists` table
//! - A SQL agent that turns questions into `SELECT` statements via an LLM
//! - A Gemini REST client behind the `LlmProvider` seam
//! - An axum page and JSON API for asking questions

pub mod record;
pub mod storage;
pub mod llm;
pub mod agent;
pub mod secrets;
pub mod server;
pub mod output;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use record::DermatologistRecord;
pub use storage::{DatabaseProvisioner, DermatologistStore, ProvisionOutcome, ProvisioningError};
pub use llm::{GeminiClient, LlmError, LlmProvider};
pub use agent::{AgentError, Answer, SqlAgent};
pub use secrets::{Credentials, SecretProvider};

/// Result type alias for dermsql operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dermsql operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Database not found at {0}")]
    DatabaseMissing(String),

    #[error("Table `{0}` is missing from the database")]
    MissingTable(String),
}
