// Commit summary generation.
// Wraps an external text generator behind a trait and adds caching and in-flight tracking.

pub mod generator;
pub mod openai;
pub mod types;

use async_trait::async_trait;
use thiserror::Error;

pub use generator::{SummaryGenerator, timeframe_label};
pub use openai::OpenAiClient;
pub use types::{Summary, SummaryRequest};

/// Failures reported by a text generator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("OpenAI API key not configured")]
    MissingApiKey,

    #[error("No commits provided")]
    NoCommits,

    #[error("Invalid OpenAI API key")]
    InvalidCredential,

    #[error("Rate limit exceeded. Please try again later.")]
    RateLimited,

    #[error("Failed to generate summary: {0}")]
    Failed(String),
}

impl GenerationError {
    /// HTTP-style status shown to callers.
    pub fn status(&self) -> u16 {
        match self {
            GenerationError::NoCommits => 400,
            GenerationError::InvalidCredential => 401,
            GenerationError::RateLimited => 429,
            GenerationError::MissingApiKey | GenerationError::Failed(_) => 500,
        }
    }

    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            GenerationError::InvalidCredential | GenerationError::MissingApiKey
        )
    }
}

/// External capability that turns commits into a summary.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn summarize(&self, request: SummaryRequest<'_>) -> Result<Summary, GenerationError>;
}
