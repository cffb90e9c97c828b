// Error types for standup.
// Covers GitHub API failures, tracking session storage, and summary generation.

use reqwest::StatusCode;
use thiserror::Error;

use crate::summary::GenerationError;

#[derive(Error, Debug)]
pub enum StandupError {
    #[error("GitHub API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Authentication failed: invalid or expired token")]
    Unauthorized,

    #[error("Rate limit exceeded, resets at {reset_at}")]
    RateLimited { reset_at: String },

    #[error("No tracking data found")]
    NoTrackingData,

    #[error("Missing GITHUB_TOKEN environment variable")]
    MissingToken,

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl StandupError {
    /// HTTP status behind this error, when the server answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            StandupError::Status { status, .. } => Some(*status),
            StandupError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            StandupError::RateLimited { .. } => Some(StatusCode::FORBIDDEN),
            StandupError::Generation(e) => StatusCode::from_u16(e.status()).ok(),
            _ => None,
        }
    }

    /// Whether the user has to provide a new credential to recover.
    pub fn is_credential_failure(&self) -> bool {
        match self {
            StandupError::Unauthorized | StandupError::MissingToken => true,
            StandupError::Generation(e) => e.is_credential_failure(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, StandupError>;
