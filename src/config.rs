// Runtime configuration from environment variables.

use std::path::PathBuf;

use crate::cache::paths;
use crate::error::{Result, StandupError};
use crate::github::client::GITHUB_API_BASE;
use crate::summary::openai::{DEFAULT_MODEL, OPENAI_API_BASE};

#[derive(Debug, Clone)]
pub struct Config {
    /// Token used to list repositories and start new tracking sessions.
    pub github_token: Option<String>,
    pub github_api_url: String,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let data_dir = match get("STANDUP_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => paths::data_dir()
                .ok_or_else(|| StandupError::Other("No data directory available".to_string()))?,
        };

        Ok(Self {
            github_token: get("GITHUB_TOKEN"),
            github_api_url: get("STANDUP_GITHUB_API_URL")
                .unwrap_or_else(|| GITHUB_API_BASE.to_string()),
            openai_api_key: get("OPENAI_API_KEY"),
            openai_base_url: get("STANDUP_OPENAI_BASE_URL")
                .unwrap_or_else(|| OPENAI_API_BASE.to_string()),
            openai_model: get("STANDUP_OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            data_dir,
        })
    }

    pub fn github_token(&self) -> Result<&str> {
        self.github_token.as_deref().ok_or(StandupError::MissingToken)
    }

    pub fn session_path(&self) -> PathBuf {
        paths::session_path(&self.data_dir)
    }

    pub fn logs_dir(&self) -> PathBuf {
        paths::logs_dir(&self.data_dir)
    }
}
