// GitHub API response types.
// Defines structs for deserializing repositories and commits from the GitHub REST API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// GitHub repository as selected for tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: Option<String>,
    pub private: bool,
    pub updated_at: DateTime<Utc>,
    pub language: Option<String>,
}

/// Commit as returned by `GET /repos/{owner}/{repo}/commits`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub sha: String,
    pub commit: CommitDetail,
    pub html_url: String,
}

/// Git-level commit data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitDetail {
    pub message: String,
    pub author: CommitAuthor,
}

/// Git author signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitAuthor {
    pub name: String,
    pub date: DateTime<Utc>,
}

impl Commit {
    pub fn message(&self) -> &str {
        &self.commit.message
    }

    /// First line of the commit message.
    pub fn title(&self) -> &str {
        self.commit.message.lines().next().unwrap_or_default()
    }

    pub fn author_name(&self) -> &str {
        &self.commit.author.name
    }

    pub fn authored_at(&self) -> DateTime<Utc> {
        self.commit.author.date
    }

    /// Abbreviated sha (first 7 characters).
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

/// Rate limit information from response headers.
#[derive(Debug, Clone, Default)]
pub struct RateLimit {
    pub limit: u64,
    pub remaining: u64,
    pub reset: u64,
}
