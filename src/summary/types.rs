// Summary types exchanged with the text-generation collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::Commit;

/// Maximum number of per-commit insights in a summary.
pub const MAX_INSIGHTS: usize = 5;

/// Generated stand-up summary for one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Markdown narrative.
    pub summary: String,
    /// Short explanations of individual commits.
    pub insights: Vec<Insight>,
    pub metadata: SummaryMetadata,
}

/// Explanation of one commit, keyed by sha.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub sha: String,
    pub insight: String,
}

impl Insight {
    /// First seven characters of the sha, or all of it if shorter.
    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMetadata {
    pub commit_count: usize,
    pub timeframe: String,
    pub repository_name: String,
    pub generated_at: DateTime<Utc>,
}

impl Summary {
    /// Insight for a commit, if one was generated.
    pub fn insight_for(&self, sha: &str) -> Option<&str> {
        self.insights
            .iter()
            .find(|i| i.sha == sha)
            .map(|i| i.insight.as_str())
    }
}

/// Input to a summary generation.
#[derive(Debug, Clone, Copy)]
pub struct SummaryRequest<'a> {
    /// Commits in API order, newest first.
    pub commits: &'a [Commit],
    pub repository_name: &'a str,
    pub timeframe: &'a str,
}
