// GitHub API endpoint functions.
// Provides typed methods for fetching repositories and commits from the GitHub REST API.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;

use super::client::GitHubClient;
use super::types::{Commit, TrackedRepository};

/// Commits requested per repository per fetch.
pub const COMMITS_PER_PAGE: u32 = 10;

/// Repositories offered for selection.
pub const REPOS_PER_PAGE: u32 = 30;

impl GitHubClient {
    /// Get repositories accessible to the authenticated user, most recently updated first.
    pub async fn get_user_repos(&self, token: &str) -> Result<Vec<TrackedRepository>> {
        let params = [
            ("sort", "updated".to_string()),
            ("per_page", REPOS_PER_PAGE.to_string()),
        ];
        let response = self.get_with_params("/user/repos", &params, token).await?;
        let repos: Vec<TrackedRepository> = response.json().await?;
        Ok(repos)
    }

    /// Get the newest commits of a repository, optionally only those since `since`.
    pub async fn get_commits(
        &self,
        full_name: &str,
        since: Option<DateTime<Utc>>,
        token: &str,
    ) -> Result<Vec<Commit>> {
        let mut params = vec![("per_page", COMMITS_PER_PAGE.to_string())];
        if let Some(since) = since {
            params.push(("since", since.to_rfc3339_opts(SecondsFormat::Millis, true)));
        }

        let response = self
            .get_with_params(&format!("/repos/{}/commits", full_name), &params, token)
            .await?;
        let commits: Vec<Commit> = response.json().await?;
        Ok(commits)
    }
}
