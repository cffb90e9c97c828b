// Commit resolution for tracked repositories.
// Fetches commits since the tracking start, falling back to the newest commits when that comes back empty.

use std::fmt;

use crate::cache::{SessionCache, commits_key, recent_commits_key};
use crate::error::{Result, StandupError};
use crate::github::{Commit, CommitSource, TrackedRepository};
use crate::session::TrackingSession;
use crate::state::CommitSet;

use super::batch::{BatchPolicy, run_batched};

/// A repository whose commits could not be fetched.
#[derive(Debug)]
pub struct FetchFailure {
    pub repo_name: String,
    pub error: StandupError,
}

impl fmt::Display for FetchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.error.status() {
            Some(status) => write!(f, "{}: {}", self.repo_name, status),
            None => write!(
                f,
                "Failed to fetch commits for {}: {}",
                self.repo_name, self.error
            ),
        }
    }
}

/// Result of fetching every tracked repository once.
#[derive(Debug, Default)]
pub struct FetchOutcome {
    pub commits: CommitSet,
    pub failures: Vec<FetchFailure>,
}

impl FetchOutcome {
    /// All failures joined into one message, or `None` if everything succeeded.
    pub fn error_message(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let lines: Vec<String> = self.failures.iter().map(ToString::to_string).collect();
        Some(format!("GitHub API Errors:\n{}", lines.join("\n")))
    }

    pub fn has_credential_failure(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_credential_failure())
    }
}

/// Resolves commits per repository through a [`CommitSource`] and the session cache.
pub struct CommitResolver<'a> {
    source: &'a dyn CommitSource,
    cache: &'a SessionCache,
}

impl<'a> CommitResolver<'a> {
    pub fn new(source: &'a dyn CommitSource, cache: &'a SessionCache) -> Self {
        Self { source, cache }
    }

    /// Resolve commits for one repository.
    pub async fn resolve(
        &self,
        repo: &TrackedRepository,
        session: &TrackingSession,
    ) -> Result<Vec<Commit>> {
        let key = commits_key(repo.id, &session.start_date);
        if let Some(commits) = self.cache.commits(&key) {
            tracing::debug!(%key, "Commit cache hit");
            return Ok(commits);
        }

        let commits = self
            .source
            .list_commits(
                &repo.full_name,
                Some(session.start_date),
                &session.access_token,
            )
            .await?;

        if !commits.is_empty() {
            self.cache.store_commits(key, commits.clone());
            return Ok(commits);
        }

        // Nothing since the start date; show the latest activity instead.
        let recent_key = recent_commits_key(repo.id);
        if let Some(recent) = self.cache.commits(&recent_key) {
            tracing::debug!(key = %recent_key, "Recent commit cache hit");
            return Ok(recent);
        }

        match self
            .source
            .list_commits(&repo.full_name, None, &session.access_token)
            .await
        {
            Ok(recent) => {
                self.cache.store_recent_commits(recent_key, recent.clone());
                Ok(recent)
            }
            Err(e) => {
                tracing::warn!(repo = %repo.full_name, error = %e, "Recent commit fallback failed");
                Ok(commits)
            }
        }
    }

    /// Resolve every repository in the session, batched.
    pub async fn resolve_all(&self, session: &TrackingSession, policy: BatchPolicy) -> FetchOutcome {
        let results = run_batched(&session.repositories, policy, |repo| async move {
            (repo, self.resolve(repo, session).await)
        })
        .await;

        let mut outcome = FetchOutcome::default();
        for (repo, result) in results {
            match result {
                Ok(commits) => {
                    outcome.commits.insert(repo.id, commits);
                }
                Err(error) => {
                    let failure = FetchFailure {
                        repo_name: repo.name.clone(),
                        error,
                    };
                    tracing::warn!(repo = %repo.full_name, "{}", failure);
                    outcome.failures.push(failure);
                }
            }
        }
        outcome
    }
}
