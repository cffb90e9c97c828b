// Cached summary generation with per-repository in-flight flags.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::{SessionCache, summary_key};
use crate::github::{Commit, TrackedRepository};
use crate::state::StateScope;

use super::types::{Summary, SummaryRequest};
use super::TextGenerator;

/// Timeframe label for summaries of commits since `start_date`.
pub fn timeframe_label(start_date: &DateTime<Utc>) -> String {
    format!("since {}", start_date.format("%-m/%-d/%Y"))
}

/// Raised generation flag; lowered again on drop, whatever the outcome.
struct GeneratingFlag<'s, 'a> {
    scope: &'s StateScope<'a>,
    repo_id: u64,
}

impl<'s, 'a> GeneratingFlag<'s, 'a> {
    /// Raise the flag, or return `None` if a request is already in flight
    /// or the scope is stale.
    fn raise(scope: &'s StateScope<'a>, repo_id: u64) -> Option<Self> {
        let raised = scope.apply(|state| {
            if !state.generating.insert(repo_id) {
                return false;
            }
            state.summary_error = None;
            state.summary_credential_failure = false;
            true
        });
        raised
            .unwrap_or(false)
            .then(|| Self { scope, repo_id })
    }
}

impl Drop for GeneratingFlag<'_, '_> {
    fn drop(&mut self) {
        // A stale scope means the state was reset, flags included.
        self.scope.apply(|state| state.generating.remove(&self.repo_id));
    }
}

/// Generates summaries through a [`TextGenerator`], reusing cached results.
pub struct SummaryGenerator {
    generator: Arc<dyn TextGenerator>,
    cache: Arc<SessionCache>,
}

impl SummaryGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, cache: Arc<SessionCache>) -> Self {
        Self { generator, cache }
    }

    /// Summarize `commits` and merge the result into the scoped state.
    ///
    /// Returns `None` without side effects when there is nothing to summarize
    /// or a request for the same repository is already running. Failures are
    /// recorded in `summary_error`; existing summaries are left alone. Once
    /// the scope goes stale nothing is written and `None` is returned.
    pub async fn generate(
        &self,
        scope: &StateScope<'_>,
        repo: &TrackedRepository,
        commits: &[Commit],
        timeframe: &str,
    ) -> Option<Summary> {
        if commits.is_empty() {
            return None;
        }

        let Some(_flag) = GeneratingFlag::raise(scope, repo.id) else {
            tracing::debug!(repo = %repo.full_name, "Summary already in flight");
            return None;
        };

        let key = summary_key(repo.id, commits.len(), timeframe);
        if let Some(summary) = self.cache.summary(&key) {
            tracing::debug!(%key, "Summary cache hit");
            return scope
                .apply(|state| state.summaries.insert(repo.id, summary.clone()))
                .map(|_| summary);
        }

        let request = SummaryRequest {
            commits,
            repository_name: &repo.name,
            timeframe,
        };

        match self.generator.summarize(request).await {
            Ok(summary) => {
                let applied = scope.apply(|state| {
                    self.cache.store_summary(key, summary.clone());
                    state.summaries.insert(repo.id, summary.clone());
                });
                if applied.is_none() {
                    tracing::debug!(repo = %repo.full_name, "Discarded summary for a replaced session");
                    return None;
                }
                tracing::info!(repo = %repo.full_name, commits = commits.len(), "Summary generated");
                Some(summary)
            }
            Err(e) => {
                tracing::warn!(repo = %repo.full_name, error = %e, "Summary generation failed");
                scope.apply(|state| {
                    state.summary_error = Some(e.to_string());
                    state.summary_credential_failure = e.is_credential_failure();
                });
                None
            }
        }
    }
}

// ---------- Test-only mock generator ----------
