// Cache module for session-scoped API and summary caching.
// One SessionCache is built per coordinator and lent to the resolver and summary generator.

pub mod paths;
pub mod store;

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::github::Commit;
use crate::summary::Summary;

use store::{RECENT_COMMITS_TTL, SUMMARY_TTL, TtlCache};

/// Cache key for commits since the tracking start date.
pub fn commits_key(repo_id: u64, start_date: &DateTime<Utc>) -> String {
    format!(
        "commits-{}-{}",
        repo_id,
        start_date.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Cache key for the unfiltered "most recent commits" fallback.
pub fn recent_commits_key(repo_id: u64) -> String {
    format!("recent-commits-{}", repo_id)
}

/// Cache key for a generated summary.
///
/// Keyed on commit count rather than commit content, so a repository that
/// gains and loses a commit between calls reuses the earlier summary.
pub fn summary_key(repo_id: u64, commit_count: usize, timeframe: &str) -> String {
    format!("ai-summary-{}-{}-{}", repo_id, commit_count, timeframe)
}

/// Caches shared by one tracking session.
#[derive(Debug)]
pub struct SessionCache {
    commits: Mutex<TtlCache<Vec<Commit>>>,
    summaries: Mutex<TtlCache<Summary>>,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self {
            commits: Mutex::new(TtlCache::default()),
            summaries: Mutex::new(TtlCache::with_default_ttl(SUMMARY_TTL)),
        }
    }
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commits(&self, key: &str) -> Option<Vec<Commit>> {
        lock(&self.commits).get(key)
    }

    /// Store commits fetched since the tracking start (default TTL).
    pub fn store_commits(&self, key: impl Into<String>, commits: Vec<Commit>) {
        lock(&self.commits).set(key, commits);
    }

    /// Store the short-lived "most recent commits" fallback.
    pub fn store_recent_commits(&self, key: impl Into<String>, commits: Vec<Commit>) {
        lock(&self.commits).set_with_ttl(key, commits, RECENT_COMMITS_TTL);
    }

    pub fn summary(&self, key: &str) -> Option<Summary> {
        lock(&self.summaries).get(key)
    }

    pub fn store_summary(&self, key: impl Into<String>, summary: Summary) {
        lock(&self.summaries).set(key, summary);
    }

    /// Drop everything; used when the tracking session changes.
    pub fn clear(&self) {
        lock(&self.commits).clear();
        lock(&self.summaries).clear();
    }
}

// Contents stay usable even if a holder panicked mid-update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
