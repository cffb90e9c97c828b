// Client-visible dashboard state.
// Everything the presentation layer reads lives here and is replaced, never patched mid-fetch.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::cache::lock;
use crate::github::Commit;
use crate::session::TrackingSession;
use crate::summary::Summary;

/// Commits per repository id, newest first.
pub type CommitSet = HashMap<u64, Vec<Commit>>;

/// Where the dashboard is in its load cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    /// Fetch finished; some repositories may still have failed.
    Ready,
    /// Nothing could be fetched (no tracking session).
    Failed,
    /// Tracking was stopped; the session is gone.
    Stopped,
}

impl LoadPhase {
    pub fn display(&self) -> &'static str {
        match self {
            LoadPhase::Idle => "Idle",
            LoadPhase::Loading => "Loading",
            LoadPhase::Ready => "Ready",
            LoadPhase::Failed => "Failed",
            LoadPhase::Stopped => "Stopped",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub session: Option<TrackingSession>,
    pub phase: LoadPhase,
    /// Repositories missing from the map failed to fetch.
    pub commits: CommitSet,
    pub summaries: HashMap<u64, Summary>,
    /// Repositories with a summary request in flight.
    pub generating: HashSet<u64>,
    /// Fetch error for the whole load cycle.
    pub error: Option<String>,
    /// Last summary generation error.
    pub summary_error: Option<String>,
    /// Set when the last load hit a rejected GitHub credential.
    pub credential_failure: bool,
    /// Set when the last summary request hit a rejected or missing API key.
    pub summary_credential_failure: bool,
}

impl DashboardState {
    pub fn is_loading(&self) -> bool {
        self.phase == LoadPhase::Loading
    }

    pub fn is_generating(&self, repo_id: u64) -> bool {
        self.generating.contains(&repo_id)
    }

    /// Commits for a repository; `None` means unknown or failed, not "no commits".
    pub fn commits_for(&self, repo_id: u64) -> Option<&[Commit]> {
        self.commits.get(&repo_id).map(Vec::as_slice)
    }

    pub fn summary_for(&self, repo_id: u64) -> Option<&Summary> {
        self.summaries.get(&repo_id)
    }

    /// Hint shown next to errors that need a new credential.
    pub fn remediation_hint(&self) -> Option<&'static str> {
        (self.credential_failure || self.summary_credential_failure)
            .then_some("Credentials were rejected. Set a fresh GITHUB_TOKEN / OPENAI_API_KEY and run `standup track` again.")
    }
}

/// The shared state as seen from one epoch of a counter.
///
/// Writes go through only while the counter still holds the epoch the scope
/// was opened at; the check happens under the state lock.
pub struct StateScope<'a> {
    state: &'a Mutex<DashboardState>,
    counter: &'a AtomicU64,
    epoch: u64,
}

impl<'a> StateScope<'a> {
    /// Scope bound to whatever epoch `counter` holds right now.
    pub fn current(state: &'a Mutex<DashboardState>, counter: &'a AtomicU64) -> Self {
        Self::at(state, counter, counter.load(Ordering::SeqCst))
    }

    pub fn at(state: &'a Mutex<DashboardState>, counter: &'a AtomicU64, epoch: u64) -> Self {
        Self {
            state,
            counter,
            epoch,
        }
    }

    /// Run `update` on the state, or return `None` if the epoch has moved on.
    pub fn apply<R>(&self, update: impl FnOnce(&mut DashboardState) -> R) -> Option<R> {
        let mut state = lock(self.state);
        if self.counter.load(Ordering::SeqCst) != self.epoch {
            return None;
        }
        Some(update(&mut state))
    }
}
