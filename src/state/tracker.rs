// Tracking coordinator.
// Owns the dashboard state and drives load, retry, stop, and summary generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::cache::{SessionCache, lock};
use crate::error::{Result, StandupError};
use crate::fetch::{BatchPolicy, CommitResolver};
use crate::github::{Commit, CommitSource, TrackedRepository};
use crate::session::{SessionStore, TrackingSession};
use crate::summary::{Summary, SummaryGenerator, TextGenerator, timeframe_label};

use super::dashboard::{DashboardState, LoadPhase, StateScope};

/// Coordinates fetching and summarizing for one tracking session.
///
/// Every `load` takes a new generation number; results are only written
/// back if no newer load has started in the meantime. Summaries are tied to
/// the session epoch instead, which moves when the session is replaced,
/// stopped or started, so a retry never throws away a running summary.
pub struct Tracker {
    source: Arc<dyn CommitSource>,
    store: Arc<dyn SessionStore>,
    cache: Arc<SessionCache>,
    summaries: SummaryGenerator,
    policy: BatchPolicy,
    state: Mutex<DashboardState>,
    generation: AtomicU64,
    epoch: AtomicU64,
}

impl Tracker {
    pub fn new(
        source: Arc<dyn CommitSource>,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        let cache = Arc::new(SessionCache::new());
        Self {
            source,
            store,
            summaries: SummaryGenerator::new(generator, cache.clone()),
            cache,
            policy: BatchPolicy::default(),
            state: Mutex::new(DashboardState::default()),
            generation: AtomicU64::new(0),
            epoch: AtomicU64::new(0),
        }
    }

    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> DashboardState {
        lock(&self.state).clone()
    }

    /// Read the tracking session and fetch commits for every tracked repository.
    pub async fn load(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.apply(generation, |state| {
            state.phase = LoadPhase::Loading;
            state.error = None;
            state.credential_failure = false;
        });

        let session = match self.store.load() {
            Ok(Some(session)) => session,
            Ok(None) => {
                self.fail(generation, StandupError::NoTrackingData);
                return;
            }
            Err(e) => {
                self.fail(generation, e);
                return;
            }
        };

        tracing::info!(
            generation,
            repos = session.repositories.len(),
            since = %session.start_date,
            "Loading commits"
        );
        self.apply(generation, |state| {
            if state.session.as_ref() != Some(&session) {
                self.begin_epoch(state);
            }
            state.session = Some(session.clone());
        });

        let outcome = CommitResolver::new(self.source.as_ref(), &self.cache)
            .resolve_all(&session, self.policy)
            .await;

        let error = outcome.error_message();
        let credential_failure = outcome.has_credential_failure();
        let applied = self.apply(generation, move |state| {
            state.commits = outcome.commits;
            state.error = error;
            state.credential_failure = credential_failure;
            state.phase = LoadPhase::Ready;
        });

        if !applied {
            tracing::debug!(generation, "Discarded results of superseded load");
        }
    }

    /// Run a fresh load. No backoff; meant for user-triggered retries.
    pub async fn retry(&self) {
        self.load().await;
    }

    /// Forget the tracking session. In-flight loads and summaries are discarded.
    pub fn stop(&self) -> Result<()> {
        self.store.clear()?;
        self.reset(DashboardState {
            phase: LoadPhase::Stopped,
            ..DashboardState::default()
        });
        tracing::info!("Tracking stopped");
        Ok(())
    }

    /// Begin tracking `repositories` from now on, replacing any previous session.
    pub fn start_tracking(
        &self,
        repositories: Vec<TrackedRepository>,
        access_token: &str,
    ) -> Result<TrackingSession> {
        if repositories.is_empty() {
            return Err(StandupError::Other("No repositories selected".to_string()));
        }

        let session = TrackingSession::begin(repositories, access_token);
        self.store.save(&session)?;
        tracing::info!(repos = session.repositories.len(), "Tracking started");

        self.reset(DashboardState {
            session: Some(session.clone()),
            ..DashboardState::default()
        });
        Ok(session)
    }

    /// Summarize the given commits of a tracked repository.
    pub async fn generate_summary(
        &self,
        repo: &TrackedRepository,
        commits: &[Commit],
    ) -> Option<Summary> {
        let scope = StateScope::current(&self.state, &self.epoch);
        self.summarize_in(&scope, repo, commits).await
    }

    /// Summarize a tracked repository's currently loaded commits.
    pub async fn summarize_repository(&self, repo_id: u64) -> Option<Summary> {
        let scope = StateScope::current(&self.state, &self.epoch);
        let (repo, commits) = scope
            .apply(|state| {
                let repo = state.session.as_ref()?.repository(repo_id)?.clone();
                let commits = state.commits_for(repo_id).unwrap_or_default().to_vec();
                Some((repo, commits))
            })
            .flatten()?;
        self.summarize_in(&scope, &repo, &commits).await
    }

    async fn summarize_in(
        &self,
        scope: &StateScope<'_>,
        repo: &TrackedRepository,
        commits: &[Commit],
    ) -> Option<Summary> {
        let start_date = scope
            .apply(|state| match state.session.as_ref() {
                Some(session) => Some(session.start_date),
                None => {
                    state.summary_error = Some(StandupError::NoTrackingData.to_string());
                    None
                }
            })
            .flatten()?;

        self.summaries
            .generate(scope, repo, commits, &timeframe_label(&start_date))
            .await
    }

    fn fail(&self, generation: u64, error: StandupError) {
        tracing::warn!(generation, status = ?error.status(), error = %error, "Load failed");
        let credential_failure = error.is_credential_failure();
        self.apply(generation, |state| {
            state.phase = LoadPhase::Failed;
            state.error = Some(error.to_string());
            state.credential_failure = credential_failure;
        });
    }

    /// Apply `update` only if `generation` is still the newest load.
    fn apply(&self, generation: u64, update: impl FnOnce(&mut DashboardState)) -> bool {
        StateScope::at(&self.state, &self.generation, generation)
            .apply(update)
            .is_some()
    }

    /// Start a new session epoch: summaries of the previous session no longer apply.
    fn begin_epoch(&self, state: &mut DashboardState) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.clear();
        state.summaries.clear();
        state.generating.clear();
        state.summary_error = None;
        state.summary_credential_failure = false;
    }

    /// Replace the whole state, invalidating every in-flight load and summary.
    fn reset(&self, next: DashboardState) {
        let mut state = lock(&self.state);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.begin_epoch(&mut state);
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::source::{MockCommitSource, commit};
    use crate::session::{MemorySessionStore, repo};
    use crate::summary::GenerationError;
    use crate::summary::generator::mock::MockGenerator;
    use reqwest::StatusCode;
    use std::time::Duration;

    fn session(repos: Vec<TrackedRepository>) -> TrackingSession {
        TrackingSession {
            repositories: repos,
            start_date: "2024-01-01T00:00:00Z".parse().unwrap(),
            access_token: "gho_test".to_string(),
        }
    }

    fn tracker(
        source: &MockCommitSource,
        store: &Arc<MemorySessionStore>,
    ) -> (Tracker, Arc<MockGenerator>) {
        let generator = Arc::new(MockGenerator::default());
        let tracker = Tracker::new(
            Arc::new(source.clone()),
            generator.clone(),
            store.clone(),
        );
        (tracker, generator)
    }

    #[tokio::test]
    async fn test_load_falls_back_to_recent_commits() {
        let recent = commit("ccc", "2024-02-01T00:00:00Z");
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", Vec::new())
            .with_recent("octo/alpha", vec![recent.clone()]);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/alpha")]))));
        let (tracker, _) = tracker(&source, &store);

        tracker.load().await;

        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert_eq!(state.commits_for(1), Some(&[recent][..]));
        assert!(state.error.is_none());
    }

    #[tokio::test]
    async fn test_load_without_session_fails() {
        let source = MockCommitSource::new();
        let store = Arc::new(MemorySessionStore::default());
        let (tracker, _) = tracker(&source, &store);

        tracker.load().await;

        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("No tracking data found"));
        assert!(source.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partial_failure_is_still_ready() {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")])
            .with_status("octo/beta", StatusCode::UNAUTHORIZED);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![
            repo(1, "octo/alpha"),
            repo(2, "octo/beta"),
        ]))));
        let (tracker, _) = tracker(&source, &store);
        let tracker = tracker.with_batch_policy(BatchPolicy::new(1, Duration::from_millis(10)));

        tracker.load().await;

        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert!(state.commits_for(1).is_some());
        assert!(state.commits_for(2).is_none());
        assert_eq!(
            state.error.as_deref(),
            Some("GitHub API Errors:\nbeta: 401 Unauthorized")
        );
        assert!(state.remediation_hint().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_is_discarded() {
        let source = MockCommitSource::new()
            .with_dated("octo/slow", vec![commit("sss", "2024-01-02T00:00:00Z")])
            .with_latency("octo/slow", Duration::from_secs(5))
            .with_dated("octo/fast", vec![commit("fff", "2024-01-02T00:00:00Z")])
            .with_latency("octo/fast", Duration::from_secs(1));
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/slow")]))));
        let (tracker, _) = tracker(&source, &store);

        let replaced = session(vec![repo(2, "octo/fast")]);
        tokio::join!(tracker.load(), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            store.save(&replaced).unwrap();
            tracker.retry().await;
        });

        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert_eq!(state.session, Some(replaced));
        assert!(state.commits_for(1).is_none());
        assert_eq!(state.commits_for(2).map(<[Commit]>::len), Some(1));
    }

    #[tokio::test]
    async fn test_retry_recovers_after_failure() {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")]);
        let store = Arc::new(MemorySessionStore::default());
        let (tracker, _) = tracker(&source, &store);

        tracker.load().await;
        assert_eq!(tracker.snapshot().phase, LoadPhase::Failed);

        store.save(&session(vec![repo(1, "octo/alpha")])).unwrap();
        tracker.retry().await;

        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert!(state.error.is_none());
        assert!(state.commits_for(1).is_some());
    }

    #[tokio::test]
    async fn test_stop_clears_session_and_state() {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")]);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/alpha")]))));
        let (tracker, _) = tracker(&source, &store);

        tracker.load().await;
        tracker.stop().unwrap();

        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Stopped);
        assert!(state.commits.is_empty());
        assert!(state.session.is_none());
        assert_eq!(store.load().unwrap(), None);
    }

    #[tokio::test]
    async fn test_summaries_are_cached_per_commit_count() {
        let commits = vec![commit("aaa", "2024-01-02T00:00:00Z")];
        let source = MockCommitSource::new().with_dated("octo/alpha", commits);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/alpha")]))));
        let (tracker, generator) = tracker(&source, &store);

        tracker.load().await;
        let first = tracker.summarize_repository(1).await;
        let second = tracker.summarize_repository(1).await;

        assert_eq!(generator.calls(), 1);
        assert_eq!(first, second);
        let summary = first.unwrap();
        assert_eq!(summary.metadata.timeframe, "since 1/1/2024");
        assert_eq!(tracker.snapshot().summary_for(1), Some(&summary));
    }

    #[tokio::test]
    async fn test_summary_without_session_reports_error() {
        let source = MockCommitSource::new();
        let store = Arc::new(MemorySessionStore::default());
        let (tracker, generator) = tracker(&source, &store);
        let commits = vec![commit("aaa", "2024-01-02T00:00:00Z")];

        let result = tracker.generate_summary(&repo(1, "octo/alpha"), &commits).await;

        assert!(result.is_none());
        assert_eq!(generator.calls(), 0);
        assert_eq!(
            tracker.snapshot().summary_error.as_deref(),
            Some("No tracking data found")
        );
    }

    #[tokio::test]
    async fn test_start_tracking_persists_session() {
        let source = MockCommitSource::new();
        let store = Arc::new(MemorySessionStore::default());
        let (tracker, _) = tracker(&source, &store);

        let session = tracker
            .start_tracking(vec![repo(1, "octo/alpha")], "gho_new")
            .unwrap();

        assert_eq!(store.load().unwrap(), Some(session));
        assert!(tracker.start_tracking(Vec::new(), "gho_new").is_err());
    }

    fn tracker_with(
        source: &MockCommitSource,
        store: &Arc<MemorySessionStore>,
        generator: Arc<MockGenerator>,
    ) -> Tracker {
        Tracker::new(Arc::new(source.clone()), generator, store.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_discards_in_flight_summary() {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")]);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/alpha")]))));
        let generator = Arc::new(MockGenerator::slow(Duration::from_secs(1)));
        let tracker = tracker_with(&source, &store, generator.clone());
        tracker.load().await;

        let (summary, ()) = tokio::join!(tracker.summarize_repository(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tracker.stop().unwrap();
        });

        assert_eq!(generator.calls(), 1);
        assert!(summary.is_none());
        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Stopped);
        assert!(state.summaries.is_empty());
        assert!(state.generating.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_discards_old_summary() {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")]);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/alpha")]))));
        let generator = Arc::new(MockGenerator::slow(Duration::from_secs(1)));
        let tracker = tracker_with(&source, &store, generator);
        tracker.load().await;

        let (summary, ()) = tokio::join!(tracker.summarize_repository(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tracker
                .start_tracking(vec![repo(1, "octo/alpha")], "gho_new")
                .unwrap();
        });

        assert!(summary.is_none());
        let state = tracker.snapshot();
        assert_eq!(state.session.clone().map(|s| s.access_token), Some("gho_new".to_string()));
        assert!(state.summaries.is_empty());
        assert!(!state.is_generating(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_keeps_in_flight_summary() {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")]);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/alpha")]))));
        let generator = Arc::new(MockGenerator::slow(Duration::from_secs(1)));
        let tracker = tracker_with(&source, &store, generator);
        tracker.load().await;

        let (summary, ()) = tokio::join!(tracker.summarize_repository(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            tracker.retry().await;
        });

        assert!(summary.is_some());
        let state = tracker.snapshot();
        assert_eq!(state.phase, LoadPhase::Ready);
        assert_eq!(state.summary_for(1), summary.as_ref());
        assert!(state.generating.is_empty());
    }

    #[tokio::test]
    async fn test_load_keeps_summary_credential_hint() {
        let source = MockCommitSource::new()
            .with_dated("octo/alpha", vec![commit("aaa", "2024-01-02T00:00:00Z")]);
        let store = Arc::new(MemorySessionStore::new(Some(session(vec![repo(1, "octo/alpha")]))));
        let generator = Arc::new(MockGenerator::failing(GenerationError::InvalidCredential));
        let tracker = tracker_with(&source, &store, generator);

        tracker.load().await;
        tracker.summarize_repository(1).await;
        tracker.load().await;

        let state = tracker.snapshot();
        assert_eq!(state.summary_error.as_deref(), Some("Invalid OpenAI API key"));
        assert!(!state.credential_failure);
        assert!(state.remediation_hint().is_some());
    }
}
