// Commit source boundary.
// The resolver talks to this trait so tests can substitute an in-memory source.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;

use super::client::GitHubClient;
use super::types::Commit;

/// Anything that can list a repository's newest commits.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// List up to ten newest commits, restricted to those since `since` when given.
    async fn list_commits(
        &self,
        full_name: &str,
        since: Option<DateTime<Utc>>,
        token: &str,
    ) -> Result<Vec<Commit>>;
}

#[async_trait]
impl CommitSource for GitHubClient {
    async fn list_commits(
        &self,
        full_name: &str,
        since: Option<DateTime<Utc>>,
        token: &str,
    ) -> Result<Vec<Commit>> {
        self.get_commits(full_name, since, token).await
    }
}

// ---------- Test-only mock source ----------

#[cfg(test)]
pub use mock::{MockCommitSource, commit};

#[cfg(test)]
mod mock {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use reqwest::StatusCode;

    use super::*;
    use crate::error::StandupError;
    use crate::github::{CommitAuthor, CommitDetail};

    /// Build a commit with the given sha and ISO author date.
    pub fn commit(sha: &str, date: &str) -> Commit {
        Commit {
            sha: sha.to_string(),
            commit: CommitDetail {
                message: format!("Commit {}", sha),
                author: CommitAuthor {
                    name: "Octocat".to_string(),
                    date: date.parse().expect("valid test date"),
                },
            },
            html_url: format!("https://github.com/octo/repo/commit/{}", sha),
        }
    }

    #[derive(Clone)]
    enum Reply {
        Commits(Vec<Commit>),
        Status(StatusCode),
        Failure(String),
    }

    /// In-memory commit source keyed by repository full name.
    ///
    /// Dated and undated queries are answered separately. Unregistered
    /// repositories answer 404.
    #[derive(Clone, Default)]
    pub struct MockCommitSource {
        inner: Arc<Mutex<MockInner>>,
    }

    #[derive(Default)]
    struct MockInner {
        dated: HashMap<String, Reply>,
        recent: HashMap<String, Reply>,
        latency: HashMap<String, Duration>,
        calls: Vec<(String, bool)>,
    }

    impl MockCommitSource {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer for queries with `since`.
        pub fn with_dated(self, full_name: &str, commits: Vec<Commit>) -> Self {
            self.reply(full_name, true, Reply::Commits(commits))
        }

        /// Answer for queries without `since`.
        pub fn with_recent(self, full_name: &str, commits: Vec<Commit>) -> Self {
            self.reply(full_name, false, Reply::Commits(commits))
        }

        /// Fail every query for the repository with an HTTP status.
        pub fn with_status(self, full_name: &str, status: StatusCode) -> Self {
            self.reply(full_name, true, Reply::Status(status))
                .reply(full_name, false, Reply::Status(status))
        }

        /// Fail every query for the repository before any response arrives.
        pub fn with_failure(self, full_name: &str, message: &str) -> Self {
            let reply = Reply::Failure(message.to_string());
            self.reply(full_name, true, reply.clone())
                .reply(full_name, false, reply)
        }

        /// Delay every answer for the repository.
        pub fn with_latency(self, full_name: &str, latency: Duration) -> Self {
            self.inner
                .lock()
                .unwrap()
                .latency
                .insert(full_name.to_string(), latency);
            self
        }

        fn reply(self, full_name: &str, dated: bool, reply: Reply) -> Self {
            {
                let mut inner = self.inner.lock().unwrap();
                let table = if dated {
                    &mut inner.dated
                } else {
                    &mut inner.recent
                };
                table.insert(full_name.to_string(), reply);
            }
            self
        }

        /// Every query seen so far as (full_name, dated).
        pub fn calls(&self) -> Vec<(String, bool)> {
            self.inner.lock().unwrap().calls.clone()
        }

        pub fn call_count(&self, full_name: &str) -> usize {
            self.calls().iter().filter(|(name, _)| name == full_name).count()
        }
    }

    #[async_trait]
    impl CommitSource for MockCommitSource {
        async fn list_commits(
            &self,
            full_name: &str,
            since: Option<DateTime<Utc>>,
            _token: &str,
        ) -> Result<Vec<Commit>> {
            let (reply, latency) = {
                let mut inner = self.inner.lock().unwrap();
                inner.calls.push((full_name.to_string(), since.is_some()));
                let table = if since.is_some() {
                    &inner.dated
                } else {
                    &inner.recent
                };
                (
                    table.get(full_name).cloned(),
                    inner.latency.get(full_name).copied(),
                )
            };

            if let Some(latency) = latency {
                tokio::time::sleep(latency).await;
            }

            match reply {
                Some(Reply::Commits(commits)) => Ok(commits),
                Some(Reply::Status(StatusCode::UNAUTHORIZED)) => Err(StandupError::Unauthorized),
                Some(Reply::Status(status)) => Err(StandupError::Status {
                    status,
                    body: String::new(),
                }),
                Some(Reply::Failure(message)) => Err(StandupError::Other(message)),
                None => Err(StandupError::Status {
                    status: StatusCode::NOT_FOUND,
                    body: "Not Found".to_string(),
                }),
            }
        }
    }
}
