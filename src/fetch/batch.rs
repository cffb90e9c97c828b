// Batched execution for rate-limited APIs.
// Items run concurrently within a group; groups run one after another with a pause between them.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;

/// How many items run together, and how long to wait between groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    group_size: usize,
    delay: Duration,
}

impl BatchPolicy {
    /// Three requests at a time keeps clear of GitHub's secondary rate limits.
    pub const GROUP_SIZE: usize = 3;
    pub const DELAY: Duration = Duration::from_millis(1000);

    pub fn new(group_size: usize, delay: Duration) -> Self {
        Self {
            group_size: group_size.max(1),
            delay,
        }
    }

    /// Items per group; never zero.
    pub fn group_size(&self) -> usize {
        self.group_size
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Number of groups needed for `len` items.
    pub fn group_count(&self, len: usize) -> usize {
        len.div_ceil(self.group_size)
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::new(Self::GROUP_SIZE, Self::DELAY)
    }
}

/// Run `op` for every item and return the results in input order.
///
/// Each group is a barrier: every operation in it settles before the next
/// group starts. Operations should report failure through their output so
/// one failing item never affects its siblings.
pub async fn run_batched<'a, T, R, F, Fut>(items: &'a [T], policy: BatchPolicy, op: F) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R>,
{
    let mut results = Vec::with_capacity(items.len());
    let groups = policy.group_count(items.len());

    for (index, group) in items.chunks(policy.group_size()).enumerate() {
        tracing::debug!(group = index + 1, of = groups, size = group.len(), "Running batch");
        results.extend(join_all(group.iter().map(&op)).await);

        if index + 1 < groups {
            tokio::time::sleep(policy.delay()).await;
        }
    }

    results
}
