// In-memory TTL cache for API responses and generated summaries.
// Entries expire lazily: an expired entry is dropped the next time it is looked up.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Default TTL for commit lists: 5 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

/// TTL for the "most recent commits" fallback: 2 minutes.
pub const RECENT_COMMITS_TTL: Duration = Duration::from_secs(2 * 60);

/// TTL for generated summaries: 10 minutes.
pub const SUMMARY_TTL: Duration = Duration::from_secs(10 * 60);

/// Wrapper for cached data with metadata.
#[derive(Debug, Clone)]
pub struct CachedData<T> {
    /// The cached data.
    pub data: T,
    /// When the data was cached.
    pub cached_at: Instant,
    /// How long the data stays valid.
    pub ttl: Duration,
}

impl<T> CachedData<T> {
    /// Create a new cached data entry stamped with the current time.
    pub fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            cached_at: Instant::now(),
            ttl,
        }
    }

    /// Check if this cached data has expired.
    pub fn is_expired(&self) -> bool {
        Instant::now().saturating_duration_since(self.cached_at) >= self.ttl
    }

    /// Check if this cached data is still valid (not expired).
    pub fn is_valid(&self) -> bool {
        !self.is_expired()
    }
}

/// Key/value store with per-entry expiration.
#[derive(Debug)]
pub struct TtlCache<T> {
    entries: HashMap<String, CachedData<T>>,
    default_ttl: Duration,
}

impl<T> Default for TtlCache<T> {
    fn default() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }
}

impl<T> TtlCache<T> {
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            default_ttl,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Clone> TtlCache<T> {
    /// Look up a key, evicting it if it has expired.
    pub fn get(&mut self, key: &str) -> Option<T> {
        match self.entries.get(key) {
            Some(entry) if entry.is_valid() => Some(entry.data.clone()),
            Some(_) => {
                self.entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store a value with the default TTL, replacing any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: T) {
        let ttl = self.default_ttl;
        self.set_with_ttl(key, value, ttl);
    }

    /// Store a value with an explicit TTL, replacing any previous entry.
    pub fn set_with_ttl(&mut self, key: impl Into<String>, value: T, ttl: Duration) {
        self.entries.insert(key.into(), CachedData::new(value, ttl));
    }
}
