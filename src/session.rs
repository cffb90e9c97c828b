// Persisted tracking session.
// Reads, writes and deletes the JSON blob describing which repositories are tracked.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::github::TrackedRepository;

/// Repositories being tracked, since when, and the credential to fetch them with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    pub repositories: Vec<TrackedRepository>,
    pub start_date: DateTime<Utc>,
    pub access_token: String,
}

impl TrackingSession {
    /// Start tracking now.
    pub fn begin(repositories: Vec<TrackedRepository>, access_token: impl Into<String>) -> Self {
        Self {
            repositories,
            start_date: Utc::now(),
            access_token: access_token.into(),
        }
    }

    pub fn repository(&self, repo_id: u64) -> Option<&TrackedRepository> {
        self.repositories.iter().find(|r| r.id == repo_id)
    }
}

/// Storage for the tracking session. A missing session is `Ok(None)`, not an error.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<TrackingSession>>;
    fn save(&self, session: &TrackingSession) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session stored as a JSON file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<TrackingSession>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let session: TrackingSession = serde_json::from_str(&contents)?;
        Ok(Some(session))
    }

    fn save(&self, session: &TrackingSession) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(session)?;

        // Write atomically via temp file
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &self.path)?;

        Ok(())
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) use memory::{MemorySessionStore, repo};


#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn session() -> TrackingSession {
        TrackingSession {
            repositories: vec![repo(1, "octo/alpha"), repo(2, "octo/beta")],
            start_date: "2024-01-01T00:00:00Z".parse().unwrap(),
            access_token: "gho_test".to_string(),
        }
    }

    #[test]
    fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("nested/tracking.json"));

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));
        assert!(!store.path().with_extension("tmp").exists());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("tracking.json"));

        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_clear_removes_session() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(temp_dir.path().join("tracking.json"));

        store.save(&session()).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_blob_uses_camel_case_fields() {
        let json = serde_json::to_value(session()).unwrap();
        assert_eq!(json["startDate"], "2024-01-01T00:00:00Z");
        assert_eq!(json["accessToken"], "gho_test");
        assert_eq!(json["repositories"][1]["full_name"], "octo/beta");
    }

    #[test]
    fn test_repository_lookup() {
        let session = session();
        assert_eq!(session.repository(2).map(|r| r.name.as_str()), Some("beta"));
        assert!(session.repository(3).is_none());
    }
}
