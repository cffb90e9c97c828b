// Filesystem locations for standup's local state.
// Holds the persisted tracking session and the log directory.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

/// Get the base data directory (~/.local/share/standup on Linux).
pub fn data_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "standup").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Path to the persisted tracking session under `base`.
pub fn session_path(base: &Path) -> PathBuf {
    base.join("tracking.json")
}

/// Path to the log directory under `base`.
pub fn logs_dir(base: &Path) -> PathBuf {
    base.join("logs")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_base() {
        let base = Path::new("/tmp/standup");
        assert!(session_path(base).ends_with("standup/tracking.json"));
        assert!(logs_dir(base).ends_with("standup/logs"));
    }
}
