//! Workspace reset: a clean slate for every run.
//!
//! Destructive by design: the archive directory is deleted and recreated
//! and the previous error side-file removed, with no confirmation prompt.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Recreates `archive_dir` empty and removes any previous `error_log`.
/// Idempotent: running it twice leaves the same state.
pub fn reset(archive_dir: &Path, error_log: &Path) -> Result<()> {
    if archive_dir.exists() {
        fs::remove_dir_all(archive_dir)
            .with_context(|| format!("delete {}", archive_dir.display()))?;
        tracing::info!("removed previous {}", archive_dir.display());
    }
    fs::create_dir_all(archive_dir)
        .with_context(|| format!("create {}", archive_dir.display()))?;

    if error_log.exists() {
        fs::remove_file(error_log).with_context(|| format!("delete {}", error_log.display()))?;
        tracing::info!("removed previous {}", error_log.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_archives_and_error_log() {
        let dir = tempfile::tempdir().unwrap();
        let archive_dir = dir.path().join("tgz");
        let error_log = dir.path().join("error.txt");

        fs::create_dir_all(&archive_dir).unwrap();
        fs::write(archive_dir.join("stale-1.0.0.tgz"), b"stale").unwrap();
        fs::write(&error_log, "https://example.com/a/-/a-1.0.0.tgz\n").unwrap();

        reset(&archive_dir, &error_log).unwrap();

        assert!(archive_dir.is_dir());
        assert_eq!(fs::read_dir(&archive_dir).unwrap().count(), 0);
        assert!(!error_log.exists());
    }

    #[test]
    fn reset_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let archive_dir = dir.path().join("tgz");
        let error_log = dir.path().join("error.txt");

        reset(&archive_dir, &error_log).unwrap();
        reset(&archive_dir, &error_log).unwrap();

        assert!(archive_dir.is_dir());
        assert_eq!(fs::read_dir(&archive_dir).unwrap().count(), 0);
        assert!(!error_log.exists());
    }
}
