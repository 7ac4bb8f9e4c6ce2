//! Cross-process lock guard.
//!
//! Mutual exclusion over the lock-state file is implemented with an
//! exclusively created marker file: whichever process succeeds at
//! `create_new` owns the mutation right until it deletes the marker. The
//! marker records the owning process id for diagnosability. Acquisition
//! retries on `AlreadyExists` with a fixed interval; any other creation
//! error propagates immediately (permission errors are not retried).
//!
//! The guard only serializes lock-state mutation. Provider config files are
//! not covered; concurrent invocations writing the same provider config can
//! race, which matches the behavior this tool has always had.

use crate::core::SyncError;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tracing::debug;

/// Retry parameters for guard acquisition.
///
/// Defaults to 40 attempts 25ms apart, roughly one second of waiting before
/// a timeout is reported.
#[derive(Debug, Clone, Copy)]
pub struct GuardConfig {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self { attempts: 40, delay: Duration::from_millis(25) }
    }
}

/// An exclusively held marker file. Deleted on drop.
#[derive(Debug)]
pub struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        debug!(guard = %self.path.display(), "Lock guard released");
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(guard = %self.path.display(), error = %e, "Failed to remove guard file");
            }
        }
    }
}

impl LockGuard {
    /// Acquires the guard at `path`, retrying per `config`.
    ///
    /// Returns [`SyncError::LockTimeout`] once the retry budget is
    /// exhausted; the lock-state file is left exactly as it was.
    pub async fn acquire(path: &Path, config: GuardConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::utils::ensure_dir(parent)?;
        }

        let retries = FixedInterval::new(config.delay).take(config.attempts as usize);
        for delay in retries {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut marker) => {
                    // Owner pid, for whoever has to clean up a stale guard
                    let _ = write!(marker, "{}", std::process::id());
                    debug!(guard = %path.display(), "Lock guard acquired");
                    return Ok(Self { path: path.to_path_buf() });
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to create lock guard: {}", path.display())
                    });
                }
            }
        }

        Err(SyncError::LockTimeout {
            path: path.display().to_string(),
            attempts: config.attempts,
            waited_ms: (config.delay * config.attempts).as_millis() as u64,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_acquire_and_release() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json.lock");

        let guard = LockGuard::acquire(&path, GuardConfig::default()).await.unwrap();
        assert!(path.exists());
        let pid: u32 = std::fs::read_to_string(&path).unwrap().parse().unwrap();
        assert_eq!(pid, std::process::id());

        drop(guard);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_contended_guard_times_out() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("state.json.lock");

        let _held = LockGuard::acquire(&path, GuardConfig::default()).await.unwrap();

        let config = GuardConfig { attempts: 3, delay: Duration::from_millis(5) };
        let err = LockGuard::acquire(&path, config).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SyncError>(),
            Some(SyncError::LockTimeout { attempts: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_non_exists_error_propagates_without_retry() {
        let temp = TempDir::new().unwrap();
        // Guard path points inside a file, so create_new fails with NotADirectory
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let path = blocker.join("state.json.lock");

        let config = GuardConfig { attempts: 50, delay: Duration::from_millis(100) };
        let started = std::time::Instant::now();
        let result = LockGuard::acquire(&path, config).await;
        assert!(result.is_err());
        // Immediate failure, not a retry loop
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
