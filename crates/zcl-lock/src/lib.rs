//! Exclusive directory locks with stale-owner reaping (component B,
//! `WithDirLock`).
//!
//! A lock is a directory, not a file: `mkdir` either succeeds atomically
//! or fails with `EEXIST`, so no separate file-descriptor lock is
//! needed. A waiter that finds the directory already there polls with a
//! short randomized sleep until its `wait` budget is spent; if the
//! directory is older than `staleAfter` and its recorded owner PID is no
//! longer alive, the waiter reaps it and retakes the lock immediately.

mod liveness;
mod owner;

pub use owner::OwnerInfo;

use camino::{Utf8Path, Utf8PathBuf};
use chrono::Utc;
use rand::Rng;
use std::io;
use std::time::{Duration, Instant, SystemTime};

/// Age after which a held lock directory becomes eligible for reaping,
/// provided its owner PID is no longer alive.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(120);

/// Errors from acquiring or holding a directory lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock directory {path} is held by a live process and wait budget ({wait_ms}ms) was exhausted")]
    WouldBlock { path: Utf8PathBuf, wait_ms: u64 },

    #[error("failed to create lock directory {path}: {source}")]
    Create {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove lock directory {path}: {source}")]
    Release {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write owner record for {path}: {source}")]
    Owner {
        path: Utf8PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// RAII guard for a held lock directory. Removes the directory
/// (recursively) when dropped.
pub struct DirLockGuard {
    path: Utf8PathBuf,
}

impl DirLockGuard {
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl Drop for DirLockGuard {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_dir_all(self.path.as_std_path()) {
            if e.kind() != io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path, error = %e, "failed to release lock directory");
            }
        }
    }
}

/// Acquire an exclusive lock on `lock_dir`, run `f`, then release.
///
/// Polls on `EEXIST` with a randomized 25-35ms sleep until `wait`
/// elapses. A held directory older than `stale_after` whose owner PID
/// is no longer alive is reaped (removed) and retaken immediately,
/// without consuming the wait budget for that step.
pub fn with_dir_lock<T>(
    lock_dir: &Utf8Path,
    wait: Duration,
    stale_after: Duration,
    f: impl FnOnce() -> T,
) -> Result<T, LockError> {
    let guard = acquire(lock_dir, wait, stale_after)?;
    let result = f();
    drop(guard);
    Ok(result)
}

/// Acquire an exclusive lock on `lock_dir`, returning a guard that
/// releases it on drop. Prefer [`with_dir_lock`] unless the caller needs
/// the lock to outlive a single closure call.
pub fn acquire(
    lock_dir: &Utf8Path,
    wait: Duration,
    stale_after: Duration,
) -> Result<DirLockGuard, LockError> {
    let deadline = Instant::now() + wait;

    loop {
        match std::fs::create_dir(lock_dir.as_std_path()) {
            Ok(()) => {
                let owner = OwnerInfo::for_current_process(Utc::now());
                owner::write_owner(lock_dir, &owner).map_err(|source| LockError::Owner {
                    path: lock_dir.to_path_buf(),
                    source,
                })?;
                return Ok(DirLockGuard {
                    path: lock_dir.to_path_buf(),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                if let Some(age) = dir_age(lock_dir) {
                    let owner_alive = owner::read_owner(lock_dir)
                        .map(|o| liveness::is_process_alive(o.pid))
                        .unwrap_or(true);
                    if age >= stale_after && !owner_alive {
                        match std::fs::remove_dir_all(lock_dir.as_std_path()) {
                            Ok(()) => continue,
                            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                            Err(_) => {
                                // Another waiter may have reaped and retaken it first; fall
                                // through to the normal poll/sleep path.
                            }
                        }
                    }
                }

                if Instant::now() >= deadline {
                    return Err(LockError::WouldBlock {
                        path: lock_dir.to_path_buf(),
                        wait_ms: wait.as_millis() as u64,
                    });
                }
                let jitter_ms = rand::rng().random_range(25..=35);
                std::thread::sleep(Duration::from_millis(jitter_ms));
            }
            Err(e) => {
                return Err(LockError::Create {
                    path: lock_dir.to_path_buf(),
                    source: e,
                });
            }
        }
    }
}

fn dir_age(path: &Utf8Path) -> Option<Duration> {
    let metadata = std::fs::metadata(path.as_std_path()).ok()?;
    let created = metadata.created().or_else(|_| metadata.modified()).ok()?;
    SystemTime::now().duration_since(created).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_dir(dir: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    #[test]
    fn acquire_then_release_allows_reacquire() {
        let dir = TempDir::new().unwrap();
        let lock_path = utf8_dir(&dir).join("run.lock");

        let result = with_dir_lock(&lock_path, Duration::from_secs(1), DEFAULT_STALE_AFTER, || 42);
        assert_eq!(result.unwrap(), 42);
        assert!(!lock_path.as_std_path().exists());

        let result2 = with_dir_lock(&lock_path, Duration::from_secs(1), DEFAULT_STALE_AFTER, || 7);
        assert_eq!(result2.unwrap(), 7);
    }

    #[test]
    fn held_lock_by_live_process_times_out() {
        let dir = TempDir::new().unwrap();
        let lock_path = utf8_dir(&dir).join("run.lock");
        let _held = acquire(&lock_path, Duration::from_secs(1), DEFAULT_STALE_AFTER).unwrap();

        let err = acquire(&lock_path, Duration::from_millis(80), DEFAULT_STALE_AFTER).unwrap_err();
        assert!(matches!(err, LockError::WouldBlock { .. }));
    }

    #[test]
    fn stale_lock_with_dead_owner_is_reaped() {
        let dir = TempDir::new().unwrap();
        let lock_path = utf8_dir(&dir).join("run.lock");
        std::fs::create_dir(lock_path.as_std_path()).unwrap();

        // A pid exceedingly unlikely to be alive, simulating a crashed holder.
        let dead = owner::OwnerInfo {
            version: 1,
            pid: 999_999,
            started_at: Utc::now(),
        };
        owner::write_owner(&lock_path, &dead).unwrap();

        let result = with_dir_lock(&lock_path, Duration::from_secs(1), Duration::from_millis(0), || "ok");
        assert_eq!(result.unwrap(), "ok");
    }

    #[test]
    fn owner_json_records_current_pid() {
        let dir = TempDir::new().unwrap();
        let lock_path = utf8_dir(&dir).join("run.lock");
        let guard = acquire(&lock_path, Duration::from_secs(1), DEFAULT_STALE_AFTER).unwrap();

        let owner = owner::read_owner(guard.path()).unwrap();
        assert_eq!(owner.pid, std::process::id());
        assert_eq!(owner.version, owner::OWNER_SCHEMA_VERSION);
    }
}
