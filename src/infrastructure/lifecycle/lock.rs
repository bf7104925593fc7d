//! Single-instance lock protocol (spec §4.2 step 1).
//!
//! `lock.json` is held for the lifetime of the process. A crashed daemon
//! leaves it behind; the next startup must recognize the stale pid and
//! remove it before acquiring a fresh lock (spec §8, scenario 1).

use crate::domain::error::{Error, Result};
use crate::domain::types::LockRecord;
use std::io::Write;
use std::path::{Path, PathBuf};
use sysinfo::{Pid, System};

/// Holds `lock.json` for the process lifetime. Dropping it without calling
/// [`LockGuard::release`] is a safety net for tests; production shutdown
/// should call `release` explicitly so the removal is logged.
pub struct LockGuard {
    path: PathBuf,
    released: bool,
}

impl LockGuard {
    /// Acquire the lock at `state_dir/lock.json`, recognizing and clearing a
    /// stale lock from a crashed prior process (spec §4.2 step 1).
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir)?;
        let path = state_dir.join("lock.json");

        if let Some(existing) = read_lock(&path)? {
            if is_pid_alive(existing.pid) {
                return Err(Error::AlreadyRunning { pid: existing.pid });
            }
            tracing::warn!(pid = existing.pid, "removing stale lock from a crashed instance");
            std::fs::remove_file(&path)?;
        }

        let record = LockRecord {
            pid: std::process::id(),
            created_at: chrono::Utc::now(),
        };
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| Error::config(format!("failed to acquire lock at {path:?}: {e}")))?;
        file.write_all(&serde_json::to_vec_pretty(&record)?)?;

        Ok(Self {
            path,
            released: false,
        })
    }

    /// Release the lock: delete `lock.json`. Idempotent.
    pub fn release(&mut self) -> Result<()> {
        if !self.released {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            self.released = true;
        }
        Ok(())
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = self.release();
    }
}

fn read_lock(path: &Path) -> Result<Option<LockRecord>> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_slice(&bytes)?))
}

fn is_pid_alive(pid: u32) -> bool {
    let mut system = System::new();
    system.refresh_processes(
        sysinfo::ProcessesToUpdate::Some(&[Pid::from_u32(pid)]),
        true,
    );
    system.process(Pid::from_u32(pid)).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let mut guard = LockGuard::acquire(dir.path()).unwrap();
        assert!(dir.path().join("lock.json").exists());
        guard.release().unwrap();
        assert!(!dir.path().join("lock.json").exists());
    }

    #[test]
    fn second_acquire_fails_while_first_lives() {
        let dir = tempfile::tempdir().unwrap();
        let _first = LockGuard::acquire(dir.path()).unwrap();
        let err = LockGuard::acquire(dir.path()).unwrap_err();
        assert!(matches!(err, Error::AlreadyRunning { .. }));
    }

    #[test]
    fn stale_lock_from_dead_pid_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let record = LockRecord {
            pid: 999_999, // practically guaranteed not to be a live pid
            created_at: chrono::Utc::now(),
        };
        std::fs::write(dir.path().join("lock.json"), serde_json::to_vec(&record).unwrap()).unwrap();
        let guard = LockGuard::acquire(dir.path()).unwrap();
        let record: LockRecord = serde_json::from_slice(&std::fs::read(&guard.path).unwrap()).unwrap();
        assert_eq!(record.pid, std::process::id());
    }

    #[test]
    fn drop_without_explicit_release_still_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _guard = LockGuard::acquire(dir.path()).unwrap();
            assert!(dir.path().join("lock.json").exists());
        }
        assert!(!dir.path().join("lock.json").exists());
    }
}
