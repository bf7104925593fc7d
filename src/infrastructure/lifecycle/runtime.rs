//! Runtime advertisement (spec §4.2 step 4). `runtime.json` lives from
//! "ready" to "shutdown" and is how clients discover a running daemon.

use crate::domain::error::Result;
use crate::domain::types::{RuntimeMode, RuntimeRecord};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Bumped whenever the on-disk shape of `runtime.json` changes in a way
/// older daemons/clients cannot tolerate (spec §9: "File-format
/// compatibility").
pub const SCHEMA_VERSION: &str = "1.0";

pub struct RuntimeHandle {
    path: PathBuf,
    published: bool,
}

impl RuntimeHandle {
    pub fn new(state_dir: &Path) -> Self {
        Self {
            path: state_dir.join("runtime.json"),
            published: false,
        }
    }

    /// Write `runtime.json`, advertising readiness to serve requests.
    pub fn publish(
        &mut self,
        mode: RuntimeMode,
        project_root: &str,
        bind_host: &str,
        port: u16,
    ) -> Result<RuntimeRecord> {
        let record = RuntimeRecord {
            schema_version: SCHEMA_VERSION.to_string(),
            mode,
            project_root: project_root.to_string(),
            instance_id: Uuid::new_v4().to_string(),
            base_url: format!("http://{bind_host}:{port}"),
            bind_host: bind_host.to_string(),
            port,
            pid: std::process::id(),
            started_at: chrono::Utc::now(),
        };
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_vec_pretty(&record)?)?;
        self.published = true;
        Ok(record)
    }

    /// Remove `runtime.json` on clean shutdown (spec §4.2 step 6).
    pub fn retract(&mut self) -> Result<()> {
        if self.published && self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        self.published = false;
        Ok(())
    }

    /// Read a peer daemon's advertisement, if present, for client discovery.
    pub fn read(state_dir: &Path) -> Result<Option<RuntimeRecord>> {
        let path = state_dir.join("runtime.json");
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        if bytes.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }
}

impl Drop for RuntimeHandle {
    fn drop(&mut self) {
        let _ = self.retract();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_then_retract_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut handle = RuntimeHandle::new(dir.path());
        let record = handle.publish(RuntimeMode::Project, "/p", "127.0.0.1", 8712).unwrap();
        assert_eq!(record.port, 8712);
        assert!(dir.path().join("runtime.json").exists());

        let read_back = RuntimeHandle::read(dir.path()).unwrap().unwrap();
        assert_eq!(read_back.instance_id, record.instance_id);

        handle.retract().unwrap();
        assert!(!dir.path().join("runtime.json").exists());
    }
}
