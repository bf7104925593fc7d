//! Lifecycle & runtime handshake (C2): single-instance lock, port
//! allocation, runtime advertisement, graceful shutdown (spec §4.2).

pub mod lock;
pub mod port;
pub mod runtime;

use crate::application::IndexingCoordinator;
use crate::domain::error::Result;
use crate::domain::types::RuntimeMode;
use lock::LockGuard;
use runtime::RuntimeHandle;
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use lock::LockGuard as Lock;
pub use runtime::RuntimeHandle as Runtime;

/// Everything acquired during startup that must be torn down in reverse
/// order on shutdown: the lock outlives the runtime advertisement, which
/// outlives the bound listener.
pub struct Daemon {
    pub listener: TcpListener,
    pub bind_host: String,
    pub port: u16,
    lock: LockGuard,
    runtime: RuntimeHandle,
    state_dir: PathBuf,
}

impl Daemon {
    /// Run spec §4.2 steps 1-2: acquire the lock, then bind a port. Step 3
    /// (store init) and step 4 (publish) are driven by the caller once the
    /// stores are ready, via [`Daemon::publish`].
    pub fn start(
        state_dir: &Path,
        bind_host: &str,
        explicit_port: Option<u16>,
        port_range_start: u16,
        port_range_end: u16,
    ) -> Result<Self> {
        let lock = LockGuard::acquire(state_dir)?;
        let listener = port::allocate(explicit_port, bind_host, port_range_start, port_range_end)?;
        let port = listener.local_addr()?.port();
        Ok(Self {
            listener,
            bind_host: bind_host.to_string(),
            port,
            lock,
            runtime: RuntimeHandle::new(state_dir),
            state_dir: state_dir.to_path_buf(),
        })
    }

    /// Spec §4.2 step 4: write `runtime.json` once the stores are open and
    /// the HTTP listener is about to start serving.
    pub fn publish(&mut self, mode: RuntimeMode, project_root: &str) -> Result<crate::domain::types::RuntimeRecord> {
        self.runtime.publish(mode, project_root, &self.bind_host, self.port)
    }

    /// Spec §4.2 step 6: refuse new writes (the caller stops routing new
    /// index requests before calling this), wait for any in-flight indexing
    /// job up to `shutdown_timeout_s`, then retract the runtime record and
    /// release the lock. Partial state from a forcibly-terminated job is
    /// tolerated — the next startup will see stale counters.
    pub async fn shutdown(
        mut self,
        coordinator: &Arc<IndexingCoordinator>,
        shutdown_timeout_s: u64,
    ) -> Result<()> {
        let timeout = Duration::from_secs(shutdown_timeout_s);
        tracing::info!(timeout = %humantime::format_duration(timeout), "shutting down");
        let deadline = tokio::time::Instant::now() + timeout;
        while coordinator.get_status().await.is_indexing {
            if tokio::time::Instant::now() >= deadline {
                tracing::warn!(
                    waited = %humantime::format_duration(timeout),
                    "shutdown timeout reached with an indexing job still in flight"
                );
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        self.runtime.retract()?;
        self.lock.release()?;
        Ok(())
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::embedding::NullEmbeddingProvider;
    use crate::adapters::storage::{Bm25KeywordStore, FilesystemGraphStore, FilesystemVectorStore};
    use crate::application::indexing::IndexingSettings;
    use crate::domain::chunking::ChunkConfig;

    fn coordinator(dir: &Path) -> Arc<IndexingCoordinator> {
        Arc::new(IndexingCoordinator::new(
            Arc::new(FilesystemVectorStore::new(dir)),
            Arc::new(Bm25KeywordStore::new(dir)),
            Arc::new(FilesystemGraphStore::new(dir)),
            Arc::new(NullEmbeddingProvider::new(8)),
            None,
            None,
            IndexingSettings {
                chunk_config: ChunkConfig::default(),
                embedding_batch_size: 10,
                vector_write_batch_size: 1000,
                generate_summaries: false,
                enable_graph_index: false,
                graph_max_triplets_per_chunk: 5,
            },
        ))
    }

    #[tokio::test]
    async fn start_publish_shutdown_round_trips_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut daemon = Daemon::start(dir.path(), "127.0.0.1", None, 18100, 18110).unwrap();
        daemon.publish(RuntimeMode::Project, "/p").unwrap();
        assert!(dir.path().join("runtime.json").exists());
        assert!(dir.path().join("lock.json").exists());

        let coordinator = coordinator(dir.path());
        daemon.shutdown(&coordinator, 5).await.unwrap();
        assert!(!dir.path().join("runtime.json").exists());
        assert!(!dir.path().join("lock.json").exists());
    }
}
