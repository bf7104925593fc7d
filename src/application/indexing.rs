//! Indexing coordinator (C8): drives the pipeline as a single in-flight
//! background job, publishes progress, and owns [`IndexingState`].

use crate::adapters::graph_extractor;
use crate::application::{document_loader, embedding_generator};
use crate::domain::chunking::{self, ChunkConfig};
use crate::domain::error::{Error, Result};
use crate::domain::ports::{EmbeddingProvider, GraphStore, KeywordStore, Summarizer, TripleExtractor, VectorStore};
use crate::domain::types::{Chunk, IndexingState, IndexingStatus};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Knobs read from [`crate::infrastructure::config::types::AgentBrainConfig`]
/// that the coordinator needs at indexing time.
#[derive(Debug, Clone)]
pub struct IndexingSettings {
    pub chunk_config: ChunkConfig,
    pub embedding_batch_size: usize,
    pub vector_write_batch_size: usize,
    pub generate_summaries: bool,
    pub enable_graph_index: bool,
    pub graph_max_triplets_per_chunk: usize,
}

/// Request fields recognized by `POST /index` and `POST /index/add`
/// (spec §4.10).
#[derive(Debug, Clone)]
pub struct StartIndexingRequest {
    pub folder_path: PathBuf,
    pub recursive: bool,
    pub include_code: bool,
    pub reset_first: bool,
    /// Per-request override of the configured `chunk_size`, if supplied.
    pub chunk_size: Option<usize>,
    /// Per-request override of the configured `chunk_overlap`, if supplied.
    pub chunk_overlap: Option<usize>,
}

/// Drives the single in-flight indexing job. Construct once per daemon and
/// share behind an `Arc` — `start_indexing` is safe to call concurrently;
/// only one job proceeds, the rest get `AlreadyIndexing`.
pub struct IndexingCoordinator {
    vector_store: Arc<dyn VectorStore>,
    keyword_store: Arc<dyn KeywordStore>,
    graph_store: Arc<dyn GraphStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    summarizer: Option<Arc<dyn Summarizer>>,
    triple_extractor: Option<Arc<dyn TripleExtractor>>,
    settings: IndexingSettings,
    state: Arc<RwLock<IndexingState>>,
    cancellation: Arc<RwLock<Option<CancellationToken>>>,
}

impl IndexingCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        keyword_store: Arc<dyn KeywordStore>,
        graph_store: Arc<dyn GraphStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        summarizer: Option<Arc<dyn Summarizer>>,
        triple_extractor: Option<Arc<dyn TripleExtractor>>,
        settings: IndexingSettings,
    ) -> Self {
        Self {
            vector_store,
            keyword_store,
            graph_store,
            embedder,
            summarizer,
            triple_extractor,
            settings,
            state: Arc::new(RwLock::new(IndexingState::default())),
            cancellation: Arc::new(RwLock::new(None)),
        }
    }

    /// Current [`IndexingState`] snapshot; read by C10 and the query engine's
    /// readiness gate.
    pub async fn get_status(&self) -> IndexingState {
        self.state.read().await.clone()
    }

    /// Start an indexing job. Returns the new job's id immediately; the
    /// pipeline runs on a spawned task (spec §4.8: "The call returns before
    /// any real work is done").
    pub async fn start_indexing(self: &Arc<Self>, request: StartIndexingRequest) -> Result<String> {
        {
            let mut state = self.state.write().await;
            if state.is_indexing {
                return Err(Error::AlreadyIndexing {
                    job_id: state.current_job_id.clone().unwrap_or_default(),
                });
            }
            let job_id = Uuid::new_v4().to_string();
            state.current_job_id = Some(job_id.clone());
            state.status = IndexingStatus::Indexing;
            state.is_indexing = true;
            state.folder_path = Some(request.folder_path.display().to_string());
            state.total_documents = 0;
            state.processed_documents = 0;
            state.total_chunks = 0;
            state.total_doc_chunks = 0;
            state.total_code_chunks = 0;
            state.progress_percent = 0;
            state.started_at = Some(chrono::Utc::now());
            state.completed_at = None;
            state.error = None;
        }

        let token = CancellationToken::new();
        *self.cancellation.write().await = Some(token.clone());

        let coordinator = Arc::clone(self);
        tokio::spawn(async move {
            let result = coordinator.run_pipeline(request, token).await;
            let mut state = coordinator.state.write().await;
            state.is_indexing = false;
            state.completed_at = Some(chrono::Utc::now());
            match result {
                Ok(()) => {
                    state.status = IndexingStatus::Completed;
                    state.progress_percent = 100;
                }
                Err(err) => {
                    state.status = IndexingStatus::Failed;
                    state.error = Some(err.to_string());
                }
            }
        });

        Ok(self
            .state
            .read()
            .await
            .current_job_id
            .clone()
            .unwrap_or_default())
    }

    /// Reset all three stores and the state counters. Refuses to run while
    /// a job is in flight (spec §4.8).
    pub async fn reset(&self) -> Result<()> {
        if self.state.read().await.is_indexing {
            return Err(Error::AlreadyIndexing {
                job_id: self
                    .state
                    .read()
                    .await
                    .current_job_id
                    .clone()
                    .unwrap_or_default(),
            });
        }
        self.vector_store.reset().await?;
        self.keyword_store.reset().await?;
        self.graph_store.clear().await?;
        *self.state.write().await = IndexingState::default();
        Ok(())
    }

    async fn run_pipeline(
        &self,
        request: StartIndexingRequest,
        token: CancellationToken,
    ) -> Result<()> {
        if request.reset_first {
            self.vector_store.reset().await?;
            self.keyword_store.reset().await?;
            self.graph_store.clear().await?;
        }

        // Stage 1: load (0-20%)
        let documents = document_loader::load_documents(&request.folder_path, request.recursive);
        {
            let mut state = self.state.write().await;
            state.total_documents = documents.len();
            state.progress_percent = 20;
        }
        if token.is_cancelled() {
            return Ok(());
        }

        // Stage 2: chunk (20-50%), docs then code, grouped implicitly by
        // iterating the documents in discovery order.
        let mut effective_chunk_config = self.settings.chunk_config.clone();
        if let Some(chunk_size) = request.chunk_size {
            effective_chunk_config.chunk_size = chunk_size;
        }
        if let Some(chunk_overlap) = request.chunk_overlap {
            effective_chunk_config.chunk_overlap = chunk_overlap;
        }

        let mut all_chunks: Vec<Chunk> = Vec::new();
        let mut languages_seen = std::collections::BTreeSet::new();
        for (index, document) in documents.iter().enumerate() {
            if !request.include_code && document.source_type != crate::domain::types::SourceType::Doc
            {
                continue;
            }
            if let Some(language) = document.language {
                languages_seen.insert(format!("{language:?}").to_lowercase());
            }
            match chunking::chunk_document(document, &effective_chunk_config) {
                Ok(chunks) => all_chunks.extend(chunks),
                Err(err) => {
                    tracing::warn!(source = %document.source, error = %err, "chunking failed, skipping file");
                }
            }
            let mut state = self.state.write().await;
            state.processed_documents = index + 1;
            state.progress_percent = 20 + (30 * (index + 1) / documents.len().max(1)) as u8;
        }
        {
            let mut state = self.state.write().await;
            state.total_chunks = all_chunks.len();
            state.total_doc_chunks = all_chunks
                .iter()
                .filter(|c| c.metadata.source_type == crate::domain::types::SourceType::Doc)
                .count();
            state.total_code_chunks = state.total_chunks - state.total_doc_chunks;
            state.supported_languages = languages_seen;
            state.indexed_folders.insert(request.folder_path.display().to_string());
            state.progress_percent = 50;
        }
        if token.is_cancelled() || all_chunks.is_empty() {
            return Ok(());
        }

        // Stage 3: embed (50-90%)
        let state_handle = &self.state;
        let embedded = embedding_generator::embed_chunks(
            all_chunks,
            &self.embedder,
            self.summarizer.as_ref(),
            self.settings.embedding_batch_size,
            self.settings.generate_summaries,
            &|processed, total, _stage| {
                let percent = 50 + (40 * processed / total.max(1)) as u8;
                if let Ok(mut state) = state_handle.try_write() {
                    state.progress_percent = percent;
                }
            },
        )
        .await?;
        if token.is_cancelled() {
            return Ok(());
        }

        // Stage 4: vector upsert (90-95%)
        if !self.vector_store.is_initialized().await {
            self.vector_store.init(self.embedder.dimensions()).await?;
        }
        for batch in embedded.chunks(self.settings.vector_write_batch_size.max(1)) {
            self.vector_store.upsert(batch.to_vec()).await?;
        }
        self.state.write().await.progress_percent = 95;

        // Stage 5: keyword build (95-97%)
        let chunks_only: Vec<Chunk> = embedded.iter().map(|(c, _)| c.clone()).collect();
        self.keyword_store.build(&chunks_only).await?;
        self.state.write().await.progress_percent = 97;

        // Stage 6: graph build (97-100%, conditional)
        if self.settings.enable_graph_index {
            for chunk in &chunks_only {
                let triples = graph_extractor::extract(
                    chunk,
                    self.triple_extractor.as_ref(),
                    self.settings.graph_max_triplets_per_chunk,
                )
                .await;
                for triple in triples {
                    self.graph_store.add(triple).await?;
                }
            }
            self.graph_store.persist().await?;
        }
        self.state.write().await.progress_percent = 100;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::embedding::NullEmbeddingProvider;
    use crate::adapters::storage::{Bm25KeywordStore, FilesystemGraphStore, FilesystemVectorStore};

    fn settings() -> IndexingSettings {
        IndexingSettings {
            chunk_config: ChunkConfig::default(),
            embedding_batch_size: 10,
            vector_write_batch_size: 1000,
            generate_summaries: false,
            enable_graph_index: false,
            graph_max_triplets_per_chunk: 5,
        }
    }

    fn coordinator(dir: &std::path::Path) -> Arc<IndexingCoordinator> {
        Arc::new(IndexingCoordinator::new(
            Arc::new(FilesystemVectorStore::new(dir)),
            Arc::new(Bm25KeywordStore::new(dir)),
            Arc::new(FilesystemGraphStore::new(dir)),
            Arc::new(NullEmbeddingProvider::new(8)),
            None,
            None,
            settings(),
        ))
    }

    #[tokio::test]
    async fn concurrent_start_indexing_is_rejected() {
        let state_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        std::fs::write(project_dir.path().join("a.md"), "hello world ".repeat(50)).unwrap();

        let coordinator = coordinator(state_dir.path());
        let request = StartIndexingRequest {
            folder_path: project_dir.path().to_path_buf(),
            recursive: true,
            include_code: true,
            reset_first: false,
            chunk_size: None,
            chunk_overlap: None,
        };
        coordinator.start_indexing(request.clone()).await.unwrap();
        let second = coordinator.start_indexing(request).await;
        assert!(matches!(second, Err(Error::AlreadyIndexing { .. })));
    }

    #[tokio::test]
    async fn empty_folder_completes_with_zero_counters() {
        let state_dir = tempfile::tempdir().unwrap();
        let project_dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator(state_dir.path());
        let request = StartIndexingRequest {
            folder_path: project_dir.path().to_path_buf(),
            recursive: true,
            include_code: true,
            reset_first: false,
            chunk_size: None,
            chunk_overlap: None,
        };
        coordinator.start_indexing(request).await.unwrap();
        for _ in 0..50 {
            if !coordinator.get_status().await.is_indexing {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        let status = coordinator.get_status().await;
        assert_eq!(status.status, IndexingStatus::Completed);
        assert_eq!(status.total_chunks, 0);
    }
}
