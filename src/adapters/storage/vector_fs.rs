//! Filesystem-backed vector store: the bundled default so the engine is
//! runnable without wiring in an external vector database (`chroma_db/` in
//! the layout from spec §6 — see [`crate::infrastructure::config`]).
//!
//! Entries live in memory behind a `dashmap` for concurrent reads, and are
//! flushed to a single JSON file on every mutation. Good enough for
//! per-project corpora; a production deployment can swap in a real ANN
//! backend behind the same [`VectorStore`] trait.

use crate::domain::error::{Error, Result};
use crate::domain::ports::vector_store::VectorBackendKind;
use crate::domain::ports::VectorStore;
use crate::domain::types::{Chunk, ChunkMetadata, Embedding, MetadataFilter, SearchResult};
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Entry {
    embedding: Embedding,
    text: String,
    metadata: ChunkMetadata,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OnDisk {
    dimensions: Option<usize>,
    entries: HashMap<String, Entry>,
}

pub struct FilesystemVectorStore {
    path: PathBuf,
    dimensions: RwLock<Option<usize>>,
    entries: DashMap<String, Entry>,
}

impl FilesystemVectorStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            path: directory.into().join("vectors.json"),
            dimensions: RwLock::new(None),
            entries: DashMap::new(),
        }
    }

    async fn flush(&self) -> Result<()> {
        let on_disk = OnDisk {
            dimensions: *self.dimensions.read().unwrap(),
            entries: self
                .entries
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(&on_disk)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }

    fn fields_for(metadata: &ChunkMetadata) -> HashMap<String, String> {
        let mut fields = HashMap::new();
        fields.insert("source".into(), metadata.source.clone());
        fields.insert("source_type".into(), metadata.source_type.as_str().into());
        if let Some(language) = metadata.language {
            fields.insert("language".into(), format!("{language:?}").to_lowercase());
        }
        fields
    }
}

#[async_trait]
impl VectorStore for FilesystemVectorStore {
    async fn init(&self, dimensions: usize) -> Result<()> {
        if self.path.exists() {
            let bytes = tokio::fs::read(&self.path).await?;
            if !bytes.is_empty() {
                let on_disk: OnDisk = serde_json::from_slice(&bytes)?;
                if let Some(existing) = on_disk.dimensions {
                    if existing != dimensions {
                        return Err(Error::DimensionMismatch {
                            expected: existing,
                            actual: dimensions,
                        });
                    }
                }
                for (id, entry) in on_disk.entries {
                    self.entries.insert(id, entry);
                }
            }
        }
        *self.dimensions.write().unwrap() = Some(dimensions);
        self.flush().await
    }

    async fn is_initialized(&self) -> bool {
        self.dimensions.read().unwrap().is_some()
    }

    async fn dimensions(&self) -> Option<usize> {
        *self.dimensions.read().unwrap()
    }

    async fn upsert(&self, batch: Vec<(Chunk, Embedding)>) -> Result<()> {
        let expected = self.dimensions.read().unwrap().ok_or_else(|| {
            Error::internal("upsert called before init")
        })?;
        for (chunk, embedding) in batch {
            if embedding.vector.len() != expected {
                return Err(Error::DimensionMismatch {
                    expected,
                    actual: embedding.vector.len(),
                });
            }
            self.entries.insert(
                chunk.chunk_id.clone(),
                Entry {
                    embedding,
                    text: chunk.text,
                    metadata: chunk.metadata,
                },
            );
        }
        self.flush().await
    }

    async fn search(
        &self,
        query_embedding: &Embedding,
        top_k: usize,
        threshold: f32,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>> {
        let mut scored: Vec<SearchResult> = self
            .entries
            .iter()
            .filter(|entry| {
                filter.is_none_or(|f| f.matches(&Self::fields_for(&entry.value().metadata)))
            })
            .map(|entry| {
                let similarity = query_embedding.cosine_similarity(&entry.value().embedding);
                SearchResult {
                    chunk_id: entry.key().clone(),
                    text: entry.value().text.clone(),
                    score: similarity,
                    metadata: entry.value().metadata.clone(),
                }
            })
            .filter(|r| r.score >= threshold)
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn get(&self, chunk_id: &str) -> Result<Option<SearchResult>> {
        Ok(self.entries.get(chunk_id).map(|entry| SearchResult {
            chunk_id: chunk_id.to_string(),
            text: entry.text.clone(),
            score: 1.0,
            metadata: entry.metadata.clone(),
        }))
    }

    async fn count(&self, filter: Option<&MetadataFilter>) -> Result<usize> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| {
                filter.is_none_or(|f| f.matches(&Self::fields_for(&entry.value().metadata)))
            })
            .count())
    }

    async fn reset(&self) -> Result<()> {
        self.entries.clear();
        let dimensions = *self.dimensions.read().unwrap();
        self.flush().await?;
        *self.dimensions.write().unwrap() = dimensions;
        Ok(())
    }

    fn backend_kind(&self) -> VectorBackendKind {
        VectorBackendKind::Filesystem
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{ChunkKind, SourceType};

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk::new(
            text.to_string(),
            200,
            ChunkMetadata {
                chunk_id: id.into(),
                source: "f.md".into(),
                chunk_index: 0,
                total_chunks: 1,
                source_type: SourceType::Doc,
                language: None,
                code: Default::default(),
                prose: Default::default(),
            },
            ChunkKind::Text,
        )
        .unwrap()
    }

    fn embedding(v: Vec<f32>) -> Embedding {
        let dims = v.len();
        Embedding {
            vector: v,
            model: "test".into(),
            dimensions: dims,
        }
    }

    #[tokio::test]
    async fn dimension_mismatch_on_reinit() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemVectorStore::new(dir.path());
        store.init(4).await.unwrap();
        store
            .upsert(vec![(chunk("a", "hello"), embedding(vec![1.0, 0.0, 0.0, 0.0]))])
            .await
            .unwrap();

        let store2 = FilesystemVectorStore::new(dir.path());
        let err = store2.init(8).await.unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn search_respects_threshold_and_top_k() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemVectorStore::new(dir.path());
        store.init(2).await.unwrap();
        store
            .upsert(vec![
                (chunk("a", "a"), embedding(vec![1.0, 0.0])),
                (chunk("b", "b"), embedding(vec![0.0, 1.0])),
            ])
            .await
            .unwrap();
        let results = store
            .search(&embedding(vec![1.0, 0.0]), 5, 0.5, None)
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk_id, "a");
        for r in &results {
            assert!((0.0..=1.0).contains(&r.score));
        }
    }
}
