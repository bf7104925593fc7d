//! JSON-backed append-only graph triplet store: the `graph_index/` leg of
//! C3. The reference vector backend ships an embedded graph database
//! (`kuzu_db/` in spec §6); this adapter is the always-available fallback
//! behind the same [`GraphStore`] contract, following the same
//! load-on-init/flush-on-mutate shape as [`super::vector_fs::FilesystemVectorStore`].

use crate::domain::error::Result;
use crate::domain::ports::GraphStore;
use crate::domain::types::GraphTriple;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::RwLock;

#[derive(Debug, Default, Serialize, Deserialize)]
struct OnDisk {
    triples: Vec<GraphTriple>,
}

pub struct FilesystemGraphStore {
    path: PathBuf,
    triples: RwLock<Vec<GraphTriple>>,
    loaded: RwLock<bool>,
}

impl FilesystemGraphStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            path: directory.into().join("graph_store.json"),
            triples: RwLock::new(Vec::new()),
            loaded: RwLock::new(false),
        }
    }
}

#[async_trait]
impl GraphStore for FilesystemGraphStore {
    async fn is_initialized(&self) -> bool {
        *self.loaded.read().await
    }

    async fn add(&self, triplet: GraphTriple) -> Result<()> {
        self.triples.write().await.push(triplet);
        Ok(())
    }

    async fn triplets_for(&self, entity: &str) -> Result<Vec<GraphTriple>> {
        let needle = entity.to_lowercase();
        Ok(self
            .triples
            .read()
            .await
            .iter()
            .filter(|t| {
                t.subject.to_lowercase().contains(&needle) || t.object.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let on_disk = OnDisk {
            triples: self.triples.read().await.clone(),
        };
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&on_disk)?).await?;
        *self.loaded.write().await = true;
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        if self.path.exists() {
            let bytes = tokio::fs::read(&self.path).await?;
            if !bytes.is_empty() {
                let on_disk: OnDisk = serde_json::from_slice(&bytes)?;
                *self.triples.write().await = on_disk.triples;
            }
        }
        *self.loaded.write().await = true;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.triples.write().await.clear();
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await?;
        }
        Ok(())
    }

    async fn counts(&self) -> Result<(usize, usize)> {
        let triples = self.triples.read().await;
        let mut entities = HashSet::new();
        for t in triples.iter() {
            entities.insert(t.subject.to_lowercase());
            entities.insert(t.object.to_lowercase());
        }
        Ok((entities.len(), triples.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(subject: &str, predicate: &str, object: &str) -> GraphTriple {
        GraphTriple {
            subject: subject.into(),
            subject_type: None,
            predicate: predicate.into(),
            object: object.into(),
            object_type: None,
            source_chunk_id: "c1".into(),
        }
    }

    #[tokio::test]
    async fn entity_match_is_case_insensitive_substring() {
        let store = FilesystemGraphStore::new(tempfile::tempdir().unwrap().path());
        store.add(triple("AuthService", "calls", "Database")).await.unwrap();
        let hits = store.triplets_for("authservice").await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn persist_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemGraphStore::new(dir.path());
        store.add(triple("A", "defined_in", "a.rs")).await.unwrap();
        store.persist().await.unwrap();

        let reloaded = FilesystemGraphStore::new(dir.path());
        reloaded.load().await.unwrap();
        let (entities, relationships) = reloaded.counts().await.unwrap();
        assert_eq!(relationships, 1);
        assert_eq!(entities, 2);
    }

    #[tokio::test]
    async fn clear_removes_persisted_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilesystemGraphStore::new(dir.path());
        store.add(triple("A", "p", "B")).await.unwrap();
        store.persist().await.unwrap();
        store.clear().await.unwrap();
        let (entities, relationships) = store.counts().await.unwrap();
        assert_eq!((entities, relationships), (0, 0));
    }
}
