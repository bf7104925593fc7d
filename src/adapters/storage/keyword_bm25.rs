//! BM25 keyword store: the `bm25_index/` leg of C3.
//!
//! The scoring table itself mirrors the classical BM25 formula from spec
//! §4.3 (`k1 = 1.5`, `b = 0.75`); persistence is a single JSON artifact
//! under the project's state directory.

use crate::domain::error::Result;
use crate::domain::ports::keyword_store::ScoredHit;
use crate::domain::ports::KeywordStore;
use crate::domain::types::{Chunk, ChunkMetadata, MetadataFilter};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use tokio::sync::RwLock;

/// `k1`/`b` per spec §4.3; not user-configurable, since the spec pins them.
pub const K1: f32 = 1.5;
pub const B: f32 = 0.75;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedDoc {
    chunk_id: String,
    text: String,
    metadata: ChunkMetadata,
    term_freq: HashMap<String, u32>,
    length: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Index {
    document_freq: HashMap<String, usize>,
    avg_doc_len: f32,
    docs: Vec<IndexedDoc>,
}

pub struct Bm25KeywordStore {
    path: PathBuf,
    index: RwLock<Option<Index>>,
}

impl Bm25KeywordStore {
    pub fn new(directory: impl Into<std::path::PathBuf>) -> Self {
        Self {
            path: directory.into().join("retriever.json"),
            index: RwLock::new(None),
        }
    }

    /// Shared with the chunker's token counter isn't required here — BM25
    /// tokenizes independently since it needs term identity, not just a count.
    pub fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|s| s.len() > 1)
            .map(str::to_string)
            .collect()
    }

    fn score_doc(index: &Index, doc: &IndexedDoc, query_terms: &[String]) -> f32 {
        let total_docs = index.docs.len() as f32;
        let mut score = 0.0;
        for term in query_terms {
            let tf = *doc.term_freq.get(term).unwrap_or(&0) as f32;
            if tf == 0.0 {
                continue;
            }
            let df = *index.document_freq.get(term).unwrap_or(&0) as f32;
            if df == 0.0 {
                continue;
            }
            let idf = if total_docs > 1.0 {
                (1.0 + (total_docs - df + 0.5) / (df + 0.5)).ln()
            } else {
                1.0
            };
            let doc_len = doc.length as f32;
            let tf_norm = (tf * (K1 + 1.0))
                / (tf + K1 * (1.0 - B + B * doc_len / index.avg_doc_len.max(1.0)));
            score += idf * tf_norm;
        }
        score
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
impl KeywordStore for Bm25KeywordStore {
    async fn is_initialized(&self) -> bool {
        self.index.read().await.is_some()
    }

    async fn build(&self, chunks: &[Chunk]) -> Result<()> {
        let mut document_freq: HashMap<String, usize> = HashMap::new();
        let mut docs = Vec::with_capacity(chunks.len());
        let mut total_len = 0usize;

        for chunk in chunks {
            let tokens = Self::tokenize(&chunk.text);
            let length = tokens.len();
            total_len += length;

            let mut term_freq: HashMap<String, u32> = HashMap::new();
            for token in &tokens {
                *term_freq.entry(token.clone()).or_insert(0) += 1;
            }
            for term in term_freq.keys() {
                *document_freq.entry(term.clone()).or_insert(0) += 1;
            }

            docs.push(IndexedDoc {
                chunk_id: chunk.chunk_id.clone(),
                text: chunk.text.clone(),
                metadata: chunk.metadata.clone(),
                term_freq,
                length,
            });
        }

        let avg_doc_len = if docs.is_empty() {
            0.0
        } else {
            total_len as f32 / docs.len() as f32
        };

        let index = Index {
            document_freq,
            avg_doc_len,
            docs,
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&index)?).await?;
        *self.index.write().await = Some(index);
        Ok(())
    }

    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredHit>> {
        let guard = self.index.read().await;
        let Some(index) = guard.as_ref() else {
            return Ok(Vec::new());
        };
        let query_terms: HashSet<String> = Self::tokenize(query).into_iter().collect();
        let query_terms: Vec<String> = query_terms.into_iter().collect();

        // Over-fetch before post-filtering, since BM25 can't filter at score
        // time (spec §4.3).
        let over_fetch = (top_k * 3).max(top_k);
        let mut scored: Vec<ScoredHit> = index
            .docs
            .iter()
            .map(|doc| ScoredHit {
                chunk_id: doc.chunk_id.clone(),
                text: doc.text.clone(),
                score: Self::score_doc(index, doc, &query_terms),
                metadata: doc.metadata.clone(),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(over_fetch);

        if let Some(filter) = filter {
            scored.retain(|hit| filter.matches(&Self::fields_for(&hit.metadata)));
        }
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn reset(&self) -> Result<()> {
        *self.index.write().await = None;
        if self.path.exists() {
            tokio::fs::remove_file(&self.path).await?;
        }
        Ok(())
    }

    async fn load(&self) -> Result<()> {
        if !self.path.exists() {
            return Ok(());
        }
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.is_empty() {
            return Ok(());
        }
        let index: Index = serde_json::from_slice(&bytes)?;
        *self.index.write().await = Some(index);
        Ok(())
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
                source: format!("{id}.md"),
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

    #[tokio::test]
    async fn exact_term_ranks_above_absent_term() {
        let store = Bm25KeywordStore::new(tempfile::tempdir().unwrap().path());
        let chunks = vec![
            chunk("has-it", &"AuthenticationError occurred during login. ".repeat(30)),
            chunk("no-it", &"unrelated text about something else entirely. ".repeat(30)),
        ];
        store.build(&chunks).await.unwrap();
        let hits = store.search("AuthenticationError", 2, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk_id, "has-it");
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn load_restores_a_persisted_index_after_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = Bm25KeywordStore::new(dir.path());
        store
            .build(&[chunk("a", &"AuthenticationError failure. ".repeat(10))])
            .await
            .unwrap();

        let restarted = Bm25KeywordStore::new(dir.path());
        assert!(!restarted.is_initialized().await);
        restarted.load().await.unwrap();
        assert!(restarted.is_initialized().await);
        let hits = restarted.search("AuthenticationError", 1, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn load_is_a_noop_when_nothing_persisted() {
        let store = Bm25KeywordStore::new(tempfile::tempdir().unwrap().path());
        store.load().await.unwrap();
        assert!(!store.is_initialized().await);
    }
}
