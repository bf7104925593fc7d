//! Keyword (BM25) storage manager contract (C3, keyword side).

use crate::domain::error::Result;
use crate::domain::types::{Chunk, MetadataFilter};
use async_trait::async_trait;

/// A single BM25-scored hit, prior to metadata filtering.
#[derive(Debug, Clone)]
pub struct ScoredHit {
    pub chunk_id: String,
    pub text: String,
    pub score: f32,
    pub metadata: crate::domain::types::ChunkMetadata,
}

/// An inverted-index-style retriever over tokenized chunk text: the
/// "keyword" leg of C3.
///
/// Because BM25 cannot filter at score time, implementations must over-fetch
/// (`max(3 * top_k, explicit_limit)`) before applying `filter` — see spec
/// §4.3.
#[async_trait]
pub trait KeywordStore: Send + Sync {
    /// Whether `build` has been called (successfully) since the last `reset`.
    async fn is_initialized(&self) -> bool;

    /// Tokenize, compute per-term document frequencies and the
    /// length-normalized BM25 table, and persist to disk. Replaces any prior
    /// index.
    async fn build(&self, chunks: &[Chunk]) -> Result<()>;

    /// Score `query` against the index with BM25 (`k1 = 1.5`, `b = 0.75`),
    /// over-fetching before applying `filter`.
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<ScoredHit>>;

    /// Delete the persisted index.
    async fn reset(&self) -> Result<()>;

    /// Load a persisted index from disk, if one exists, so queries against
    /// an already-indexed project work immediately after a restart (spec
    /// §4.2 step 3: "open (or create)"). A no-op, not an error, when no
    /// persisted index is present.
    async fn load(&self) -> Result<()>;
}
