//! Vector storage manager contract (C3, vector side).

use crate::domain::error::Result;
use crate::domain::types::{Chunk, Embedding, MetadataFilter, SearchResult};
use async_trait::async_trait;

/// Which concrete backend a [`VectorStore`] implementation is. Queried by the
/// query engine to decide whether graph mode (which the spec flags as
/// backend-specific) is available — see `SPEC_FULL.md` §2 and spec §9's open
/// question on backend capability probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackendKind {
    /// The bundled filesystem-backed store; graph-capable.
    Filesystem,
    /// An in-memory store used in tests; graph-capable.
    Memory,
    /// Any other backend wired in through configuration; treated as not
    /// graph-capable unless proven otherwise.
    Other,
}

/// An embedding-keyed store of chunks: the "vector" leg of C3.
///
/// All three storage managers (`VectorStore`, [`crate::domain::ports::KeywordStore`],
/// [`crate::domain::ports::GraphStore`]) serialize mutations with an
/// exclusive lock internally; readers may proceed concurrently with each
/// other but not with a write (spec §5).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the collection if it doesn't exist, fixing its dimension.
    async fn init(&self, dimensions: usize) -> Result<()>;

    /// Whether `init` has run (successfully) for this store instance.
    async fn is_initialized(&self) -> bool;

    /// The dimension fixed at `init`, if initialized.
    async fn dimensions(&self) -> Option<usize>;

    /// Write or replace entries by `chunk_id`. Callers are expected to chunk
    /// large batches themselves (reference bound: 40000 per call).
    async fn upsert(&self, batch: Vec<(Chunk, Embedding)>) -> Result<()>;

    /// Highest-similarity search. `similarity = 1 - cosine_distance`; hits
    /// below `threshold` are dropped; `filter` is applied post-retrieval.
    async fn search(
        &self,
        query_embedding: &Embedding,
        top_k: usize,
        threshold: f32,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>>;

    /// Fetch a single chunk's text/metadata by id, if present.
    async fn get(&self, chunk_id: &str) -> Result<Option<SearchResult>>;

    /// Count entries matching an optional filter.
    async fn count(&self, filter: Option<&MetadataFilter>) -> Result<usize>;

    /// Drop and recreate the collection. Must succeed even over partial
    /// state left by a crashed prior run.
    async fn reset(&self) -> Result<()>;

    /// Which concrete backend this is, for capability probing.
    fn backend_kind(&self) -> VectorBackendKind;
}
