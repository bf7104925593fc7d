//! Graph triplet storage manager contract (C3, graph side).

use crate::domain::error::Result;
use crate::domain::types::GraphTriple;
use async_trait::async_trait;

/// Stores [`GraphTriple`]s under a pluggable backend: the "graph" leg of C3.
///
/// Entity matching in [`GraphStore::triplets_for`] is case-insensitive
/// substring match per spec §4.3. The store is append-only between resets —
/// there is no delete-by-id (see spec §1 non-goals).
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Whether the store has any persisted state loaded.
    async fn is_initialized(&self) -> bool;

    /// Append a single triplet.
    async fn add(&self, triplet: GraphTriple) -> Result<()>;

    /// Case-insensitive substring match against subject or object.
    async fn triplets_for(&self, entity: &str) -> Result<Vec<GraphTriple>>;

    /// Flush in-memory state to disk.
    async fn persist(&self) -> Result<()>;

    /// Load persisted state from disk, replacing in-memory state.
    async fn load(&self) -> Result<()>;

    /// Drop all triplets.
    async fn clear(&self) -> Result<()>;

    /// `(entity_count, relationship_count)` — entities are the distinct set
    /// of subjects and objects; relationships are the stored triplets.
    async fn counts(&self) -> Result<(usize, usize)>;
}
