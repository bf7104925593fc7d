//! AI semantic understanding interface.
//!
//! Defines the business contract for providers that transform text into
//! semantic embeddings. This abstraction lets the engine work with any
//! embedding service — from hosted providers to local models — without the
//! indexing or query code knowing which one is active.

use crate::domain::error::Result;
use crate::domain::types::Embedding;
use async_trait::async_trait;

/// Embeds single queries and batches of chunk text.
///
/// Implementations must return vectors of [`EmbeddingProvider::dimensions`]
/// on every call; a provider that can't guarantee a fixed dimension (e.g. a
/// remote service that silently changed model) should fail loudly rather
/// than return a mismatched vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single piece of text (typically a query).
    async fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Embed a batch of chunk texts. Implementations should prefer a single
    /// batched call to the underlying provider where the API allows it.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>>;

    /// The fixed vector dimension this provider produces.
    fn dimensions(&self) -> usize;

    /// The model identifier recorded on every [`Embedding`] this provider produces.
    fn model_name(&self) -> &str;

    /// Cheap liveness probe; default implementation embeds a short string.
    async fn health_check(&self) -> Result<()> {
        self.embed_query("health check").await?;
        Ok(())
    }
}
