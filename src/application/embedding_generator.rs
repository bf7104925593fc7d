//! Embedding generator (C6): batches chunks through an [`EmbeddingProvider`],
//! optionally summarizing code chunks first.

use crate::domain::error::Result;
use crate::domain::ports::{EmbeddingProvider, Summarizer};
use crate::domain::types::{Chunk, Embedding};
use std::sync::Arc;

/// Reports indexing progress back to the coordinator: `(processed, total,
/// stage)` per spec §4.6.
pub type ProgressCallback<'a> = dyn Fn(usize, usize, &str) + Send + Sync + 'a;

/// Attach `summary` metadata to code chunks via `summarizer`, then embed all
/// chunks in fixed-size batches, reporting progress after each batch.
///
/// Summarization failures attach nothing and never fail the chunk (spec
/// §4.5 step 5); embedding failures propagate after retrying inside the
/// provider (spec §4.6 — retry lives in the HTTP provider adapter, not
/// here, so this function stays a thin batching loop).
pub async fn embed_chunks(
    mut chunks: Vec<Chunk>,
    embedder: &Arc<dyn EmbeddingProvider>,
    summarizer: Option<&Arc<dyn Summarizer>>,
    batch_size: usize,
    generate_summaries: bool,
    on_progress: &ProgressCallback<'_>,
) -> Result<Vec<(Chunk, Embedding)>> {
    if generate_summaries {
        if let Some(summarizer) = summarizer {
            for chunk in chunks.iter_mut() {
                if chunk.metadata.code.symbol_name.is_none() {
                    continue;
                }
                match summarizer.summarize(&chunk.text).await {
                    Ok(Some(summary)) => chunk.metadata.code.summary = Some(summary),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(chunk_id = %chunk.chunk_id, error = %err, "summarization failed, skipping");
                    }
                }
            }
        }
    }

    let total = chunks.len();
    let mut results = Vec::with_capacity(total);
    for (batch_index, batch) in chunks.chunks(batch_size.max(1)).enumerate() {
        let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        for (chunk, embedding) in batch.iter().zip(embeddings) {
            results.push((chunk.clone(), embedding));
        }
        let processed = ((batch_index + 1) * batch_size.max(1)).min(total);
        on_progress(processed, total, "embed");
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::providers::embedding::NullEmbeddingProvider;
    use crate::domain::types::{ChunkKind, ChunkMetadata, SourceType};

    fn chunk(id: &str) -> Chunk {
        Chunk::new(
            "hello world".into(),
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

    #[tokio::test]
    async fn embeds_in_batches_and_reports_progress() {
        let embedder: Arc<dyn EmbeddingProvider> = Arc::new(NullEmbeddingProvider::new(8));
        let chunks = vec![chunk("a"), chunk("b"), chunk("c")];
        let last_processed = std::sync::atomic::AtomicUsize::new(0);
        let results = embed_chunks(chunks, &embedder, None, 2, false, &|processed, total, _stage| {
            assert!(processed <= total);
            last_processed.store(processed, std::sync::atomic::Ordering::SeqCst);
        })
        .await
        .unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(last_processed.load(std::sync::atomic::Ordering::SeqCst), 3);
    }
}
