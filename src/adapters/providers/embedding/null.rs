//! Deterministic hash-based embedding provider.
//!
//! Used in tests and as a zero-dependency default so the engine is runnable
//! without an external embedding service configured. Not semantically
//! meaningful — it exists to exercise the full pipeline deterministically.

use crate::domain::error::Result;
use crate::domain::ports::EmbeddingProvider;
use crate::domain::types::Embedding;
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// Embeds text by hashing it into a fixed-size pseudo-random unit vector.
#[derive(Debug, Clone)]
pub struct NullEmbeddingProvider {
    dimensions: usize,
}

impl NullEmbeddingProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn hash_to_vector(&self, text: &str) -> Vec<f32> {
        let mut vector = Vec::with_capacity(self.dimensions);
        let mut counter: u32 = 0;
        while vector.len() < self.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(counter.to_le_bytes());
            let digest = hasher.finalize();
            for chunk in digest.chunks(4) {
                if vector.len() >= self.dimensions {
                    break;
                }
                let mut buf = [0u8; 4];
                buf[..chunk.len()].copy_from_slice(chunk);
                let raw = u32::from_le_bytes(buf) as f32 / u32::MAX as f32;
                vector.push(raw * 2.0 - 1.0);
            }
            counter += 1;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        Ok(Embedding {
            vector: self.hash_to_vector(text),
            model: self.model_name().to_string(),
            dimensions: self.dimensions,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        Ok(texts
            .iter()
            .map(|t| Embedding {
                vector: self.hash_to_vector(t),
                model: self.model_name().to_string(),
                dimensions: self.dimensions,
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        "null-hash-embedder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embeddings_are_deterministic_and_normalized() {
        let provider = NullEmbeddingProvider::new(32);
        let a = provider.embed_query("hello world").await.unwrap();
        let b = provider.embed_query("hello world").await.unwrap();
        assert_eq!(a.vector, b.vector);
        let norm: f32 = a.vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn different_text_yields_different_vectors() {
        let provider = NullEmbeddingProvider::new(16);
        let a = provider.embed_query("alpha").await.unwrap();
        let b = provider.embed_query("beta").await.unwrap();
        assert_ne!(a.vector, b.vector);
    }
}
