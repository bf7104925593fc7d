//! Generic HTTP embedding provider.
//!
//! Speaks a minimal JSON contract (`POST {endpoint} {"input": [...]} ->
//! {"embeddings": [[f32, ...], ...]}`) so any OpenAI-compatible or
//! self-hosted embedding server can be wired in through configuration
//! without a dedicated adapter per vendor (spec §1 treats concrete
//! providers as external collaborators).

use crate::domain::error::{Error, Result};
use crate::domain::ports::EmbeddingProvider;
use crate::domain::types::Embedding;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Calls an HTTP embedding endpoint with retry-with-backoff on transient
/// failures (spec §4.6: "at least three attempts").
pub struct HttpEmbeddingProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    max_retries: u32,
}

impl HttpEmbeddingProvider {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            dimensions,
            max_retries: 3,
        }
    }

    async fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = self
                .client
                .post(&self.endpoint)
                .json(&EmbedRequest {
                    input: texts,
                    model: &self.model,
                })
                .send()
                .await
                .and_then(|r| r.error_for_status())
                .map_err(|e| Error::embedding(e.to_string()));

            match result {
                Ok(response) => {
                    let parsed: EmbedResponse = response
                        .json()
                        .await
                        .map_err(|e| Error::embedding(format!("invalid response body: {e}")))?;
                    for vector in &parsed.embeddings {
                        if vector.len() != self.dimensions {
                            return Err(Error::DimensionMismatch {
                                expected: self.dimensions,
                                actual: vector.len(),
                            });
                        }
                    }
                    return Ok(parsed.embeddings);
                }
                Err(err) if attempt < self.max_retries => {
                    tracing::warn!(attempt, error = %err, "embedding request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(200 * 2u64.pow(attempt))).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed_query(&self, text: &str) -> Result<Embedding> {
        let mut vectors = self.embed_with_retry(std::slice::from_ref(&text.to_string())).await?;
        let vector = vectors
            .pop()
            .ok_or_else(|| Error::embedding("provider returned zero embeddings"))?;
        Ok(Embedding {
            vector,
            model: self.model.clone(),
            dimensions: self.dimensions,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>> {
        let vectors = self.embed_with_retry(texts).await?;
        Ok(vectors
            .into_iter()
            .map(|vector| Embedding {
                vector,
                model: self.model.clone(),
                dimensions: self.dimensions,
            })
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
