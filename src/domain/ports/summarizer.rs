//! Optional code-summarization and graph-triple-extraction interfaces.
//!
//! Both are "Summarizer-class" providers in the sense of spec §4.7: a single
//! backing LLM-style service can implement either or both. Failures from
//! either contract are always non-fatal to the pipeline — the caller treats
//! `Ok(None)` / `Ok(vec![])` and `Err` the same way (skip and move on).

use crate::domain::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Hints passed alongside chunk text to a [`TripleExtractor`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionHint {
    pub language: Option<String>,
    pub source: Option<String>,
}

/// A single extracted fact, prior to `source_chunk_id` attachment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedTriple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
    #[serde(default)]
    pub subject_type: Option<String>,
    #[serde(default)]
    pub object_type: Option<String>,
}

/// Produces a short summary of a code chunk, attached to chunk metadata when
/// `generate_summaries` is enabled.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarize a piece of code or text. `Ok(None)` means "nothing useful
    /// to say"; callers treat it the same as an error — attach nothing.
    async fn summarize(&self, text: &str) -> Result<Option<String>>;
}

/// Optional LLM-backed graph-triple extractor used by C7 alongside the
/// deterministic code-metadata extractor.
#[async_trait]
pub trait TripleExtractor: Send + Sync {
    /// Extract `(subject, predicate, object)` candidates from chunk text.
    /// Implementations must validate the shape of whatever the underlying
    /// provider returns and return an empty vec rather than propagate a
    /// parse error, so callers don't need defensive handling beyond `?`.
    async fn extract_triples(
        &self,
        text: &str,
        hint: &ExtractionHint,
    ) -> Result<Vec<ExtractedTriple>>;
}
