//! No-op summarizer/triple-extractor: used when `summarization_provider`
//! is unset, disabling code summaries and LLM-based triple extraction
//! without branching on `Option<Arc<dyn Summarizer>>` at every call site.

use crate::domain::error::Result;
use crate::domain::ports::summarizer::{ExtractedTriple, ExtractionHint};
use crate::domain::ports::{Summarizer, TripleExtractor};
use async_trait::async_trait;

#[derive(Debug, Clone, Default)]
pub struct NullSummarizer;

#[async_trait]
impl Summarizer for NullSummarizer {
    async fn summarize(&self, _text: &str) -> Result<Option<String>> {
        Ok(None)
    }
}

#[async_trait]
impl TripleExtractor for NullSummarizer {
    async fn extract_triples(
        &self,
        _text: &str,
        _hint: &ExtractionHint,
    ) -> Result<Vec<ExtractedTriple>> {
        Ok(Vec::new())
    }
}
