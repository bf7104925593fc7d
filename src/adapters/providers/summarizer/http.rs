//! Generic HTTP summarizer/triple-extractor.
//!
//! Failures here are always absorbed by the caller (C6/C7 never fail the
//! pipeline on a summarization or extraction error — spec §4.5 step 5,
//! §4.7), so this adapter logs and returns `Ok(None)` / `Ok(vec![])` rather
//! than propagating transport errors.

use crate::domain::error::Result;
use crate::domain::ports::summarizer::{ExtractedTriple, ExtractionHint};
use crate::domain::ports::{Summarizer, TripleExtractor};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct SummarizeRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct SummarizeResponse {
    summary: Option<String>,
}

#[derive(Serialize)]
struct ExtractRequest<'a> {
    text: &'a str,
    hint: &'a ExtractionHint,
}

#[derive(Deserialize)]
struct ExtractResponse {
    #[serde(default)]
    triples: Vec<ExtractedTriple>,
}

pub struct HttpSummarizer {
    client: reqwest::Client,
    summarize_endpoint: String,
    extract_endpoint: String,
}

impl HttpSummarizer {
    pub fn new(summarize_endpoint: impl Into<String>, extract_endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            summarize_endpoint: summarize_endpoint.into(),
            extract_endpoint: extract_endpoint.into(),
        }
    }
}

#[async_trait]
impl Summarizer for HttpSummarizer {
    async fn summarize(&self, text: &str) -> Result<Option<String>> {
        match self
            .client
            .post(&self.summarize_endpoint)
            .json(&SummarizeRequest { text })
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => match response.json::<SummarizeResponse>().await {
                Ok(body) => Ok(body.summary),
                Err(err) => {
                    tracing::warn!(error = %err, "summarizer returned an unparseable body");
                    Ok(None)
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "summarizer request failed");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl TripleExtractor for HttpSummarizer {
    async fn extract_triples(
        &self,
        text: &str,
        hint: &ExtractionHint,
    ) -> Result<Vec<ExtractedTriple>> {
        match self
            .client
            .post(&self.extract_endpoint)
            .json(&ExtractRequest { text, hint })
            .send()
            .await
            .and_then(|r| r.error_for_status())
        {
            Ok(response) => match response.json::<ExtractResponse>().await {
                Ok(body) => Ok(body.triples),
                Err(err) => {
                    tracing::warn!(error = %err, "triple extractor returned an unparseable body");
                    Ok(Vec::new())
                }
            },
            Err(err) => {
                tracing::warn!(error = %err, "triple extractor request failed");
                Ok(Vec::new())
            }
        }
    }
}
