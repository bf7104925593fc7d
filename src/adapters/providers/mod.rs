//! Pluggable provider implementations for the two "external AI service"
//! ports: [`crate::domain::ports::EmbeddingProvider`] and
//! [`crate::domain::ports::Summarizer`]/[`crate::domain::ports::TripleExtractor`].

pub mod embedding;
pub mod summarizer;
