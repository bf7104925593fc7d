//! Capability interfaces driven by the application layer and implemented by
//! adapters. Each port is a narrow, pluggable contract — the core drives it,
//! it does not drive the core.

pub mod embedding;
pub mod graph_store;
pub mod keyword_store;
pub mod summarizer;
pub mod vector_store;

pub use embedding::EmbeddingProvider;
pub use graph_store::GraphStore;
pub use keyword_store::KeywordStore;
pub use summarizer::{Summarizer, TripleExtractor};
pub use vector_store::VectorStore;
