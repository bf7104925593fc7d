//! Application layer: orchestrates the domain's ports and chunking
//! algorithms into the indexing pipeline (C8) and the query engine (C9).

pub mod document_loader;
pub mod embedding_generator;
pub mod indexing;
pub mod query;

pub use indexing::{IndexingCoordinator, IndexingSettings, StartIndexingRequest};
pub use query::{QueryEngine, QueryRequest, QueryResponse, QueryResultItem};
