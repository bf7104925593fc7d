//! Shared application state handed to every axum handler.

use crate::application::{IndexingCoordinator, QueryEngine};
use crate::domain::ports::VectorStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<IndexingCoordinator>,
    pub query_engine: Arc<QueryEngine>,
    pub vector_store: Arc<dyn VectorStore>,
    pub instance_id: String,
    pub mode: &'static str,
    pub version: &'static str,
}
