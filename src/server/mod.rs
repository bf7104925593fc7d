//! HTTP surface (C10) and the daemon's startup/shutdown orchestration
//! (spec §4.2, §4.10).

pub mod error;
pub mod handlers;
pub mod state;

use crate::adapters::providers::embedding::{EmbeddingProviderKind, HttpEmbeddingProvider, NullEmbeddingProvider};
use crate::adapters::providers::summarizer::{HttpSummarizer, NullSummarizer};
use crate::adapters::storage::{Bm25KeywordStore, FilesystemGraphStore, FilesystemVectorStore};
use crate::application::indexing::IndexingSettings;
use crate::application::{IndexingCoordinator, QueryEngine};
use crate::domain::error::{Error, Result};
use crate::domain::ports::{EmbeddingProvider, Summarizer, TripleExtractor};
use crate::domain::types::RuntimeMode;
use crate::infrastructure::config::{project, types::Mode, AgentBrainConfig, ConfigLoader};
use crate::infrastructure::lifecycle::Daemon;
use axum::routing::{delete, get, post};
use axum::Router;
use state::AppState;
use std::path::Path;
use std::sync::Arc;

/// Explicit CLI overrides layered on top of the loaded [`AgentBrainConfig`]
/// (SPEC_FULL.md §0).
#[derive(Debug, Clone, Default)]
pub struct StartupOptions {
    pub config_path: Option<std::path::PathBuf>,
    pub project_root: Option<std::path::PathBuf>,
    pub port: Option<u16>,
    pub mode: Option<Mode>,
}

/// Runs the daemon end to end: load configuration, resolve the project
/// root and state directory, acquire the single-instance lock, open the
/// stores, bind a port, publish `runtime.json`, then serve until a
/// shutdown signal arrives and unwind in reverse order (spec §4.2).
pub async fn run_server(options: StartupOptions) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut config = match &options.config_path {
        Some(path) => ConfigLoader::new().load_with_file(path)?,
        None => ConfigLoader::new().load()?,
    };
    if let Some(mode) = options.mode {
        config.mode = mode;
    }

    let project_root = project::resolve_project_root(
        options.project_root.as_deref(),
        &std::env::current_dir()?,
    )?;
    let state_dir = project::state_dir(config.mode, &project_root)?;
    std::fs::create_dir_all(&state_dir)?;

    let mut daemon = Daemon::start(
        &state_dir,
        &config.lifecycle.bind_host,
        options.port,
        config.lifecycle.port_range_start,
        config.lifecycle.port_range_end,
    )?;

    let (coordinator, query_engine, vector_store) = build_components(&config, daemon.state_dir()).await?;

    let runtime_mode = match config.mode {
        Mode::Project => RuntimeMode::Project,
        Mode::Shared => RuntimeMode::Shared,
    };
    daemon.publish(runtime_mode, &project_root.display().to_string())?;

    let instance_id = uuid::Uuid::new_v4().to_string();
    let app_state = AppState {
        coordinator: Arc::clone(&coordinator),
        query_engine,
        vector_store,
        instance_id,
        mode: mode_label(config.mode),
        version: env!("CARGO_PKG_VERSION"),
    };

    let app = build_router(app_state);
    let listener = tokio::net::TcpListener::from_std(
        daemon
            .listener
            .try_clone()
            .map_err(Error::Io)?,
    )?;

    tracing::info!(port = daemon.port, mode = ?config.mode, "agent-brain listening");

    let shutdown_timeout_s = config.lifecycle.shutdown_timeout_s;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    daemon.shutdown(&coordinator, shutdown_timeout_s).await?;
    Ok(())
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Project => "project",
        Mode::Shared => "shared",
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

/// Assembles C3's three stores, the C6/C7 providers selected from
/// configuration, and the C8/C9 coordinators that sit on top of them.
///
/// Spec §4.2 step 3 calls this "open (or create)": each store restores any
/// state a prior process persisted to disk, so queries against an
/// already-indexed project work immediately after a restart rather than
/// requiring a fresh `/index` call.
async fn build_components(
    config: &AgentBrainConfig,
    state_dir: &Path,
) -> Result<(
    Arc<IndexingCoordinator>,
    Arc<QueryEngine>,
    Arc<dyn crate::domain::ports::VectorStore>,
)> {
    let paths = project::StorePaths::under(state_dir);
    let vector_store: Arc<dyn crate::domain::ports::VectorStore> =
        Arc::new(FilesystemVectorStore::new(&paths.vector));
    let keyword_store: Arc<dyn crate::domain::ports::KeywordStore> =
        Arc::new(Bm25KeywordStore::new(&paths.keyword));
    let graph_store: Arc<dyn crate::domain::ports::GraphStore> =
        Arc::new(FilesystemGraphStore::new(&paths.graph));

    let embedder: Arc<dyn EmbeddingProvider> = match EmbeddingProviderKind::from_str(&config.embedding.provider) {
        Some(EmbeddingProviderKind::Http) => Arc::new(HttpEmbeddingProvider::new(
            config.embedding.endpoint.clone(),
            config.embedding.model.clone(),
            config.embedding.dimensions,
        )),
        Some(EmbeddingProviderKind::Null) | None => {
            Arc::new(NullEmbeddingProvider::new(config.embedding.dimensions))
        }
    };

    let (summarizer, triple_extractor): (Option<Arc<dyn Summarizer>>, Option<Arc<dyn TripleExtractor>>) =
        if config.summarization.provider == "http" {
            let shared = Arc::new(HttpSummarizer::new(
                config.summarization.endpoint.clone(),
                config.summarization.extract_endpoint.clone(),
            ));
            let triples = config.graph.graph_use_llm_extraction.then(|| shared.clone() as Arc<dyn TripleExtractor>);
            (Some(shared), triples)
        } else {
            let shared = Arc::new(NullSummarizer);
            (Some(shared.clone()), Some(shared))
        };

    // Only restore the vector collection if a prior process actually indexed
    // something; an unindexed project must stay uninitialized so the query
    // engine's readiness gate (spec §4.9) keeps reporting `NotReady` rather
    // than pretending an empty collection is a completed index.
    if paths.vector.join("vectors.json").exists() {
        vector_store.init(embedder.dimensions()).await?;
    }
    keyword_store.load().await?;
    graph_store.load().await?;

    let settings = IndexingSettings {
        chunk_config: (&config.chunking).into(),
        embedding_batch_size: config.embedding.batch_size,
        vector_write_batch_size: config.indexing.vector_write_batch_size,
        generate_summaries: config.summarization.generate_summaries,
        enable_graph_index: config.graph.enable_graph_index,
        graph_max_triplets_per_chunk: config.graph.graph_max_triplets_per_chunk,
    };

    let coordinator = Arc::new(IndexingCoordinator::new(
        Arc::clone(&vector_store),
        Arc::clone(&keyword_store),
        Arc::clone(&graph_store),
        Arc::clone(&embedder),
        summarizer,
        triple_extractor,
        settings,
    ));

    let query_engine = Arc::new(QueryEngine::new(
        Arc::clone(&vector_store),
        keyword_store,
        graph_store,
        embedder,
        Arc::clone(&coordinator),
        config.query.rrf_k,
        config.graph.graph_traversal_depth,
    ));

    Ok((coordinator, query_engine, vector_store))
}

/// Wires the five endpoints from spec §4.10 onto `handlers`.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/health/status", get(handlers::health_status))
        .route("/index", post(handlers::start_index))
        .route("/index/add", post(handlers::add_index))
        .route("/index", delete(handlers::delete_index))
        .route("/query", post(handlers::query))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower::ServiceExt;

    fn test_config() -> AgentBrainConfig {
        AgentBrainConfig::default()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let (coordinator, query_engine, vector_store) = build_components(&config, dir.path()).await.unwrap();
        let state = AppState {
            coordinator,
            query_engine,
            vector_store,
            instance_id: "test".to_string(),
            mode: "project",
            version: "0.0.0",
        };
        let app = build_router(state);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/health")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::OK);
    }

    #[tokio::test]
    async fn query_before_any_indexing_returns_not_ready() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config();
        let (coordinator, query_engine, vector_store) = build_components(&config, dir.path()).await.unwrap();
        let state = AppState {
            coordinator,
            query_engine,
            vector_store,
            instance_id: "test".to_string(),
            mode: "project",
            version: "0.0.0",
        };
        let app = build_router(state);
        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .method("POST")
                    .uri("/query")
                    .header("content-type", "application/json")
                    .body(axum::body::Body::from(
                        serde_json::json!({"query_text": "hello"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), axum::http::StatusCode::SERVICE_UNAVAILABLE);
    }
}
