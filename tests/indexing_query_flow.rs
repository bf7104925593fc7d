//! End-to-end indexing → query flow over the HTTP surface (spec §4.8, §4.9,
//! §8's testable properties), plus the single-instance lock protocol
//! (spec §4.2).

use agent_brain::adapters::providers::embedding::NullEmbeddingProvider;
use agent_brain::adapters::storage::{Bm25KeywordStore, FilesystemGraphStore, FilesystemVectorStore};
use agent_brain::application::indexing::IndexingSettings;
use agent_brain::application::{IndexingCoordinator, QueryEngine};
use agent_brain::domain::chunking::ChunkConfig;
use agent_brain::domain::types::QueryMode;
use agent_brain::infrastructure::lifecycle::lock::LockGuard;
use agent_brain::server::state::AppState;
use agent_brain::server::build_router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;

fn test_state(state_dir: &std::path::Path) -> (AppState, Arc<IndexingCoordinator>) {
    let vector_store = Arc::new(FilesystemVectorStore::new(state_dir));
    let keyword_store = Arc::new(Bm25KeywordStore::new(state_dir));
    let graph_store = Arc::new(FilesystemGraphStore::new(state_dir));
    let embedder = Arc::new(NullEmbeddingProvider::new(16));

    let coordinator = Arc::new(IndexingCoordinator::new(
        vector_store.clone(),
        keyword_store.clone(),
        graph_store.clone(),
        embedder.clone(),
        None,
        None,
        IndexingSettings {
            chunk_config: ChunkConfig::default(),
            embedding_batch_size: 10,
            vector_write_batch_size: 1000,
            generate_summaries: false,
            enable_graph_index: false,
            graph_max_triplets_per_chunk: 5,
        },
    ));
    let query_engine = Arc::new(QueryEngine::new(
        vector_store.clone(),
        keyword_store,
        graph_store,
        embedder,
        coordinator.clone(),
        60.0,
        2,
    ));

    (
        AppState {
            coordinator: coordinator.clone(),
            query_engine,
            vector_store,
            instance_id: "test-instance".to_string(),
            mode: "project",
            version: "0.0.0-test",
        },
        coordinator,
    )
}

async fn send(app: axum::Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        json!(null)
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn index_then_query_round_trips_through_http() {
    let state_dir = tempfile::tempdir().unwrap();
    let project_dir = tempfile::tempdir().unwrap();
    std::fs::write(
        project_dir.path().join("guide.md"),
        "# Setup\n\nRun `cargo build` to compile the project before testing.\n",
    )
    .unwrap();

    let (state, coordinator) = test_state(state_dir.path());
    let app = build_router(state);

    let index_request = Request::builder()
        .method("POST")
        .uri("/index")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"folder_path": project_dir.path().to_str().unwrap()}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(app.clone(), index_request).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(!body["job_id"].as_str().unwrap().is_empty());

    for _ in 0..100 {
        if !coordinator.get_status().await.is_indexing {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(!coordinator.get_status().await.is_indexing);

    let query_request = Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"query_text": "how do I build the project", "mode": "hybrid", "top_k": 5}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(app, query_request).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty(), "expected at least one hybrid hit for the indexed guide");
    assert_eq!(results[0]["source_type"], "doc");
}

#[tokio::test]
async fn exact_text_vector_query_scores_at_least_point_nine() {
    let state_dir = tempfile::tempdir().unwrap();
    let project_dir = tempfile::tempdir().unwrap();
    let body_text = "The quick brown fox jumps ".repeat(10);
    std::fs::write(project_dir.path().join("notes.md"), &body_text).unwrap();

    let (state, coordinator) = test_state(state_dir.path());
    let app = build_router(state);

    let index_request = Request::builder()
        .method("POST")
        .uri("/index")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"folder_path": project_dir.path().to_str().unwrap()}).to_string(),
        ))
        .unwrap();
    let (status, _) = send(app.clone(), index_request).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    for _ in 0..100 {
        if !coordinator.get_status().await.is_indexing {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
    }
    assert!(!coordinator.get_status().await.is_indexing);

    let query_request = Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"query_text": body_text, "mode": "vector", "top_k": 1}).to_string(),
        ))
        .unwrap();
    let (status, body) = send(app, query_request).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(
        results[0]["score"].as_f64().unwrap() >= 0.9,
        "expected the exact-text query to score >= 0.9, got {}",
        results[0]["score"]
    );
}

#[tokio::test]
async fn second_index_while_running_is_rejected_with_409() {
    let state_dir = tempfile::tempdir().unwrap();
    let project_dir = tempfile::tempdir().unwrap();
    std::fs::write(project_dir.path().join("a.md"), "hello world ".repeat(200)).unwrap();

    let (state, _coordinator) = test_state(state_dir.path());
    let app = build_router(state);

    let make_request = || {
        Request::builder()
            .method("POST")
            .uri("/index")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({"folder_path": project_dir.path().to_str().unwrap()}).to_string(),
            ))
            .unwrap()
    };

    let (first_status, _) = send(app.clone(), make_request()).await;
    assert_eq!(first_status, StatusCode::ACCEPTED);
    let (second_status, body) = send(app, make_request()).await;
    assert_eq!(second_status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "already_indexing");
}

#[tokio::test]
async fn query_with_empty_text_is_rejected_with_400() {
    let state_dir = tempfile::tempdir().unwrap();
    let (state, _coordinator) = test_state(state_dir.path());
    let app = build_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/query")
        .header("content-type", "application/json")
        .body(Body::from(json!({"query_text": "", "mode": "vector"}).to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");
}

#[test]
fn query_mode_round_trips_through_json() {
    let serialized = serde_json::to_string(&QueryMode::Hybrid).unwrap();
    assert_eq!(serialized, "\"hybrid\"");
}

#[test]
fn lock_protocol_rejects_a_second_holder_while_first_is_alive() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = LockGuard::acquire(dir.path()).unwrap();
    let second = LockGuard::acquire(dir.path());
    assert!(second.is_err());
    first.release().unwrap();
    // Once released, a fresh acquire succeeds.
    LockGuard::acquire(dir.path()).unwrap().release().unwrap();
}
