//! Thin request/response mapping for the five endpoints in spec §4.10.
//! Each handler validates its DTO, calls straight into C8/C9, and lets
//! [`crate::server::error::ApiError`] translate any failure.

use crate::application::indexing::StartIndexingRequest;
use crate::application::query::QueryRequest;
use crate::domain::types::{IndexingStatus, QueryMode, SourceType};
use crate::server::error::ApiError;
use crate::server::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Serialize)]
pub struct HealthResponse {
    pub version: &'static str,
    pub mode: &'static str,
    pub instance_id: String,
}

/// `GET /health` — static liveness.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        version: state.version,
        mode: state.mode,
        instance_id: state.instance_id.clone(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Indexing,
    Degraded,
    Unhealthy,
}

#[derive(Serialize)]
pub struct HealthStatusResponse {
    pub state: HealthState,
    pub indexing: IndexingStatus,
    pub vector_store_initialized: bool,
    pub progress_percent: u8,
}

/// `GET /health/status` — maps [`crate::domain::types::IndexingState`] and
/// store readiness onto `{healthy, indexing, degraded, unhealthy}` (spec §7).
pub async fn health_status(State(state): State<AppState>) -> Json<HealthStatusResponse> {
    let status = state.coordinator.get_status().await;
    let initialized = state.vector_store.is_initialized().await;

    let health_state = if status.is_indexing {
        HealthState::Indexing
    } else if state.vector_store.count(None).await.is_err() {
        HealthState::Unhealthy
    } else if status.status == IndexingStatus::Failed || !initialized {
        HealthState::Degraded
    } else {
        HealthState::Healthy
    };

    Json(HealthStatusResponse {
        state: health_state,
        indexing: status.status,
        vector_store_initialized: initialized,
        progress_percent: status.progress_percent,
    })
}

#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for POST /index and /index/add (spec §4.10)")]
pub struct IndexRequestDto {
    /// Absolute or relative path to the directory to index.
    pub folder_path: PathBuf,
    #[serde(default = "default_true")]
    pub recursive: bool,
    #[serde(default = "default_true")]
    pub include_code: bool,
    /// Overrides the configured `chunk_size` for this job only.
    #[serde(default)]
    pub chunk_size: Option<usize>,
    /// Overrides the configured `chunk_overlap` for this job only.
    #[serde(default)]
    pub chunk_overlap: Option<usize>,
}

fn default_true() -> bool {
    true
}

#[derive(Serialize)]
pub struct IndexResponse {
    pub job_id: String,
    pub status: IndexingStatus,
}

/// `POST /index` — resets before indexing.
pub async fn start_index(
    State(state): State<AppState>,
    Json(body): Json<IndexRequestDto>,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    start_index_impl(state, body, true).await
}

/// `POST /index/add` — same as `/index` but never resets.
pub async fn add_index(
    State(state): State<AppState>,
    Json(body): Json<IndexRequestDto>,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    start_index_impl(state, body, false).await
}

async fn start_index_impl(
    state: AppState,
    body: IndexRequestDto,
    reset_first: bool,
) -> Result<(StatusCode, Json<IndexResponse>), ApiError> {
    if body.folder_path.as_os_str().is_empty() || !body.folder_path.exists() {
        return Err(crate::domain::error::Error::bad_request(format!(
            "folder_path {:?} does not exist",
            body.folder_path
        ))
        .into());
    }
    let request = StartIndexingRequest {
        folder_path: body.folder_path,
        recursive: body.recursive,
        include_code: body.include_code,
        reset_first,
        chunk_size: body.chunk_size,
        chunk_overlap: body.chunk_overlap,
    };
    let job_id = state.coordinator.start_indexing(request).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(IndexResponse {
            job_id,
            status: IndexingStatus::Indexing,
        }),
    ))
}

/// `DELETE /index` — calls `reset()`.
pub async fn delete_index(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.coordinator.reset().await?;
    Ok(StatusCode::OK)
}

#[derive(Debug, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for POST /query (spec §4.9)")]
pub struct QueryRequestDto {
    pub query_text: String,
    #[serde(default = "default_mode")]
    pub mode: QueryMode,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default)]
    pub similarity_threshold: f32,
    #[serde(default = "default_alpha")]
    pub alpha: f32,
    #[serde(default)]
    pub source_types: Option<Vec<SourceType>>,
    #[serde(default)]
    pub languages: Option<Vec<String>>,
    #[serde(default)]
    pub file_paths: Option<Vec<String>>,
}

fn default_mode() -> QueryMode {
    QueryMode::Hybrid
}
fn default_top_k() -> usize {
    5
}
fn default_alpha() -> f32 {
    0.5
}

/// `POST /query` — spec §4.9.
pub async fn query(
    State(state): State<AppState>,
    Json(body): Json<QueryRequestDto>,
) -> Result<Json<crate::application::query::QueryResponse>, ApiError> {
    let request = QueryRequest {
        query_text: body.query_text,
        mode: body.mode,
        top_k: body.top_k,
        similarity_threshold: body.similarity_threshold,
        alpha: body.alpha,
        source_types: body.source_types,
        languages: body.languages,
        file_paths: body.file_paths,
    };
    let response = state.query_engine.query(request).await?;
    Ok(Json(response))
}
