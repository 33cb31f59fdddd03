// src/api.rs
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::dashboard::render_dashboard;
use crate::error::{EnqueueError, IngestError, StoreError};
use crate::gateway::PublishGateway;
use crate::ingest::types::IngestionRequest;
use crate::ingest::Ingestor;

pub const HEADER_PERSISTED: &str = "X-Ingest-Persisted";
pub const HEADER_FAILED: &str = "X-Ingest-Failed";

#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
    pub gateway: PublishGateway,
    pub assets_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(&state.assets_dir);

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/parse", post(parse_feed))
        .route("/publish", post(publish_feed))
        .route("/dashboard", get(dashboard))
        .nest_service("/assets", assets)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// JSON error body: `{"error": ..., "kind": ...}`.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Ingest(IngestError),
    Enqueue(EnqueueError),
    Store(StoreError),
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        ApiError::Ingest(e)
    }
}

impl From<EnqueueError> for ApiError {
    fn from(e: EnqueueError) -> Self {
        ApiError::Enqueue(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Store(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError::BadRequest(e.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message, detail) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Ingest(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                e.kind(),
                "error while parsing the RSS feed".to_string(),
                Some(e.to_string()),
            ),
            ApiError::Enqueue(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "enqueue",
                "error while publishing to the queue".to_string(),
                Some(e.to_string()),
            ),
            ApiError::Store(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "store",
                "error while reading recipes".to_string(),
                Some(e.to_string()),
            ),
        };
        let mut body = json!({ "error": message, "kind": kind });
        if let Some(d) = detail {
            body["detail"] = json!(d);
        }
        (status, Json(body)).into_response()
    }
}

/// Shape check shared by both POST routes. Returns the request with a trimmed URL.
fn accept(payload: Result<Json<IngestionRequest>, JsonRejection>) -> Result<IngestionRequest, ApiError> {
    let Json(req) = payload?;
    req.validate().map_err(ApiError::BadRequest)?;
    Ok(IngestionRequest {
        url: req.url.trim().to_string(),
    })
}

async fn parse_feed(
    State(state): State<AppState>,
    payload: Result<Json<IngestionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let req = accept(payload)?;
    let report = state.ingestor.run(&req.url).await?;

    let headers = [
        (HEADER_PERSISTED, report.persisted().to_string()),
        (HEADER_FAILED, report.failed.to_string()),
    ];
    Ok((headers, Json(report.entries)))
}

async fn publish_feed(
    State(state): State<AppState>,
    payload: Result<Json<IngestionRequest>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let req = accept(payload)?;
    state.gateway.publish(&req).await?;
    Ok(Json(json!({ "message": "success" })))
}

async fn dashboard(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let recipes = state.ingestor.store().list_recipes().await?;
    Ok(Html(render_dashboard(&recipes)))
}
