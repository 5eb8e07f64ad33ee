//! HTTP surface - stateless handlers over the engine
//!
//! Handlers validate input, call the pure engine and serialize the result;
//! they hold no state beyond the shared engine.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::trace::TraceLayer;

use crate::engine::{BatchReport, DecodeError, Engine, EngineError, EngineMetadata};
use crate::model::{Datasheet, DecodedVds, FlatView};

/// Per-request deadline applied to generation endpoints
const REQUEST_DEADLINE: Duration = Duration::from_secs(10);

/// API error wrapper mapping engine failures to HTTP responses
pub enum ApiError {
    Input(DecodeError),
    Timeout,
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Input(e) => ApiError::Input(e),
            EngineError::Timeout => ApiError::Timeout,
        }
    }
}

impl From<DecodeError> for ApiError {
    fn from(err: DecodeError) -> Self {
        ApiError::Input(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Input(err) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({
                    "error": {
                        "kind": err.kind(),
                        "segment": err.segment(),
                        "message": err.to_string(),
                    }
                })),
            )
                .into_response(),
            ApiError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                Json(serde_json::json!({
                    "error": { "kind": "Timeout", "message": "deadline exceeded" }
                })),
            )
                .into_response(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    data_loaded: bool,
    vds_index_count: usize,
    piping_classes_count: usize,
}

#[derive(Serialize)]
struct DecodedVdsView {
    #[serde(flatten)]
    decoded: DecodedVds,
    valve_type_full: String,
    modifiers: Vec<&'static str>,
}

impl From<DecodedVds> for DecodedVdsView {
    fn from(decoded: DecodedVds) -> Self {
        Self {
            valve_type_full: decoded.valve_type(),
            modifiers: decoded.modifiers(),
            decoded,
        }
    }
}

#[derive(Serialize)]
struct ValidationResponse {
    vds_no: String,
    is_valid: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Deserialize)]
struct BatchRequest {
    vds_numbers: Vec<String>,
}

#[derive(Deserialize)]
struct ListParams {
    valve_type: Option<String>,

    #[serde(default)]
    offset: usize,

    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

#[derive(Serialize)]
struct VdsListResponse {
    vds_numbers: Vec<String>,
    total: usize,
}

/// Build the API router over a shared engine
pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/vds/{vds_no}/decode", get(decode_vds))
        .route("/vds/{vds_no}/validate", get(validate_vds))
        .route("/datasheet/{vds_no}", get(datasheet))
        .route("/datasheet/{vds_no}/flat", get(datasheet_flat))
        .route("/datasheet/batch", post(batch))
        .route("/metadata", get(metadata))
        .route("/metadata/vds-numbers", get(list_vds))
        .layer(TraceLayer::new_for_http())
        .with_state(engine)
}

/// Bind and serve until the process is stopped
pub async fn serve(engine: Arc<Engine>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{addr}");
    axum::serve(listener, router(engine)).await
}

async fn health(State(engine): State<Arc<Engine>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: engine.version(),
        data_loaded: engine.piping_class_count() > 0,
        vds_index_count: engine.vds_index_count(),
        piping_classes_count: engine.piping_class_count(),
    })
}

async fn decode_vds(
    State(engine): State<Arc<Engine>>,
    Path(vds_no): Path<String>,
) -> Result<Json<DecodedVdsView>, ApiError> {
    let decoded = engine.decode(&vds_no)?;
    Ok(Json(decoded.into()))
}

async fn validate_vds(
    State(engine): State<Arc<Engine>>,
    Path(vds_no): Path<String>,
) -> Json<ValidationResponse> {
    let result = engine.validate_vds(&vds_no);
    Json(ValidationResponse {
        vds_no,
        is_valid: result.is_ok(),
        error: result.err().map(|e| e.to_string()),
    })
}

async fn datasheet(
    State(engine): State<Arc<Engine>>,
    Path(vds_no): Path<String>,
) -> Result<Json<Datasheet>, ApiError> {
    let deadline = Instant::now() + REQUEST_DEADLINE;
    let datasheet = engine.generate_with_deadline(&vds_no, Some(deadline))?;
    Ok(Json(datasheet))
}

async fn datasheet_flat(
    State(engine): State<Arc<Engine>>,
    Path(vds_no): Path<String>,
) -> Result<Json<FlatView>, ApiError> {
    let deadline = Instant::now() + REQUEST_DEADLINE;
    let datasheet = engine.generate_with_deadline(&vds_no, Some(deadline))?;
    Ok(Json(datasheet.flat_view()))
}

async fn batch(
    State(engine): State<Arc<Engine>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchReport>, ApiError> {
    let deadline = Instant::now() + REQUEST_DEADLINE;
    let results = engine.generate_batch(&request.vds_numbers, Some(deadline))?;
    Ok(Json(BatchReport::from_items(results)))
}

async fn metadata(State(engine): State<Arc<Engine>>) -> Json<EngineMetadata> {
    Json(engine.metadata())
}

async fn list_vds(
    State(engine): State<Arc<Engine>>,
    Query(params): Query<ListParams>,
) -> Json<VdsListResponse> {
    let all = engine.vds_index().all_codes(params.valve_type.as_deref());
    let total = all.len();
    let limit = params.limit.min(1000);
    let vds_numbers = all
        .into_iter()
        .skip(params.offset)
        .take(limit)
        .map(str::to_string)
        .collect();
    Json(VdsListResponse { vds_numbers, total })
}
