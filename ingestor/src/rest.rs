use crate::errors::Error;
use crate::model::LogEntry;
use crate::store::LogStore;
use crate::validate::{validate_batch, validate_query, ValidationError};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info, warn};

/// Largest accepted `POST /logs` body
pub const MAX_BODY_BYTES: usize = 50 * 1024 * 1024;

#[derive(Clone)]
struct AppState {
    store: Arc<dyn LogStore>,
}

pub fn create_router(store: Arc<dyn LogStore>) -> Router {
    let state = AppState { store };

    Router::new()
        .route("/logs", get(list_logs).post(create_logs))
        .route("/health", get(health))
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn create_logs(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(body) = payload.map_err(|e| ApiError::Transport(e.body_text()))?;

    let entries = validate_batch(&body)?;

    let inserted = state.store.insert_batch(&entries).await?;
    info!("Stored batch of {} logs", inserted);

    Ok(StatusCode::CREATED)
}

async fn list_logs(
    State(state): State<AppState>,
    params: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Transport(e.body_text()))?;

    let filter = validate_query(&params)?;
    debug!("Querying logs with {:?}", filter);

    let logs = state.store.query(&filter).await?;

    Ok(Json(logs))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

#[derive(Debug)]
enum ApiError {
    /// Request content broke a validation rule
    Validation(ValidationError),
    /// Body or query string could not be decoded at all
    Transport(String),
    Persistence(Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => {
                warn!("Rejected request: {}", err);
                (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": err.message, "field": err.field })),
                )
                    .into_response()
            }
            ApiError::Transport(msg) => {
                error!("Malformed request: {}", msg);
                StatusCode::BAD_REQUEST.into_response()
            }
            ApiError::Persistence(err) => {
                error!("Database error: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Persistence(err)
    }
}
