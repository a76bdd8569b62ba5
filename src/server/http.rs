//! HTTP handlers.
//!
//! - POST /{family}/{operation} - run one operation on the JSON body
//! - GET /health - liveness check

use super::error::ApiError;
use crate::service::{Outcome, Service, dispatch};
use axum::Json;
use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use serde::Serialize;
use serde_json::Value;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Body of a successful operation.
#[derive(Serialize)]
pub struct SuccessBody {
    pub status: &'static str,
    pub message: String,
    pub data: Option<Value>,
}

impl From<Outcome> for SuccessBody {
    fn from(outcome: Outcome) -> Self {
        Self {
            status: "success",
            message: outcome.message,
            data: outcome.data,
        }
    }
}

/// Routes of the service, with request tracing.
pub fn router(service: Service) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/{family}/{operation}", post(operation_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// GET /health - Health check endpoint.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// POST /{family}/{operation} - deserialize, then run the operation on a
/// blocking thread; file I/O and the path lock never block the runtime.
pub async fn operation_handler(
    State(service): State<Service>,
    Path((family, operation)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<SuccessBody>, ApiError> {
    let Some(op) = dispatch::lookup(&family, &operation) else {
        return Err(ApiError::UnknownOperation { family, operation });
    };
    let params: Value =
        serde_json::from_slice(&body).map_err(|e| ApiError::InvalidJson(e.to_string()))?;
    debug!(operation = ?op, "dispatching");

    let outcome = tokio::task::spawn_blocking(move || op.run(&service, params))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))??;
    Ok(Json(outcome.into()))
}
