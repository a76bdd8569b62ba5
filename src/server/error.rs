//! Error responses of the HTTP front end.

use crate::common::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// Failures a request can end with.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Operation(#[from] Error),

    #[error("Unknown operation: {family}/{operation}")]
    UnknownOperation { family: String, operation: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Operation(err) => match err {
                Error::NotFound(_) => StatusCode::NOT_FOUND,
                Error::OutOfRange { .. } | Error::InvalidReference(_) | Error::InvalidArgument(_) => {
                    StatusCode::BAD_REQUEST
                },
                Error::CorruptContainer(_) => StatusCode::UNPROCESSABLE_ENTITY,
                Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ApiError::UnknownOperation { .. } => StatusCode::NOT_FOUND,
            ApiError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Operation(err) => err.code(),
            ApiError::UnknownOperation { .. } => "UNKNOWN_OPERATION",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorBody {
            status: &'static str,
            code: &'static str,
            error: String,
        }

        let status = self.status();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "request rejected");
        }
        let body = ErrorBody {
            status: "error",
            code: self.code(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
