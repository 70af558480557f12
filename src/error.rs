use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Failures surfaced at the HTTP boundary. Everything inside the pipeline
/// travels as `anyhow::Error` and is wrapped on the way out.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    InvalidInput(String),

    #[error("rendering failed after {attempts} attempts: {detail}")]
    RenderExhausted { attempts: u32, detail: String },

    #[error("video not found: {0}")]
    MissingOutput(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::MissingOutput(_) => StatusCode::NOT_FOUND,
            ApiError::RenderExhausted { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {:#}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
