//! Translation of prediction failures into HTTP status codes and `{detail}` bodies.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use intentd_ai::PredictError;
use intentd_core::ErrorBody;
use thiserror::Error;
use tracing::error;

/// Detail sent to callers for any unanticipated failure.
pub const INTERNAL_DETAIL: &str = "Internal server error during prediction";

/// Errors translated into HTTP responses at the facade boundary.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Empty text or unknown model.
    #[error("{0}")]
    BadRequest(String),

    /// Body could not be decoded into the expected request type.
    #[error("{detail}")]
    Rejected { status: StatusCode, detail: String },

    /// Inference or runtime failure. The message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rejected { status, .. } => *status,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PredictError> for ApiError {
    fn from(e: PredictError) -> Self {
        match e {
            PredictError::Validation(msg) => Self::BadRequest(msg),
            PredictError::ModelNotFound(e) => Self::BadRequest(e.to_string()),
            e @ PredictError::Inference { .. } => Self::Internal(e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Rejected {
            status: rejection.status(),
            detail: rejection.body_text(),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("prediction task failed: {e}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match self {
            Self::BadRequest(detail) | Self::Rejected { detail, .. } => detail,
            Self::Internal(msg) => {
                error!(error = %msg, "request failed");
                INTERNAL_DETAIL.to_string()
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
