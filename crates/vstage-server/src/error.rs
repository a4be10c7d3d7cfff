//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::status::StatusError;
use crate::features::reconcile::ReconcileError;
use crate::jobs::WorkerError;
use crate::notify::PublishError;

/// Result type alias for server operations
pub type AppResult<T> = std::result::Result<T, AppError>;

/// Application error types
///
/// Every variant renders as `{"error": "<message>"}` so that admin tooling can
/// rely on a single error shape.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotImplemented(String),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),

    #[error(transparent)]
    Status(#[from] StatusError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

impl From<WorkerError> for AppError {
    fn from(err: WorkerError) -> Self {
        match err {
            WorkerError::Status(e) => AppError::Status(e),
            WorkerError::Notify(e) => AppError::Publish(e),
        }
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::Status(StatusError::InvalidArgument(_))
            | AppError::Publish(PublishError::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            AppError::Publish(PublishError::Cancelled) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Reconcile(_) | AppError::Status(_) | AppError::Publish(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match self {
            AppError::Status(StatusError::Database(ref e)) => {
                tracing::error!(error = ?e, "Database error");
                "A database error occurred".to_string()
            },
            ref other => {
                if status.is_server_error() {
                    tracing::error!(error = %other, "Request failed");
                }
                other.to_string()
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
