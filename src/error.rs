use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;
use crate::infrastructure::database::DatabaseError;
use crate::lifecycle::LifecycleError;

pub type Result<T> = std::result::Result<T, DataApiError>;

#[derive(Debug, Error)]
pub enum DataApiError {
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    #[error("Failed to downcast type: {type_name}")]
    DowncastFailed { type_name: String },

    #[error("Route {method} {path} is bound to unknown handler '{handler}'")]
    UnboundHandler {
        method: String,
        path: String,
        handler: String,
    },

    #[error("Route {method} {path} is declared more than once")]
    DuplicateRoute { method: String, path: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable, client-facing classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    BadRequest,
    NotFound,
    PayloadTooLarge,
    DatabaseUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::DatabaseUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error returned from request handling.
///
/// Rendered as `{"success": false, "message": ..., "error": <kind>}`. The
/// underlying cause is logged, never serialized.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("Database unavailable: {0}")]
    DatabaseUnavailable(String),

    /// A controller operation failed; `message` is the operation's own text.
    #[error("{message}")]
    OperationFailed {
        message: &'static str,
        kind: ErrorKind,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::BadRequest(_) => ErrorKind::BadRequest,
            ApiError::NotFound(_) => ErrorKind::NotFound,
            ApiError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            ApiError::DatabaseUnavailable(_) => ErrorKind::DatabaseUnavailable,
            ApiError::OperationFailed { .. } => ErrorKind::Internal,
            ApiError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Re-labels this error as a failure of the named operation, keeping only
    /// its kind.
    pub fn into_operation_failure(self, message: &'static str) -> Self {
        tracing::error!(error = %self, operation = message, "Controller operation failed");
        ApiError::OperationFailed {
            message,
            kind: self.kind(),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Serialization(_) => ApiError::Internal(err.to_string()),
            _ => ApiError::DatabaseUnavailable(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Operation failures always answer 500 but report the cause's kind.
        let (status, error) = match &self {
            ApiError::OperationFailed { kind, .. } => (StatusCode::INTERNAL_SERVER_ERROR, *kind),
            _ => (self.kind().status(), self.kind()),
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self, "Request rejected");
        }

        (
            status,
            Json(json!({
                "success": false,
                "message": self.to_string(),
                "error": error,
            })),
        )
            .into_response()
    }
}
