use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;

/// Application-level errors
///
/// Every variant is fatal for the request that produced it. Per-candidate
/// enrichment failures live in `services::enrichment::EnrichmentError` and
/// never reach this type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Deadline of {}s exceeded", .0.as_secs())]
    DeadlineExceeded(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable taxonomy code exposed to callers
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated(_) => "unauthenticated",
            AppError::NotFound(_) => "not-found",
            AppError::InvalidArgument(_) => "invalid-argument",
            AppError::ConfigurationMissing(_) => "configuration-missing",
            AppError::PersistenceFailure(_) => "persistence-failure",
            AppError::DeadlineExceeded(_) => "deadline-exceeded",
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            AppError::ConfigurationMissing(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::PersistenceFailure(_)
            | AppError::Database(_)
            | AppError::Cache(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show across the API boundary
    fn public_message(&self) -> String {
        match self {
            AppError::PersistenceFailure(_) => "Failed to store match results".to_string(),
            AppError::Database(_) | AppError::Cache(_) | AppError::Internal(_) => {
                "Internal server error".to_string()
            }
            AppError::ConfigurationMissing(_) => {
                "Match enrichment is not configured on this server".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, code = self.code(), "Request failed");
        }

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
