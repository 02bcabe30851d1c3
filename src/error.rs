// SPDX-License-Identifier: MIT
// Copyright 2026 Hika contributors

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Not allowed: {0}")]
    Forbidden(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Storage permission denied: {0}")]
    StoragePermissionDenied(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Trail data API error: {0}")]
    TrailApi(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Message shown to users when a backend read or write fails.
    pub const RETRY_MESSAGE: &'static str = "Something went wrong. Please try again.";

    /// Message shown when blob storage rejects an upload.
    pub const STORAGE_RULES_MESSAGE: &'static str =
        "Upload was rejected by storage. Check the storage security rules for this path.";

    /// True for failures of the backend platform (document store or blob store).
    pub fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            AppError::Database(_) | AppError::Storage(_) | AppError::StoragePermissionDenied(_)
        )
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(errors.to_string())
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", None),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", Some(msg.clone())),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", Some(msg.clone())),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    Some(Self::RETRY_MESSAGE.to_string()),
                )
            }
            AppError::StoragePermissionDenied(msg) => {
                tracing::warn!(error = %msg, "Storage permission denied");
                (
                    StatusCode::FORBIDDEN,
                    "storage_permission_denied",
                    Some(Self::STORAGE_RULES_MESSAGE.to_string()),
                )
            }
            AppError::Storage(msg) => {
                tracing::error!(error = %msg, "Storage error");
                (
                    StatusCode::BAD_GATEWAY,
                    "storage_error",
                    Some(Self::RETRY_MESSAGE.to_string()),
                )
            }
            AppError::TrailApi(msg) => {
                (StatusCode::BAD_GATEWAY, "trail_api_error", Some(msg.clone()))
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
