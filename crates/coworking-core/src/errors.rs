// ABOUTME: Unified application error type with stable error codes and HTTP status mapping
// ABOUTME: AppError is returned by every fallible route, manager and service in the server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Coworking Chat Server Contributors

//! Application error handling
//!
//! Every fallible operation in the server returns [`AppResult`]. Errors carry a
//! machine-readable [`ErrorCode`] and a human-readable message. When the
//! `http-response` feature is enabled, [`AppError`] implements axum's
//! `IntoResponse` so handlers can use `?` directly.

use serde::{Deserialize, Serialize};

/// Result alias used across the workspace
pub type AppResult<T> = Result<T, AppError>;

/// Stable error codes exposed to API clients
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// Caller identity missing or unknown
    AuthInvalid,
    /// Caller is known but not allowed to perform the action
    PermissionDenied,
    /// Request payload failed validation
    InvalidInput,
    /// Requested resource does not exist
    ResourceNotFound,
    /// Request conflicts with current state
    Conflict,
    /// Upstream service (LLM provider) failed
    ExternalServiceError,
    /// Server misconfiguration
    ConfigError,
    /// Storage layer failure
    DatabaseError,
    /// Anything else
    InternalError,
}

impl ErrorCode {
    /// HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::AuthInvalid => 401,
            Self::PermissionDenied => 403,
            Self::InvalidInput => 400,
            Self::ResourceNotFound => 404,
            Self::Conflict => 409,
            Self::ExternalServiceError => 502,
            Self::ConfigError | Self::DatabaseError | Self::InternalError => 500,
        }
    }

    /// Short description used when the detailed message must not leave the server
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthInvalid => "Authentication required",
            Self::PermissionDenied => "Permission denied",
            Self::InvalidInput => "Invalid input",
            Self::ResourceNotFound => "Resource not found",
            Self::Conflict => "Request conflicts with current state",
            Self::ExternalServiceError => "Upstream service unavailable",
            Self::ConfigError => "Server configuration error",
            Self::DatabaseError | Self::InternalError => "Internal server error",
        }
    }

    /// Whether the detailed message is safe to return to API clients
    #[must_use]
    pub const fn exposes_message(self) -> bool {
        !matches!(
            self,
            Self::DatabaseError
                | Self::InternalError
                | Self::ConfigError
                | Self::ExternalServiceError
        )
    }
}

/// Application error with code and message
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code:?}: {message}")]
pub struct AppError {
    /// Error classification
    pub code: ErrorCode,
    /// Detailed message (may be internal)
    pub message: String,
}

impl AppError {
    /// Create an error with an explicit code
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Storage layer failure
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Resource lookup failed
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message)
    }

    /// Validation failure
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing or unknown caller identity
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Caller lacks permission
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PermissionDenied, message)
    }

    /// Request conflicts with existing state
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    /// Upstream service failure
    pub fn external_service(service: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::ExternalServiceError, format!("{service}: {message}"))
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Unclassified internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }

    /// Message suitable for API clients
    #[must_use]
    pub fn client_message(&self) -> &str {
        if self.code.exposes_message() {
            &self.message
        } else {
            self.code.description()
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(e: serde_json::Error) -> Self {
        Self::internal(format!("JSON error: {e}"))
    }
}

/// JSON error envelope returned to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error details
    pub error: ErrorBody,
}

/// Error details inside [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable error code
    pub code: ErrorCode,
    /// Client-safe message
    pub message: String,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code,
                message: err.client_message().to_owned(),
            },
        }
    }
}

#[cfg(feature = "http-response")]
mod http_response {
    use axum::http::StatusCode;
    use axum::response::{IntoResponse, Response};
    use axum::Json;
    use tracing::{error, warn};

    use super::{AppError, ErrorResponse};

    impl IntoResponse for AppError {
        fn into_response(self) -> Response {
            let status = StatusCode::from_u16(self.code.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

            if status.is_server_error() {
                error!(code = ?self.code, "Request failed: {}", self.message);
            } else {
                warn!(code = ?self.code, "Request rejected: {}", self.message);
            }

            (status, Json(ErrorResponse::from(&self))).into_response()
        }
    }
}
