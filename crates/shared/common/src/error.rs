//! Unified error handling for HTTP.
//!
//! Provides a single error type that converts into an Axum response with a
//! stable machine-readable code, a fixed status and a JSON body.

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::DomainError;
use serde::Serialize;
use thiserror::Error;

/// Per-field error messages, keyed by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Application error types.
#[derive(Error, Debug)]
pub enum AppError {
    // Malformed input caught before business logic
    #[error("{message}")]
    InvalidRequest {
        message: String,
        fields: Option<FieldErrors>,
    },

    // Business-rule input failures
    #[error("{message}")]
    Validation {
        message: String,
        fields: Option<FieldErrors>,
    },

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Request timed out")]
    Timeout,

    // External service errors
    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    // Internal
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body for HTTP
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<FieldErrors>,
}

impl AppError {
    /// Get error code for client
    pub fn code(&self) -> &'static str {
        match self {
            AppError::InvalidRequest { .. } => "invalid_request",
            AppError::Validation { .. } => "validation_error",
            AppError::InvalidEmail => "invalid_email",
            AppError::EmailAlreadyExists => "conflict",
            AppError::UserNotFound => "not_found",
            AppError::InvalidPassword => "invalid_password",
            AppError::Timeout => "request_timeout",
            #[cfg(feature = "database")]
            AppError::Database(_) => "internal_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidRequest { .. }
            | AppError::Validation { .. }
            | AppError::InvalidEmail => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists => StatusCode::CONFLICT,
            AppError::UserNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidPassword => StatusCode::UNAUTHORIZED,
            AppError::Timeout => StatusCode::REQUEST_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// True for failures the client cannot fix (store, hashing, bugs).
    pub fn is_internal(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            #[cfg(feature = "database")]
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        }
    }

    fn fields(&self) -> Option<FieldErrors> {
        match self {
            AppError::InvalidRequest { fields, .. } | AppError::Validation { fields, .. } => {
                fields.clone()
            }
            _ => None,
        }
    }
}

// =============================================================================
// HTTP Response (Axum)
// =============================================================================

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if !self.is_internal() {
            tracing::debug!(code = self.code(), "request rejected: {}", self);
        }

        let body = ErrorResponse {
            error: self.code(),
            message: self.user_message(),
            fields: self.fields(),
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Domain Error Conversion
// =============================================================================

impl From<DomainError> for AppError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => AppError::validation(msg),
            DomainError::InvalidEmail => AppError::InvalidEmail,
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::UserNotFound)
    }
}

/// Adds context to store-level failures while passing business errors through.
pub trait ResultExt<T> {
    fn context(self, what: &str) -> AppResult<T>;
}

impl<T> ResultExt<T> for AppResult<T> {
    fn context(self, what: &str) -> AppResult<T> {
        self.map_err(|err| err.with_context(what))
    }
}

impl AppError {
    /// Prefix store/internal failures with what was being attempted.
    pub fn with_context(self, what: &str) -> Self {
        match self {
            #[cfg(feature = "database")]
            AppError::Database(e) => AppError::Internal(format!("{}: {}", what, e)),
            AppError::Internal(msg) => AppError::Internal(format!("{}: {}", what, msg)),
            other => other,
        }
    }
}

/// Convenience constructors
impl AppError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        AppError::InvalidRequest {
            message: msg.into(),
            fields: None,
        }
    }

    pub fn invalid_request_fields(msg: impl Into<String>, fields: FieldErrors) -> Self {
        AppError::InvalidRequest {
            message: msg.into(),
            fields: Some(fields),
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation {
            message: msg.into(),
            fields: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
