// Error handling types for the API

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::fmt;
use tracing::error;

use super::validation::ValidationResult;

/// API error types
///
/// Conflict variants (`DuplicateEmail`, `EmailConflict`, `LinkConflict`) are
/// advisory: they surface a message to the caller and leave stored state
/// untouched. None of these is fatal to the process.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    InternalServer(String),
    DatabaseError(sqlx::Error),
    ValidationError(String),
    /// Email/password pair did not match any account.
    InvalidCredentials,
    /// Password change rejected because the current password check failed.
    CurrentPasswordMismatch,
    /// Signup or profile edit against an email another account already owns.
    DuplicateEmail,
    /// OAuth create path found the profile email registered to another account.
    EmailConflict,
    /// OAuth link path found the (provider, external id) pair already claimed.
    /// Carries the provider display name for the advisory message.
    LinkConflict(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ApiError::InternalServer(msg) => write!(f, "Internal Server Error: {}", msg),
            ApiError::DatabaseError(e) => write!(f, "Database Error: {}", e),
            ApiError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Invalid email or password"),
            ApiError::CurrentPasswordMismatch => write!(f, "Current password does not match"),
            ApiError::DuplicateEmail => {
                write!(f, "Account with that email address already exists")
            }
            ApiError::EmailConflict => {
                write!(f, "Email already registered under a different account")
            }
            ApiError::LinkConflict(provider) => {
                write!(f, "{} account already linked to a different account", provider)
            }
        }
    }
}

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_message, code) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg, "UNAUTHORIZED"),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg, "BAD_REQUEST"),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg, "NOT_FOUND"),
            ApiError::InternalServer(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                msg,
                "INTERNAL_SERVER_ERROR",
            ),
            ApiError::DatabaseError(e) => {
                error!(error = %e, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database operation failed".to_string(),
                    "DATABASE_ERROR",
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg, "VALIDATION_ERROR"),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid email or password".to_string(),
                "INVALID_CREDENTIALS",
            ),
            ApiError::CurrentPasswordMismatch => (
                StatusCode::BAD_REQUEST,
                "Current password does not match".to_string(),
                "CURRENT_PASSWORD_MISMATCH",
            ),
            ApiError::DuplicateEmail => (
                StatusCode::CONFLICT,
                "Account with that email address already exists".to_string(),
                "DUPLICATE_EMAIL",
            ),
            ApiError::EmailConflict => (
                StatusCode::CONFLICT,
                "There is already an account using this email address. Sign in to that \
                 account and link it manually from Account Settings."
                    .to_string(),
                "EMAIL_CONFLICT",
            ),
            ApiError::LinkConflict(provider) => (
                StatusCode::CONFLICT,
                format!(
                    "There is already a {} account that belongs to you. Sign in with that \
                     account or delete it, then link it with your current account.",
                    provider
                ),
                "LINK_CONFLICT",
            ),
        };

        let error_response = ErrorResponse {
            error: error_message,
            code: code.to_string(),
        };

        (status, Json(error_response)).into_response()
    }
}

/// Helper function to convert ValidationResult to ApiError
impl From<ValidationResult> for ApiError {
    fn from(result: ValidationResult) -> Self {
        if result.is_valid {
            ApiError::InternalServer(
                "Validation result was valid but converted to error".to_string(),
            )
        } else {
            let error_messages: Vec<String> = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            ApiError::ValidationError(error_messages.join(", "))
        }
    }
}

/// Maps a sqlx error onto the taxonomy: unique-constraint violations on the
/// email column become `DuplicateEmail`, everything else stays a generic
/// persistence failure.
pub fn map_unique_email_violation(e: sqlx::Error) -> ApiError {
    if is_unique_violation(&e) {
        ApiError::DuplicateEmail
    } else {
        ApiError::DatabaseError(e)
    }
}

/// True when the error is the store rejecting a uniqueness invariant,
/// e.g. the loser of a check-then-act race on email or (provider, id).
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
