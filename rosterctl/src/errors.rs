use crate::api::models::users::Role;
use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

/// A single field-level validation failure, reported back to the client in
/// the `errors` array of the response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(ThisError, Debug)]
pub enum Error {
    /// Malformed input, reported field by field
    #[error("Validation failed")]
    Validation { errors: Vec<FieldError> },

    /// Email or phone already taken by another account
    #[error("User with this email or phone already exists")]
    DuplicateIdentity,

    /// Unknown account or password mismatch. One variant for both so the
    /// response never reveals which accounts exist.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Refresh token that is malformed, expired, or revoked by rotation.
    /// The same variant covers all three so a caller cannot tell them apart.
    #[error("Invalid refresh token")]
    InvalidToken,

    /// Authentication required but not provided, or access token invalid
    #[error("Not authenticated")]
    Unauthenticated { message: Option<String> },

    /// Authenticated identity lacks the required role
    #[error("Insufficient permissions")]
    Forbidden { required: &'static [Role] },

    /// Requested resource not found
    #[error("{resource} not found")]
    NotFound { resource: &'static str, id: String },

    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Uploaded payload exceeds the configured size limit
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } | Error::DuplicateIdentity | Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials | Error::InvalidToken | Error::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Internal { .. } | Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::Validation { .. } => "Validation failed".to_string(),
            Error::DuplicateIdentity => "User with this email or phone already exists".to_string(),
            Error::InvalidCredentials => "Invalid credentials".to_string(),
            Error::InvalidToken => "Invalid refresh token".to_string(),
            Error::Unauthenticated { message } => message.clone().unwrap_or_else(|| "Authentication required".to_string()),
            Error::Forbidden { required } => {
                let roles: Vec<&str> = required.iter().map(Role::as_str).collect();
                format!("Requires one of the following roles: {}", roles.join(", "))
            }
            Error::NotFound { resource, .. } => format!("{resource} not found"),
            Error::BadRequest { message } => message.clone(),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::Internal { .. } | Error::Other(_) => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { constraint, .. } => match constraint.as_deref() {
                    Some(c) if c.contains("email") || c.contains("phone") => {
                        "User with this email or phone already exists".to_string()
                    }
                    _ => "Resource already exists".to_string(),
                },
                DbError::Other(_) => "Internal server error".to_string(),
            },
        }
    }

    /// Field errors to include in the response envelope, if any
    fn field_errors(&self) -> Option<&[FieldError]> {
        match self {
            Error::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Unauthenticated { .. } | Error::Forbidden { .. } | Error::InvalidCredentials | Error::InvalidToken => {
                tracing::info!("Authorization error: {}", self);
            }
            Error::Database(_) | Error::DuplicateIdentity => {
                tracing::warn!("Constraint error: {}", self);
            }
            Error::Validation { .. } | Error::BadRequest { .. } | Error::NotFound { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();

        let mut body = serde_json::json!({
            "success": false,
            "message": self.user_message(),
        });
        if let Some(errors) = self.field_errors() {
            body["errors"] = serde_json::json!(errors);
        }

        (status, axum::response::Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
