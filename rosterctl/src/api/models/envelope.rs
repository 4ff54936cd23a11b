//! The uniform response envelope used by every endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::FieldError;

/// `{success, message?, data?, errors?}` - the one response shape the
/// frontend knows how to unwrap. Error responses are built by
/// [`crate::errors::Error::into_response`]; handlers only ever construct the
/// success side.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl<T> ApiEnvelope<T> {
    /// Successful response carrying only data
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
            errors: None,
        }
    }

    /// Successful response with a human-readable message alongside the data
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            errors: None,
        }
    }
}

impl ApiEnvelope<()> {
    /// Successful response with no data payload
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
            errors: None,
        }
    }
}
