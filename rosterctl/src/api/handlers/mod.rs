//! HTTP request handlers for all API endpoints.
//!
//! Each handler is responsible for:
//! - Request validation and deserialization
//! - Authentication and authorization checks (via extractors)
//! - Business logic execution against the credential store
//! - Response serialization into the uniform envelope
//!
//! Handlers return [`crate::errors::Error`] which converts to the
//! appropriate HTTP status code and JSON envelope automatically.

pub mod auth;
pub mod users;
