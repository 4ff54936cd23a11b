//! API request and response data models.
//!
//! These are distinct from the database models in [`crate::db::models`], so
//! the stored shape (password hash, persisted refresh token) can never leak
//! into a response by accident.

pub mod auth;
pub mod envelope;
pub mod pagination;
pub mod users;
