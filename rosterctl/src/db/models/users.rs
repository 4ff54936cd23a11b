//! Database models for users.

use crate::api::models::users::Role;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A full user row. `password_hash` and `refresh_token` never leave the
/// store boundary; API responses are built from this via
/// [`crate::api::models::users::UserResponse`].
#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub refresh_token: Option<String>,
    pub address: Option<String>,
    pub state: String,
    pub city: String,
    pub country: String,
    pub pincode: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Store request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password_hash: String,
    pub role: Role,
    pub address: Option<String>,
    pub state: String,
    pub city: String,
    pub country: String,
    pub pincode: String,
    pub profile_image: Option<String>,
}

/// Store request for updating a user. `None` fields are left unchanged.
///
/// The role is deliberately absent: it is set at creation and immutable
/// through the update path.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
    pub profile_image: Option<String>,
}
