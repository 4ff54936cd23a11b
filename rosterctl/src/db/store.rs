//! The credential store interface consumed by the authentication flow and
//! the user management API.
//!
//! Every method is a single logical operation that the backing store must
//! make atomic per record. [`UserStore::rotate_refresh_token`] is the
//! compare-and-swap that makes refresh-token rotation safe under concurrent
//! use: of two racing refresh calls that both read the same stored token,
//! exactly one swap succeeds and the loser observes `false`.

use crate::api::models::users::{SortField, SortOrder};
use crate::db::errors::Result;
use crate::db::models::users::{UserCreateDBRequest, UserRecord, UserUpdateDBRequest};
use crate::types::UserId;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub skip: i64,
    pub limit: i64,
    pub sort: SortField,
    pub order: SortOrder,
    /// Case-insensitive substring match against name or email
    pub search: Option<String>,
    /// Case-insensitive substring match against the state field
    pub state: Option<String>,
    /// Case-insensitive substring match against the city field
    pub city: Option<String>,
}

#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    /// Create a new user. Fails with `DbError::UniqueViolation` if the email
    /// or phone is already taken.
    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserRecord>;

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>>;

    /// Look a user up by email or phone. Callers pass whichever locator the
    /// client supplied; a `None` locator never matches.
    async fn find_by_email_or_phone(&self, email: Option<&str>, phone: Option<&str>) -> Result<Option<UserRecord>>;

    /// Partial update. Fails with `DbError::NotFound` if the user does not
    /// exist, `DbError::UniqueViolation` if a changed email/phone collides
    /// with another account.
    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserRecord>;

    /// Delete a user. Returns whether a record was removed.
    async fn delete(&self, id: UserId) -> Result<bool>;

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>>;

    /// Number of users matching the filter, ignoring pagination.
    async fn count(&self, filter: &UserFilter) -> Result<i64>;

    /// Overwrite the stored refresh token (login/register), or clear it
    /// (logout). Fails with `DbError::NotFound` for a nonexistent user.
    async fn set_refresh_token(&self, id: UserId, token: Option<&str>) -> Result<()>;

    /// Atomically replace the stored refresh token, but only if it still
    /// equals `current`. Returns `false` when the comparison fails - the
    /// presented token was already rotated out, revoked by logout, or the
    /// user no longer exists.
    async fn rotate_refresh_token(&self, id: UserId, current: &str, replacement: &str) -> Result<bool>;
}
