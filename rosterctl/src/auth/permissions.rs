//! Declarative role requirements for protected routes.
//!
//! A handler states what it needs in its signature instead of branching on
//! the role inline:
//!
//! ```ignore
//! async fn list_users(gate: RequiresRole<role::Admin>, ...) -> ... {
//!     let admin = gate.user;
//!     ...
//! }
//! ```
//!
//! Extraction authenticates first (401 on a missing/invalid access token) and
//! only then evaluates the role requirement (403). The two failures are
//! distinct on purpose and must stay that way.

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::{Error, Result},
};

/// A set of roles that may perform an operation, expressed as a type so it
/// can appear in a handler signature.
pub trait RoleRequirement {
    /// Roles that satisfy this requirement.
    fn allowed() -> &'static [Role];
}

/// Marker types naming the role sets used by the API.
pub mod role {
    /// Admin-only operations (user management).
    pub struct Admin;
    /// Any authenticated user.
    pub struct Any;
}

impl RoleRequirement for role::Admin {
    fn allowed() -> &'static [Role] {
        &[Role::Admin]
    }
}

impl RoleRequirement for role::Any {
    fn allowed() -> &'static [Role] {
        &[Role::Admin, Role::User]
    }
}

/// Pure predicate behind the extractor: is `role` in the allowed set?
pub fn role_allows(role: Role, allowed: &[Role]) -> bool {
    allowed.contains(&role)
}

/// Extractor that authenticates the caller and enforces a role requirement.
pub struct RequiresRole<R: RoleRequirement> {
    pub user: CurrentUser,
    _requirement: PhantomData<R>,
}

impl<R: RoleRequirement> FromRequestParts<AppState> for RequiresRole<R> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Authentication first; a failure here is 401, never 403
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if !role_allows(user.role, R::allowed()) {
            return Err(Error::Forbidden { required: R::allowed() });
        }

        Ok(Self {
            user,
            _requirement: PhantomData,
        })
    }
}
