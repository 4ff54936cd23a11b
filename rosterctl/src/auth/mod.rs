//! Authentication and authorization system.
//!
//! # Authentication
//!
//! Clients authenticate with a short-lived, stateless JWT access token sent
//! as `Authorization: Bearer <token>`. Access tokens are verified purely
//! cryptographically - no store lookup decides their validity. A longer-lived
//! refresh token mints new pairs via `/api/auth/refresh`; unlike access
//! tokens it is also persisted on the user record so it can be revoked before
//! its natural expiry. Every refresh rotates the stored token, and every
//! login overwrites it, so there is at most one live session per account.
//!
//! # Authorization
//!
//! Role checks run only after authentication has succeeded: a missing or
//! invalid access token is rejected as 401 inside the [`current_user`]
//! extractor before any role is ever evaluated, while an authenticated user
//! with an insufficient role gets 403 from [`permissions::RequiresRole`].
//!
//! # Modules
//!
//! - [`current_user`]: Extractor for getting the authenticated user in handlers
//! - [`password`]: Password hashing and verification using Argon2
//! - [`permissions`]: Declarative role requirements for protected routes
//! - [`tokens`]: Access/refresh token creation and verification
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use rosterctl::api::models::users::CurrentUser;
//! use rosterctl::auth::permissions::{RequiresRole, role};
//!
//! async fn me(user: CurrentUser) -> ... { ... }
//!
//! async fn admin_only(gate: RequiresRole<role::Admin>) -> ... {
//!     let user = gate.user;
//!     ...
//! }
//! ```

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod tokens;
