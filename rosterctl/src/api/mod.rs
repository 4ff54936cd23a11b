//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//! - **[`extract`]**: Request extractors shared by handlers
//!
//! # API Structure
//!
//! - **Authentication** (`/api/auth/*`): register, login, token refresh, logout, current user
//! - **Users** (`/api/users/*`): admin-only user management (list/get/update/delete)
//! - **Uploads** (`/uploads/*`): statically served profile images
//!
//! Every response uses the uniform envelope `{success, message?, data?, errors?}`.
//! All endpoints are documented with OpenAPI annotations via `utoipa`; the
//! generated spec is served at `/api/openapi.json`.

pub mod extract;
pub mod handlers;
pub mod models;
