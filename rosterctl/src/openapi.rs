//! OpenAPI documentation configuration.
//!
//! The generated document is served at `/api/openapi.json`.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::api::models::{
    auth::{AuthData, CurrentUserData, LoginRequest, RefreshRequest, RegisterRequest, TokenData},
    pagination::PageInfo,
    users::{CurrentUser, Role, SortField, SortOrder, UserData, UserListData, UserResponse, UserUpdate},
};
use crate::errors::FieldError;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::auth::register,
        crate::api::handlers::auth::login,
        crate::api::handlers::auth::refresh,
        crate::api::handlers::auth::logout,
        crate::api::handlers::auth::me,
        crate::api::handlers::users::list_users,
        crate::api::handlers::users::get_user,
        crate::api::handlers::users::update_user,
        crate::api::handlers::users::delete_user,
    ),
    components(schemas(
        Role,
        SortField,
        SortOrder,
        UserResponse,
        CurrentUser,
        UserUpdate,
        UserData,
        UserListData,
        PageInfo,
        RegisterRequest,
        LoginRequest,
        RefreshRequest,
        AuthData,
        TokenData,
        CurrentUserData,
        FieldError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Registration, login, token refresh and logout"),
        (name = "users", description = "Admin-only user management"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}
