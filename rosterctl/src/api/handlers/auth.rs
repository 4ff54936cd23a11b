//! Authentication flow: register, login, token refresh, logout, current user.
//!
//! Session state is a single refresh token persisted per user. Login and
//! registration overwrite it (one active session per account), refresh
//! replaces it with a compare-and-swap (rotation - each refresh token works
//! exactly once), and logout clears it. Credential and token failures are
//! deliberately uniform: the response never distinguishes an unknown account
//! from a wrong password, or an expired refresh token from a revoked one.

use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    api::extract::JsonOrMultipart,
    api::models::{
        auth::{AuthData, CurrentUserData, LoginRequest, RefreshRequest, RegisterRequest, TokenData},
        envelope::ApiEnvelope,
        users::{CurrentUser, Role, UserResponse},
    },
    auth::{
        password,
        tokens::{self, TokenKind},
    },
    db::errors::DbError,
    db::models::users::UserCreateDBRequest,
    db::store::UserStore as _,
    errors::{Error, Result},
};

/// Register a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    tag = "authentication",
    responses(
        (status = 201, description = "User registered successfully", body = AuthData),
        (status = 400, description = "Validation failed or identity already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    body: JsonOrMultipart<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiEnvelope<AuthData>>)> {
    let JsonOrMultipart { payload, image } = body;
    let registration = payload.validate(&state.config)?;

    let profile_image = match &image {
        Some(part) => Some(state.uploads.store_image(part).await?),
        None => None,
    };

    // Hash the password on a blocking thread to avoid blocking the async runtime
    let password = registration.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })??;

    let create_request = UserCreateDBRequest {
        name: registration.name,
        email: registration.email,
        phone: registration.phone,
        password_hash,
        role: Role::User, // registration can never create admins
        address: registration.address,
        state: registration.state,
        city: registration.city,
        country: registration.country,
        pincode: registration.pincode,
        profile_image: profile_image.clone(),
    };

    // Uniqueness of email/phone is the store's constraint, not a pre-read
    let user = match state.store.create(&create_request).await {
        Ok(user) => user,
        Err(e) => {
            if let Some(path) = &profile_image {
                state.uploads.remove(path).await;
            }
            return Err(match e {
                DbError::UniqueViolation { .. } => Error::DuplicateIdentity,
                other => other.into(),
            });
        }
    };

    let access_token = tokens::create_access_token(user.id, &state.config)?;
    let refresh_token = tokens::create_refresh_token(user.id, &state.config)?;
    state.store.set_refresh_token(user.id, Some(refresh_token.as_str())).await?;

    let data = AuthData {
        user: UserResponse::from(user),
        access_token,
        refresh_token,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiEnvelope::with_message("User registered successfully", data)),
    ))
}

/// Login with email or phone and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Login successful", body = AuthData),
        (status = 400, description = "Missing locator or password"),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<ApiEnvelope<AuthData>>> {
    if request.email.is_none() && request.phone.is_none() {
        return Err(Error::BadRequest {
            message: "Please provide either email or phone".to_string(),
        });
    }
    let password = match request.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => password.to_string(),
        None => {
            return Err(Error::BadRequest {
                message: "Password is required".to_string(),
            });
        }
    };

    // Same error for an unknown account and a bad password: no enumeration oracle
    let user = state
        .store
        .find_by_email_or_phone(request.email.as_deref(), request.phone.as_deref())
        .await?
        .ok_or(Error::InvalidCredentials)?;

    // Verify the password on a blocking thread to avoid blocking the async runtime
    let hash = user.password_hash.clone();
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::InvalidCredentials);
    }

    let access_token = tokens::create_access_token(user.id, &state.config)?;
    let refresh_token = tokens::create_refresh_token(user.id, &state.config)?;

    // Overwriting the stored token invalidates any previously issued refresh
    // token: one active session per account
    state.store.set_refresh_token(user.id, Some(refresh_token.as_str())).await?;

    let data = AuthData {
        user: UserResponse::from(user),
        access_token,
        refresh_token,
    };

    Ok(Json(ApiEnvelope::with_message("Login successful", data)))
}

/// Exchange a refresh token for a fresh token pair
#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    request_body = RefreshRequest,
    tag = "authentication",
    responses(
        (status = 200, description = "Tokens refreshed", body = TokenData),
        (status = 400, description = "Refresh token missing"),
        (status = 401, description = "Invalid refresh token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn refresh(State(state): State<AppState>, Json(request): Json<RefreshRequest>) -> Result<Json<ApiEnvelope<TokenData>>> {
    if request.refresh_token.is_empty() {
        return Err(Error::BadRequest {
            message: "Refresh token is required".to_string(),
        });
    }

    let user_id = tokens::verify_token(&request.refresh_token, TokenKind::Refresh, &state.config)?;

    let access_token = tokens::create_access_token(user_id, &state.config)?;
    let refresh_token = tokens::create_refresh_token(user_id, &state.config)?;

    // Compare-and-swap against the presented token. A rotated-out token, a
    // token cleared by logout, a deleted account, or losing a race to a
    // concurrent refresh all land here as a single generic failure.
    let rotated = state.store.rotate_refresh_token(user_id, &request.refresh_token, &refresh_token).await?;
    if !rotated {
        return Err(Error::InvalidToken);
    }

    Ok(Json(ApiEnvelope::data(TokenData {
        access_token,
        refresh_token,
    })))
}

/// Logout: clear the stored refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "authentication",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> Result<Json<ApiEnvelope<()>>> {
    // Unconditional clear; repeating a logout is a no-op, not an error
    state.store.set_refresh_token(user.id, None).await?;

    Ok(Json(ApiEnvelope::message("Logged out successfully")))
}

/// Get the currently authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "authentication",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Current user", body = CurrentUserData),
        (status = 401, description = "Not authenticated"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn me(user: CurrentUser) -> Json<ApiEnvelope<CurrentUserData>> {
    Json(ApiEnvelope::data(CurrentUserData { user }))
}
