//! Admin-only user management: list, get, update, delete.
//!
//! Every route requires the `admin` role via [`RequiresRole`]; an
//! unauthenticated caller gets 401 before the role is ever looked at, an
//! authenticated non-admin gets 403.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use uuid::Uuid;

use crate::{
    AppState,
    api::extract::JsonOrMultipart,
    api::models::{
        envelope::ApiEnvelope,
        pagination::PageInfo,
        users::{ListUsersQuery, UserData, UserListData, UserResponse, UserUpdate},
    },
    auth::permissions::{RequiresRole, role},
    db::errors::DbError,
    db::models::users::UserUpdateDBRequest,
    db::store::{UserFilter, UserStore as _},
    errors::{Error, Result},
};

/// List users with pagination, sorting and filtering
#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    params(ListUsersQuery),
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "One page of users", body = UserListData),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires the admin role"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(
    State(state): State<AppState>,
    _gate: RequiresRole<role::Admin>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiEnvelope<UserListData>>> {
    let (page, limit) = (query.pagination.page(), query.pagination.limit());

    let filter = UserFilter {
        skip: query.pagination.skip(),
        limit,
        sort: query.sort.unwrap_or_default(),
        order: query.order.unwrap_or_default(),
        search: query.search,
        state: query.state,
        city: query.city,
    };

    let users = state.store.list(&filter).await?;
    let total = state.store.count(&filter).await?;

    let data = UserListData {
        users: users.into_iter().map(UserResponse::from).collect(),
        pagination: PageInfo::new(page, limit, total),
    };

    Ok(Json(ApiEnvelope::data(data)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "The user", body = UserData),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires the admin role"),
        (status = 404, description = "No such user"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn get_user(
    State(state): State<AppState>,
    _gate: RequiresRole<role::Admin>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<UserData>>> {
    let user = state.store.find_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User",
        id: id.to_string(),
    })?;

    Ok(Json(ApiEnvelope::data(UserData { user: user.into() })))
}

/// Update a user's profile fields and optionally replace their profile image
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UserUpdate,
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "User updated successfully", body = UserData),
        (status = 400, description = "Validation failed or email/phone already taken"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires the admin role"),
        (status = 404, description = "No such user"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn update_user(
    State(state): State<AppState>,
    _gate: RequiresRole<role::Admin>,
    Path(id): Path<Uuid>,
    body: JsonOrMultipart<UserUpdate>,
) -> Result<Json<ApiEnvelope<UserData>>> {
    let JsonOrMultipart { payload: request, image } = body;
    request.validate()?;

    let existing = state.store.find_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User",
        id: id.to_string(),
    })?;

    let new_image = match &image {
        Some(part) => Some(state.uploads.store_image(part).await?),
        None => None,
    };

    let update = UserUpdateDBRequest {
        name: request.name.map(|n| n.trim().to_string()),
        email: request.email,
        phone: request.phone,
        address: request.address,
        state: request.state,
        city: request.city,
        country: request.country,
        pincode: request.pincode,
        profile_image: new_image.clone(),
    };

    let updated = match state.store.update(id, &update).await {
        Ok(user) => user,
        Err(e) => {
            // The record did not change; do not leave the new file orphaned
            if let Some(path) = &new_image {
                state.uploads.remove(path).await;
            }
            return Err(match e {
                DbError::UniqueViolation { .. } => Error::DuplicateIdentity,
                DbError::NotFound => Error::NotFound {
                    resource: "User",
                    id: id.to_string(),
                },
                other => other.into(),
            });
        }
    };

    // A replaced image leaves its predecessor behind; clean it up
    if new_image.is_some()
        && let Some(old) = existing.profile_image.as_deref()
        && updated.profile_image.as_deref() != Some(old)
    {
        state.uploads.remove(old).await;
    }

    Ok(Json(ApiEnvelope::with_message(
        "User updated successfully",
        UserData { user: updated.into() },
    )))
}

/// Delete a user and their stored profile image
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    tag = "users",
    params(("id" = Uuid, Path, description = "User ID")),
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "User deleted successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Requires the admin role"),
        (status = 404, description = "No such user"),
    )
)]
#[tracing::instrument(skip_all, fields(user_id = %id))]
pub async fn delete_user(
    State(state): State<AppState>,
    _gate: RequiresRole<role::Admin>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiEnvelope<()>>> {
    let user = state.store.find_by_id(id).await?.ok_or_else(|| Error::NotFound {
        resource: "User",
        id: id.to_string(),
    })?;

    state.store.delete(id).await?;

    if let Some(image) = user.profile_image.as_deref() {
        state.uploads.remove(image).await;
    }

    Ok(Json(ApiEnvelope::message("User deleted successfully")))
}
