//! API request/response models for users.

use super::pagination::{PageInfo, Pagination};
use crate::db::models::users::UserRecord;
use crate::errors::{Error, FieldError, Result};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

// Role enum - admins manage the roster, everyone else only manages themselves
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

/// Whitelisted sort columns for user listing. Arbitrary column names never
/// reach the query builder.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Name,
    Email,
    #[default]
    CreatedAt,
    State,
    City,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Name => "name",
            SortField::Email => "email",
            SortField::CreatedAt => "created_at",
            SortField::State => "state",
            SortField::City => "city",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

// User response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub address: Option<String>,
    pub state: String,
    pub city: String,
    pub country: String,
    pub pincode: String,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            role: record.role,
            address: record.address,
            state: record.state,
            city: record.city,
            country: record.country,
            pincode: record.pincode,
            profile_image: record.profile_image,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// The authenticated caller, as resolved from an access token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: Role,
    pub profile_image: Option<String>,
}

impl From<UserRecord> for CurrentUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            phone: record.phone,
            role: record.role,
            profile_image: record.profile_image,
        }
    }
}

/// Partial user update. Absent fields are left unchanged. The role is not
/// part of this model on purpose: it is assigned at creation only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub pincode: Option<String>,
}

impl UserUpdate {
    /// Validate the fields that were supplied, field by field.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if let Some(name) = &self.name {
            super::auth::validate_name(name, &mut errors);
        }
        if let Some(email) = &self.email
            && !super::auth::is_valid_email(email)
        {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }
        if let Some(phone) = &self.phone
            && !super::auth::is_digits(phone, 10, 15)
        {
            errors.push(FieldError::new("phone", "Phone must be 10-15 digits"));
        }
        if let Some(state) = &self.state
            && state.trim().is_empty()
        {
            errors.push(FieldError::new("state", "State cannot be empty"));
        }
        if let Some(city) = &self.city
            && city.trim().is_empty()
        {
            errors.push(FieldError::new("city", "City cannot be empty"));
        }
        if let Some(country) = &self.country
            && country.trim().is_empty()
        {
            errors.push(FieldError::new("country", "Country cannot be empty"));
        }
        if let Some(pincode) = &self.pincode
            && !super::auth::is_digits(pincode, 4, 10)
        {
            errors.push(FieldError::new("pincode", "Pincode must be 4-10 digits"));
        }
        if let Some(address) = &self.address
            && address.chars().count() > 150
        {
            errors.push(FieldError::new("address", "Address must not exceed 150 characters"));
        }

        if errors.is_empty() { Ok(()) } else { Err(Error::Validation { errors }) }
    }
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListUsersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Sort column (default: created_at)
    pub sort: Option<SortField>,

    /// Sort direction (default: desc)
    pub order: Option<SortOrder>,

    /// Case-insensitive substring match against name or email
    pub search: Option<String>,

    /// Case-insensitive substring filter on the state field
    pub state: Option<String>,

    /// Case-insensitive substring filter on the city field
    pub city: Option<String>,
}

/// One page of users plus pagination metadata.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserListData {
    pub users: Vec<UserResponse>,
    pub pagination: PageInfo,
}

/// Single-user payload, wrapped the way the frontend expects.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserData {
    pub user: UserResponse,
}
