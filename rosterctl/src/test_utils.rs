//! Shared helpers for tests: an in-memory credential store and constructors
//! for a fully wired test server.
//!
//! The in-memory store exists only under `cfg(test)`; production always runs
//! against PostgreSQL, where the durable record is the single source of truth
//! for session state. It mirrors the store contract precisely, including the
//! uniqueness violations and compare-and-swap rotation semantics, because the
//! handler tests depend on them.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use chrono::Utc;
use uuid::Uuid;

use crate::{
    AppState, build_router,
    api::models::users::{Role, SortField, SortOrder},
    auth::{password, tokens},
    config::Config,
    db::errors::{DbError, Result},
    db::models::users::{UserCreateDBRequest, UserRecord, UserUpdateDBRequest},
    db::store::{UserFilter, UserStore},
    types::UserId,
    uploads::UploadStore,
};

/// All test users share one password so the expensive Argon2 hash is
/// computed once per test process.
pub const TEST_PASSWORD: &str = "abc123";

static TEST_PASSWORD_HASH: OnceLock<String> = OnceLock::new();

pub fn test_password_hash() -> String {
    TEST_PASSWORD_HASH
        .get_or_init(|| password::hash_string(TEST_PASSWORD).expect("hashing test password"))
        .clone()
}

/// In-memory implementation of [`UserStore`].
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<UserId, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn unique_violation(constraint: &str) -> DbError {
    DbError::UniqueViolation {
        constraint: Some(constraint.to_string()),
        table: Some("users".to_string()),
        message: format!("duplicate key value violates unique constraint \"{constraint}\""),
    }
}

fn matches_filter(user: &UserRecord, filter: &UserFilter) -> bool {
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        let needle = search.to_lowercase();
        if !user.name.to_lowercase().contains(&needle) && !user.email.to_lowercase().contains(&needle) {
            return false;
        }
    }
    if let Some(state) = filter.state.as_deref().filter(|s| !s.is_empty())
        && !user.state.to_lowercase().contains(&state.to_lowercase())
    {
        return false;
    }
    if let Some(city) = filter.city.as_deref().filter(|s| !s.is_empty())
        && !user.city.to_lowercase().contains(&city.to_lowercase())
    {
        return false;
    }
    true
}

#[async_trait::async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserRecord> {
        let mut users = self.users.lock().unwrap();

        if users.values().any(|u| u.email == request.email) {
            return Err(unique_violation("users_email_key"));
        }
        if users.values().any(|u| u.phone == request.phone) {
            return Err(unique_violation("users_phone_key"));
        }

        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone(),
            password_hash: request.password_hash.clone(),
            role: request.role,
            refresh_token: None,
            address: request.address.clone(),
            state: request.state.clone(),
            city: request.city.clone(),
            country: request.country.clone(),
            pincode: request.pincode.clone(),
            profile_image: request.profile_image.clone(),
            created_at: now,
            updated_at: now,
        };

        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email_or_phone(&self, email: Option<&str>, phone: Option<&str>) -> Result<Option<UserRecord>> {
        let users = self.users.lock().unwrap();
        Ok(users
            .values()
            .find(|u| {
                email.is_some_and(|e| u.email == e) || phone.is_some_and(|p| u.phone == p)
            })
            .cloned())
    }

    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserRecord> {
        let mut users = self.users.lock().unwrap();

        if let Some(email) = &request.email
            && users.values().any(|u| u.id != id && &u.email == email)
        {
            return Err(unique_violation("users_email_key"));
        }
        if let Some(phone) = &request.phone
            && users.values().any(|u| u.id != id && &u.phone == phone)
        {
            return Err(unique_violation("users_phone_key"));
        }

        let user = users.get_mut(&id).ok_or(DbError::NotFound)?;

        if let Some(name) = &request.name {
            user.name = name.clone();
        }
        if let Some(email) = &request.email {
            user.email = email.clone();
        }
        if let Some(phone) = &request.phone {
            user.phone = phone.clone();
        }
        if let Some(address) = &request.address {
            user.address = Some(address.clone());
        }
        if let Some(state) = &request.state {
            user.state = state.clone();
        }
        if let Some(city) = &request.city {
            user.city = city.clone();
        }
        if let Some(country) = &request.country {
            user.country = country.clone();
        }
        if let Some(pincode) = &request.pincode {
            user.pincode = pincode.clone();
        }
        if let Some(profile_image) = &request.profile_image {
            user.profile_image = Some(profile_image.clone());
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        Ok(self.users.lock().unwrap().remove(&id).is_some())
    }

    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>> {
        let users = self.users.lock().unwrap();
        let mut matching: Vec<UserRecord> = users.values().filter(|u| matches_filter(u, filter)).cloned().collect();

        matching.sort_by(|a, b| {
            let ord = match filter.sort {
                SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                SortField::Email => a.email.to_lowercase().cmp(&b.email.to_lowercase()),
                SortField::CreatedAt => a.created_at.cmp(&b.created_at),
                SortField::State => a.state.to_lowercase().cmp(&b.state.to_lowercase()),
                SortField::City => a.city.to_lowercase().cmp(&b.city.to_lowercase()),
            };
            match filter.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        Ok(matching
            .into_iter()
            .skip(filter.skip.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, filter: &UserFilter) -> Result<i64> {
        let users = self.users.lock().unwrap();
        Ok(users.values().filter(|u| matches_filter(u, filter)).count() as i64)
    }

    async fn set_refresh_token(&self, id: UserId, token: Option<&str>) -> Result<()> {
        let mut users = self.users.lock().unwrap();
        let user = users.get_mut(&id).ok_or(DbError::NotFound)?;
        user.refresh_token = token.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn rotate_refresh_token(&self, id: UserId, current: &str, replacement: &str) -> Result<bool> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };
        if user.refresh_token.as_deref() != Some(current) {
            return Ok(false);
        }
        user.refresh_token = Some(replacement.to_string());
        user.updated_at = Utc::now();
        Ok(true)
    }
}

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        uploads: crate::config::UploadConfig {
            dir: std::env::temp_dir().join("rosterctl-test-uploads"),
            max_file_size: 1024 * 1024,
        },
        ..Default::default()
    }
}

pub fn create_test_state() -> AppState {
    let config = create_test_config();
    let store: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
    AppState::builder()
        .store(store)
        .uploads(UploadStore::new(&config.uploads))
        .config(config)
        .build()
}

pub fn create_test_server() -> axum_test::TestServer {
    let (server, _state) = create_test_server_with_state();
    server
}

pub fn create_test_server_with_state() -> (axum_test::TestServer, AppState) {
    let state = create_test_state();
    let router = build_router(state.clone()).expect("building test router");
    (axum_test::TestServer::new(router).expect("creating test server"), state)
}

/// Insert a user directly into the store, bypassing the HTTP layer.
pub async fn insert_test_user(state: &AppState, email: &str, phone: &str, role: Role) -> UserRecord {
    state
        .store
        .create(&UserCreateDBRequest {
            name: "Test User".to_string(),
            email: email.to_string(),
            phone: phone.to_string(),
            password_hash: test_password_hash(),
            role,
            address: None,
            state: "California".to_string(),
            city: "Springfield".to_string(),
            country: "USA".to_string(),
            pincode: "90210".to_string(),
            profile_image: None,
        })
        .await
        .expect("inserting test user")
}

/// Seed an admin and mint an access token for them.
pub async fn admin_token(state: &AppState) -> String {
    let admin = insert_test_user(state, "admin@test.com", "9999999999", Role::Admin).await;
    tokens::create_access_token(admin.id, &state.config).expect("minting admin token")
}

/// Seed a regular user and mint an access token for them.
pub async fn user_token(state: &AppState) -> String {
    let user = insert_test_user(state, "regular@test.com", "8888888888", Role::User).await;
    tokens::create_access_token(user.id, &state.config).expect("minting user token")
}

/// A complete, valid registration body for the given identity.
pub fn register_payload(email: &str, phone: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Test User",
        "email": email,
        "phone": phone,
        "password": TEST_PASSWORD,
        "state": "California",
        "city": "Springfield",
        "country": "USA",
        "pincode": "90210",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rotation_is_compare_and_swap() {
        let store = MemoryUserStore::new();
        let user = store
            .create(&UserCreateDBRequest {
                name: "CAS".to_string(),
                email: "cas@test.com".to_string(),
                phone: "7777777777".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
                address: None,
                state: "s".to_string(),
                city: "c".to_string(),
                country: "n".to_string(),
                pincode: "1234".to_string(),
                profile_image: None,
            })
            .await
            .unwrap();

        store.set_refresh_token(user.id, Some("first")).await.unwrap();

        // Two callers hold "first"; only one swap can win
        assert!(store.rotate_refresh_token(user.id, "first", "second").await.unwrap());
        assert!(!store.rotate_refresh_token(user.id, "first", "third").await.unwrap());

        // The stored value is the winner's
        let record = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(record.refresh_token.as_deref(), Some("second"));

        // After logout nothing rotates
        store.set_refresh_token(user.id, None).await.unwrap();
        assert!(!store.rotate_refresh_token(user.id, "second", "fourth").await.unwrap());
    }

    #[tokio::test]
    async fn test_memory_store_uniqueness() {
        let store = MemoryUserStore::new();
        let request = UserCreateDBRequest {
            name: "One".to_string(),
            email: "dup@test.com".to_string(),
            phone: "6666666666".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            address: None,
            state: "s".to_string(),
            city: "c".to_string(),
            country: "n".to_string(),
            pincode: "1234".to_string(),
            profile_image: None,
        };
        store.create(&request).await.unwrap();

        let err = store.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
