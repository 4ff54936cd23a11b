//! # rosterctl: a user-management backend with JWT authentication
//!
//! `rosterctl` is the REST backend of a small admin panel: account
//! registration and login, JWT access/refresh token handling with rotation,
//! and role-gated CRUD over the user roster with pagination, sorting and
//! filtering, plus profile-image uploads.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for
//! the HTTP layer and PostgreSQL (via SQLx) for persistence.
//!
//! ### Request Flow
//!
//! Authentication endpoints (`/api/auth/*`) are public: registration and
//! login verify credentials against the store, then return a short-lived
//! access token together with a refresh token that is also persisted on the
//! user record. Every other `/api` endpoint expects the access token as an
//! `Authorization: Bearer` header; the [`auth::current_user`] extractor
//! verifies it cryptographically and resolves the caller, and the
//! [`auth::permissions::RequiresRole`] extractor then enforces the role the
//! route demands. User management is admin-only.
//!
//! Refresh tokens rotate: `/api/auth/refresh` accepts the persisted token
//! exactly once, atomically replacing it with a new one. Logging in again
//! also replaces it, which keeps one active session per account, and logout
//! clears it.
//!
//! ### Core Components
//!
//! - [`api`]: route handlers and request/response models
//! - [`auth`]: token issuance/verification, password hashing, role gates
//! - [`db`]: the [`db::UserStore`] trait and its PostgreSQL implementation
//! - [`uploads`]: profile image storage, served back at `/uploads/*`
//! - [`config`]: YAML + environment configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use rosterctl::{Application, Config, telemetry};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = rosterctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
mod openapi;
pub mod telemetry;
mod types;
pub mod uploads;

#[cfg(test)]
pub mod test_utils;

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    routing::get,
    routing::post,
};
use bon::Builder;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{info, instrument, warn, Level};
use utoipa::OpenApi;

use crate::api::models::users::Role;
use crate::db::models::users::UserCreateDBRequest;
use crate::db::{PgUserStore, UserStore};
use crate::openapi::ApiDoc;
use crate::uploads::UploadStore;

pub use config::Config;
pub use types::UserId;

/// Application state shared across all request handlers.
///
/// - `store`: the credential store (PostgreSQL in production)
/// - `config`: application configuration loaded from file/environment
/// - `uploads`: profile image storage
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn UserStore>,
    pub config: Config,
    pub uploads: UploadStore,
}

/// Get the rosterctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial admin user if it doesn't exist.
///
/// Idempotent: if an account with the configured admin email already exists
/// it is left untouched. Skipped entirely when no admin password is
/// configured, since a passwordless account could never log in.
///
/// Returns the user ID of the created or existing admin user, if any.
#[instrument(skip_all)]
pub async fn create_initial_admin_user(config: &Config, store: &dyn UserStore) -> errors::Result<Option<UserId>> {
    let Some(password) = config.admin_password.as_deref() else {
        warn!("No admin_password configured; skipping initial admin user creation");
        return Ok(None);
    };

    if let Some(existing) = store.find_by_email_or_phone(Some(&config.admin_email), None).await? {
        return Ok(Some(existing.id));
    }

    let password_hash = auth::password::hash_string(password)?;
    let created = store
        .create(&UserCreateDBRequest {
            name: "Administrator".to_string(),
            email: config.admin_email.clone(),
            phone: config.admin_phone.clone(),
            password_hash,
            role: Role::Admin,
            address: None,
            state: String::new(),
            city: String::new(),
            country: String::new(),
            pincode: String::new(),
            profile_image: None,
        })
        .await?;

    info!("Created initial admin user {}", config.admin_email);
    Ok(Some(created.id))
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    for origin in &config.cors.allowed_origins {
        origins.push(origin.parse::<HeaderValue>()?);
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(config.cors.allow_credentials)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Build the main application router with all endpoints and middleware.
///
/// - Authentication routes (register, login, refresh, logout, me)
/// - Admin user-management routes
/// - Static serving of uploaded profile images
/// - Health check and OpenAPI document
/// - CORS and tracing middleware
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;
    let uploads_dir = state.config.uploads.dir.clone();
    // Room for the image plus the other multipart form fields
    let body_limit = (state.config.uploads.max_file_size + 64 * 1024) as usize;

    let auth_routes = Router::new()
        .route("/api/auth/register", post(api::handlers::auth::register))
        .route("/api/auth/login", post(api::handlers::auth::login))
        .route("/api/auth/refresh", post(api::handlers::auth::refresh))
        .route("/api/auth/logout", post(api::handlers::auth::logout))
        .route("/api/auth/me", get(api::handlers::auth::me));

    let user_routes = Router::new().route("/api/users", get(api::handlers::users::list_users)).route(
        "/api/users/{id}",
        get(api::handlers::users::get_user)
            .put(api::handlers::users::update_user)
            .delete(api::handlers::users::delete_user),
    );

    let router = Router::new()
        .route(
            "/api/health",
            get(|| async { Json(serde_json::json!({"status": "OK", "message": "Server is running"})) }),
        )
        .route("/api/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(auth_routes)
        .merge(user_routes)
        .nest_service("/uploads", ServeDir::new(uploads_dir))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state);

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects to PostgreSQL, runs
///    migrations, seeds the initial admin user and builds the router
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = PgPool::connect(&config.database_url).await?;
        migrator().run(&pool).await?;

        tokio::fs::create_dir_all(&config.uploads.dir).await?;

        let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool.clone()));
        create_initial_admin_user(&config, store.as_ref()).await?;

        let state = AppState::builder()
            .store(store)
            .config(config.clone())
            .uploads(UploadStore::new(&config.uploads))
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "rosterctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router).with_graceful_shutdown(shutdown).await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}
