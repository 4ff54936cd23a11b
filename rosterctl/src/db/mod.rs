//! Database layer for data persistence and access.
//!
//! The credential store is expressed as the [`store::UserStore`] trait so the
//! HTTP layer depends only on the operations the application actually needs:
//! lookups by id / email / phone, creation, updates, deletion, filtered
//! listing, and the refresh-token mutations (overwrite and compare-and-swap
//! rotation). The production implementation is [`postgres::PgUserStore`],
//! backed by SQLx and a PostgreSQL pool; every mutation is a single SQL
//! statement so per-record atomicity comes from the database itself.
//!
//! # Modules
//!
//! - [`store`]: the `UserStore` trait and list filter types
//! - [`postgres`]: SQLx/PostgreSQL implementation
//! - [`models`]: database record structures and create/update requests
//! - [`errors`]: database-specific error types
//!
//! # Migrations
//!
//! Database migrations are managed by SQLx and located in the `migrations/`
//! directory. The [`crate::migrator`] function provides access to the migrator.

pub mod errors;
pub mod models;
pub mod postgres;
pub mod store;

pub use postgres::PgUserStore;
pub use store::{UserFilter, UserStore};
