//! Database record models matching table schemas.
//!
//! Database models are distinct from API models so storage and API
//! representations can evolve independently; in particular the password hash
//! and the stored refresh token exist only on the database side and are
//! never serialized into a response.

pub mod users;
