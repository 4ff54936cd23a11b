//! PostgreSQL-backed credential store.
//!
//! All mutations are single SQL statements, so per-record atomicity is
//! guaranteed by the database: rotation uses a compare-and-swap `UPDATE`
//! whose row count tells the caller whether it won the race, and uniqueness
//! of email/phone is enforced by the table constraints rather than a
//! read-then-insert sequence.

use sqlx::PgPool;
use tracing::instrument;
use uuid::Uuid;

use crate::db::errors::{DbError, Result};
use crate::db::models::users::{UserCreateDBRequest, UserRecord, UserUpdateDBRequest};
use crate::db::store::{UserFilter, UserStore};
use crate::types::{UserId, abbrev_uuid};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Build the WHERE clause and bind values for a list/count query.
/// Placeholders are numbered in the order the returned values are bound.
fn filter_clause(filter: &UserFilter) -> (String, Vec<String>) {
    let mut sql = String::from(" WHERE 1=1");
    let mut binds = Vec::new();

    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        binds.push(format!("%{search}%"));
        let n = binds.len();
        sql.push_str(&format!(" AND (name ILIKE ${n} OR email ILIKE ${n})"));
    }
    if let Some(state) = filter.state.as_deref().filter(|s| !s.is_empty()) {
        binds.push(format!("%{state}%"));
        sql.push_str(&format!(" AND state ILIKE ${}", binds.len()));
    }
    if let Some(city) = filter.city.as_deref().filter(|s| !s.is_empty()) {
        binds.push(format!("%{city}%"));
        sql.push_str(&format!(" AND city ILIKE ${}", binds.len()));
    }

    (sql, binds)
}

#[async_trait::async_trait]
impl UserStore for PgUserStore {
    #[instrument(skip(self, request), fields(email = %request.email), err)]
    async fn create(&self, request: &UserCreateDBRequest) -> Result<UserRecord> {
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            INSERT INTO users (id, name, email, phone, password_hash, role, address, state, city, country, pincode, profile_image)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.password_hash)
        .bind(request.role)
        .bind(&request.address)
        .bind(&request.state)
        .bind(&request.city)
        .bind(&request.country)
        .bind(&request.pincode)
        .bind(&request.profile_image)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[instrument(skip_all, err)]
    async fn find_by_email_or_phone(&self, email: Option<&str>, phone: Option<&str>) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            SELECT * FROM users
            WHERE ($1::text IS NOT NULL AND email = $1)
               OR ($2::text IS NOT NULL AND phone = $2)
            "#,
        )
        .bind(email)
        .bind(phone)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserRecord> {
        let user = sqlx::query_as::<_, UserRecord>(
            r#"
            UPDATE users SET
                name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                address = COALESCE($5, address),
                state = COALESCE($6, state),
                city = COALESCE($7, city),
                country = COALESCE($8, country),
                pincode = COALESCE($9, pincode),
                profile_image = COALESCE($10, profile_image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.phone)
        .bind(&request.address)
        .bind(&request.state)
        .bind(&request.city)
        .bind(&request.country)
        .bind(&request.pincode)
        .bind(&request.profile_image)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&self, filter: &UserFilter) -> Result<Vec<UserRecord>> {
        let (where_clause, binds) = filter_clause(filter);
        // Sort column and direction come from closed enums, never client text
        let query = format!(
            "SELECT * FROM users{} ORDER BY {} {} LIMIT {} OFFSET {}",
            where_clause,
            filter.sort.column(),
            filter.order.sql(),
            filter.limit,
            filter.skip
        );

        let mut sql_query = sqlx::query_as::<_, UserRecord>(&query);
        for bind in &binds {
            sql_query = sql_query.bind(bind);
        }

        let users = sql_query.fetch_all(&self.pool).await?;
        Ok(users)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&self, filter: &UserFilter) -> Result<i64> {
        let (where_clause, binds) = filter_clause(filter);
        let query = format!("SELECT COUNT(*) FROM users{where_clause}");

        let mut sql_query = sqlx::query_scalar::<_, i64>(&query);
        for bind in &binds {
            sql_query = sql_query.bind(bind);
        }

        let total = sql_query.fetch_one(&self.pool).await?;
        Ok(total)
    }

    #[instrument(skip(self, token), fields(user_id = %abbrev_uuid(&id), clearing = token.is_none()), err)]
    async fn set_refresh_token(&self, id: UserId, token: Option<&str>) -> Result<()> {
        let result = sqlx::query("UPDATE users SET refresh_token = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, current, replacement), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn rotate_refresh_token(&self, id: UserId, current: &str, replacement: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users SET refresh_token = $3, updated_at = NOW()
            WHERE id = $1 AND refresh_token = $2
            "#,
        )
        .bind(id)
        .bind(current)
        .bind(replacement)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
