//! Postgres-backed credential and business stores.
//!
//! ## Error Mapping
//!
//! | PostgreSQL Error Code | StoreError | Scenario |
//! |-----------------------|------------|----------|
//! | `23505` | `Conflict` | Duplicate email (`users_email_key`) |
//! | `23503` | `NotFound` | Business owner no longer exists |
//! | any other / non-database | `Backend` | Connection, decoding, pool closed |
//!
//! `users.email` carries the unique constraint that arbitrates concurrent
//! registrations, and `businesses.owner_id` is `ON DELETE SET NULL`, so user
//! deletion never cascades to listings.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use bizdir_auth::{Credential, CredentialStore, NewUser, Role, User, UserUpdate};
use bizdir_core::{BusinessId, StoreError, StoreResult, UserId};
use bizdir_registry::{
    Business, BusinessStatus, BusinessStore, BusinessWithOwner, NewBusiness, StatusChange,
};

const USER_COLUMNS: &str = "id, name, email, password_hash, external_id, role, created_at";
const BUSINESS_COLUMNS: &str =
    "b.id, b.owner_id, b.name, b.description, b.status, b.rejection_reason, b.created_at";

/// Open a connection pool.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// Both store ports over one `PgPool`.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let user = user.into_user(Utc::now());
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        );
        let row = bind_user(sqlx::query(&sql), &user)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?;
        decode_user(&row)
    }

    #[instrument(skip(self, user), fields(email = %user.email), err)]
    async fn insert_user_if_absent(&self, user: NewUser) -> StoreResult<(User, bool)> {
        let user = user.into_user(Utc::now());
        let sql = format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (email) DO NOTHING RETURNING {USER_COLUMNS}"
        );
        let inserted = bind_user(sqlx::query(&sql), &user)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user_if_absent", e))?;
        if let Some(row) = inserted {
            return Ok((decode_user(&row)?, true));
        }

        let existing = self
            .find_user_by_email(&user.email)
            .await?
            .ok_or_else(|| StoreError::backend("user vanished between upsert and read"))?;
        Ok((existing, false))
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_id", e))?;
        row.map(|r| decode_user(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.map(|r| decode_user(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(decode_user).collect()
    }

    #[instrument(skip(self), err)]
    async fn update_user(&self, id: UserId, update: UserUpdate) -> StoreResult<Option<User>> {
        let sql = format!(
            "UPDATE users SET name = COALESCE($2, name), role = COALESCE($3, role) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(update.name.as_deref())
            .bind(update.role.map(|r| r.as_str()))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_user", e))?;
        row.map(|r| decode_user(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_user(&self, id: UserId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl BusinessStore for PgStore {
    #[instrument(skip(self, business), fields(name = %business.name), err)]
    async fn create_business(&self, business: NewBusiness) -> StoreResult<Business> {
        let business = business.into_business(Utc::now());
        let row = sqlx::query(
            r#"
            INSERT INTO businesses AS b (id, owner_id, name, description, status, rejection_reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING b.id, b.owner_id, b.name, b.description, b.status, b.rejection_reason, b.created_at
            "#,
        )
        .bind(business.id.as_uuid())
        .bind(business.owner_id.map(Uuid::from))
        .bind(&business.name)
        .bind(business.description.as_deref())
        .bind(business.status.as_str())
        .bind(business.rejection_reason.as_deref())
        .bind(business.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("create_business", e))?;
        decode_business(&row)
    }

    #[instrument(skip(self), err)]
    async fn find_business(&self, id: BusinessId) -> StoreResult<Option<Business>> {
        let sql = format!("SELECT {BUSINESS_COLUMNS} FROM businesses b WHERE b.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_business", e))?;
        row.map(|r| decode_business(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn list_approved_businesses(&self) -> StoreResult<Vec<Business>> {
        let sql = format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses b WHERE b.status = 'approved' \
             ORDER BY b.created_at DESC, b.id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_approved_businesses", e))?;
        rows.iter().map(decode_business).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_businesses_by_owner(&self, owner: UserId) -> StoreResult<Vec<Business>> {
        let sql = format!(
            "SELECT {BUSINESS_COLUMNS} FROM businesses b WHERE b.owner_id = $1 \
             ORDER BY b.created_at DESC, b.id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(owner.as_uuid())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_businesses_by_owner", e))?;
        rows.iter().map(decode_business).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_businesses_with_owners(&self) -> StoreResult<Vec<BusinessWithOwner>> {
        let sql = format!(
            "SELECT {BUSINESS_COLUMNS}, u.name AS owner_name \
             FROM businesses b LEFT JOIN users u ON u.id = b.owner_id \
             ORDER BY b.created_at DESC, b.id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_businesses_with_owners", e))?;
        rows.iter()
            .map(|row| {
                Ok(BusinessWithOwner {
                    business: decode_business(row)?,
                    owner_name: row.try_get("owner_name").map_err(decode_error)?,
                })
            })
            .collect()
    }

    #[instrument(skip(self), err)]
    async fn update_business_status(
        &self,
        id: BusinessId,
        change: StatusChange,
    ) -> StoreResult<Option<Business>> {
        let row = sqlx::query(
            r#"
            UPDATE businesses AS b SET status = $2, rejection_reason = $3
            WHERE b.id = $1
            RETURNING b.id, b.owner_id, b.name, b.description, b.status, b.rejection_reason, b.created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(change.status().as_str())
        .bind(change.reason())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_business_status", e))?;
        row.map(|r| decode_business(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn delete_business(&self, id: BusinessId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM businesses WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_business", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn bind_user<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>,
    user: &'q User,
) -> sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments> {
    query
        .bind(user.id.as_uuid())
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.credential.password_hash())
        .bind(user.credential.external_id())
        .bind(user.role.as_str())
        .bind(user.created_at)
}

/// Map SQLx errors onto the storage port's error cases.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let constraint = db_err.constraint().unwrap_or_default().to_string();
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(constraint),
                Some("23503") => StoreError::NotFound,
                _ => StoreError::backend(format!("database error in {operation}: {}", db_err.message())),
            }
        }
        sqlx::Error::PoolClosed => StoreError::backend(format!("connection pool closed in {operation}")),
        other => StoreError::backend(format!("sqlx error in {operation}: {other}")),
    }
}

fn decode_error(err: sqlx::Error) -> StoreError {
    StoreError::backend(format!("failed to decode row: {err}"))
}

// SQLx row types

#[derive(Debug)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: Option<String>,
    external_id: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
            external_id: row.try_get("external_id")?,
            role: row.try_get("role")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let credential = match (row.password_hash, row.external_id) {
            (Some(hash), None) => Credential::PasswordHash(hash),
            (None, Some(subject)) => Credential::External(subject),
            _ => {
                return Err(StoreError::backend(format!(
                    "user {} must hold exactly one credential",
                    row.id
                )));
            }
        };
        let role: Role = row
            .role
            .parse()
            .map_err(|e| StoreError::backend(format!("user {}: {e}", row.id)))?;
        Ok(User {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
            credential,
            role,
            created_at: row.created_at,
        })
    }
}

fn decode_user(row: &PgRow) -> StoreResult<User> {
    UserRow::from_row(row).map_err(decode_error)?.try_into()
}

#[derive(Debug)]
struct BusinessRow {
    id: Uuid,
    owner_id: Option<Uuid>,
    name: String,
    description: Option<String>,
    status: String,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, PgRow> for BusinessRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BusinessRow {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
            rejection_reason: row.try_get("rejection_reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl TryFrom<BusinessRow> for Business {
    type Error = StoreError;

    fn try_from(row: BusinessRow) -> Result<Self, Self::Error> {
        let status: BusinessStatus = row
            .status
            .parse()
            .map_err(|e| StoreError::backend(format!("business {}: {e}", row.id)))?;
        Ok(Business {
            id: BusinessId::from_uuid(row.id),
            owner_id: row.owner_id.map(UserId::from_uuid),
            name: row.name,
            description: row.description,
            status,
            rejection_reason: row.rejection_reason,
            created_at: row.created_at,
        })
    }
}

fn decode_business(row: &PgRow) -> StoreResult<Business> {
    BusinessRow::from_row(row).map_err(decode_error)?.try_into()
}
