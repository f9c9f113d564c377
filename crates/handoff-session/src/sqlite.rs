//! SQLite-backed session and identity store.

use crate::error::StoreError;
use crate::identity::{Identity, IdentityProfile, IdentityStore};
use crate::record::SessionRecord;
use crate::store::SessionStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::fs;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

/// How long a query waits for a pooled connection before the store counts
/// as unavailable.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Sessions and identities in one SQLite file.
///
/// Timestamps are stored as unix milliseconds.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

type IdentityRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i64,
    i64,
);

type SessionRow = (String, String, i64, i64);

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and run migrations.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        ensure_parent_dir(path)?;

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, running migrations first.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        // Creates identities + sessions
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::debug!("Session store migrations applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl SessionStore for SqliteStore {
    async fn insert(&self, record: SessionRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO sessions (token, identity_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&record.token)
        .bind(record.identity_id.to_string())
        .bind(record.created_at.timestamp_millis())
        .bind(record.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Rejected("duplicate session token".to_string())
            }
            other => StoreError::Database(other),
        })?;
        Ok(())
    }

    async fn find_active(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        let row: Option<SessionRow> = sqlx::query_as(
            r#"
            SELECT token, identity_id, created_at, expires_at
            FROM sessions
            WHERE token = ? AND expires_at > ?
            "#,
        )
        .bind(token)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await?;

        row.map(session_from_row).transpose()
    }

    async fn delete(&self, token: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl IdentityStore for SqliteStore {
    async fn upsert(&self, profile: &IdentityProfile) -> Result<Identity, StoreError> {
        let now = Utc::now().timestamp_millis();
        let row: IdentityRow = sqlx::query_as(
            r#"
            INSERT INTO identities
                (id, email, first_name, last_name, customer_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(email) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                customer_id = excluded.customer_id,
                updated_at = excluded.updated_at
            RETURNING id, email, first_name, last_name, customer_id, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&profile.email)
        .bind(&profile.first_name)
        .bind(&profile.last_name)
        .bind(&profile.customer_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        identity_from_row(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Identity>, StoreError> {
        let row: Option<IdentityRow> = sqlx::query_as(
            r#"
            SELECT id, email, first_name, last_name, customer_id, created_at, updated_at
            FROM identities
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(identity_from_row).transpose()
    }
}

fn session_from_row(row: SessionRow) -> Result<SessionRecord, StoreError> {
    let (token, identity_id, created_at, expires_at) = row;
    Ok(SessionRecord {
        token,
        identity_id: parse_uuid(&identity_id)?,
        created_at: from_unix_millis(created_at)?,
        expires_at: from_unix_millis(expires_at)?,
    })
}

fn identity_from_row(row: IdentityRow) -> Result<Identity, StoreError> {
    let (id, email, first_name, last_name, customer_id, created_at, updated_at) = row;
    Ok(Identity {
        id: parse_uuid(&id)?,
        email,
        first_name,
        last_name,
        customer_id,
        created_at: from_unix_millis(created_at)?,
        updated_at: from_unix_millis(updated_at)?,
    })
}

fn parse_uuid(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|e| StoreError::Corrupt(format!("bad uuid {raw:?}: {e}")))
}

fn from_unix_millis(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {millis}")))
}

fn ensure_parent_dir(path: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
