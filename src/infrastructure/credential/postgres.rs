//! PostgreSQL credential store implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};

use crate::domain::{
    CredentialId, CredentialRecord, CredentialStore, DomainError, RateCeilings, RateWindow,
    UsageLogEntry,
};

/// PostgreSQL implementation of [`CredentialStore`]
#[derive(Debug, Clone)]
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    /// Create a new store with the given connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the gateway's tables if they do not exist. Record rows are
    /// written by the external issuance tooling; this only guarantees the
    /// schema is present.
    pub async fn migrate(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credentials (
                id TEXT PRIMARY KEY,
                client_name TEXT NOT NULL,
                key_hash TEXT NOT NULL,
                key_prefix TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                expires_at TIMESTAMPTZ,
                rate_limit_per_minute INTEGER,
                rate_limit_per_hour INTEGER,
                rate_limit_per_day INTEGER,
                total_requests BIGINT NOT NULL DEFAULT 0,
                last_used_at TIMESTAMPTZ,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create credentials table: {}", e)))?;

        // hash uniqueness only has to hold among active records
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_credentials_active_key_hash
            ON credentials (key_hash) WHERE is_active
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create hash index: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credential_usage_log (
                id BIGSERIAL PRIMARY KEY,
                credential_id TEXT NOT NULL,
                endpoint TEXT NOT NULL,
                method TEXT NOT NULL,
                status_code INTEGER NOT NULL,
                client_addr TEXT,
                user_agent TEXT,
                latency_ms BIGINT,
                error_message TEXT,
                recorded_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create usage log table: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS credential_window_counts (
                credential_id TEXT NOT NULL,
                period TEXT NOT NULL,
                window_start TIMESTAMPTZ NOT NULL,
                request_count BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (credential_id, period, window_start)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create counters table: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn find_by_hash(&self, key_hash: &str) -> Result<Option<CredentialRecord>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, client_name, key_hash, key_prefix, is_active, expires_at,
                   rate_limit_per_minute, rate_limit_per_hour, rate_limit_per_day,
                   total_requests, last_used_at, created_at
            FROM credentials
            WHERE key_hash = $1 AND is_active = TRUE
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to look up credential: {}", e)))?;

        match row {
            Some(row) => Ok(Some(row_to_record(&row)?)),
            None => Ok(None),
        }
    }

    async fn check_and_increment(
        &self,
        id: &CredentialId,
        window: RateWindow,
        ceiling: u32,
    ) -> Result<bool, DomainError> {
        // One upsert: concurrent requests serialize on the conflicting row,
        // so no two of them can both observe the last unit of quota.
        let count: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO credential_window_counts (credential_id, period, window_start, request_count)
            VALUES ($1, $2, date_trunc($2, NOW()), 1)
            ON CONFLICT (credential_id, period, window_start)
            DO UPDATE SET request_count = credential_window_counts.request_count + 1
            RETURNING request_count
            "#,
        )
        .bind(id.as_str())
        .bind(window.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to increment window counter: {}", e)))?;

        Ok(count <= i64::from(ceiling))
    }

    async fn insert_usage_log(&self, entry: UsageLogEntry) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO credential_usage_log
                (credential_id, endpoint, method, status_code, client_addr,
                 user_agent, latency_ms, error_message, recorded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&entry.credential_id)
        .bind(&entry.endpoint)
        .bind(&entry.method)
        .bind(i32::from(entry.status_code))
        .bind(&entry.client_addr)
        .bind(&entry.user_agent)
        .bind(entry.latency_ms.map(|v| v as i64))
        .bind(&entry.error_message)
        .bind(entry.recorded_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to insert usage log: {}", e)))?;

        Ok(())
    }

    async fn fetch_total_requests(&self, id: &CredentialId) -> Result<u64, DomainError> {
        let total: Option<i64> =
            sqlx::query_scalar("SELECT total_requests FROM credentials WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::storage(format!("Failed to fetch total requests: {}", e))
                })?;

        total
            .map(|t| t.max(0) as u64)
            .ok_or_else(|| DomainError::not_found(format!("Credential '{}' not found", id)))
    }

    async fn update_record(
        &self,
        id: &CredentialId,
        last_used_at: DateTime<Utc>,
        total_requests: u64,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE credentials SET last_used_at = $2, total_requests = $3 WHERE id = $1",
        )
        .bind(id.as_str())
        .bind(last_used_at)
        .bind(total_requests as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to update credential: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(format!(
                "Credential '{}' not found",
                id
            )));
        }

        Ok(())
    }
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> Result<CredentialRecord, DomainError> {
    let id: String = get_column(row, "id")?;
    let client_name: String = get_column(row, "client_name")?;
    let key_hash: String = get_column(row, "key_hash")?;
    let key_prefix: String = get_column(row, "key_prefix")?;
    let is_active: bool = get_column(row, "is_active")?;
    let expires_at: Option<DateTime<Utc>> = get_column(row, "expires_at")?;
    let per_minute: Option<i32> = get_column(row, "rate_limit_per_minute")?;
    let per_hour: Option<i32> = get_column(row, "rate_limit_per_hour")?;
    let per_day: Option<i32> = get_column(row, "rate_limit_per_day")?;
    let total_requests: i64 = get_column(row, "total_requests")?;
    let last_used_at: Option<DateTime<Utc>> = get_column(row, "last_used_at")?;
    let created_at: DateTime<Utc> = get_column(row, "created_at")?;

    let ceilings = RateCeilings {
        per_minute: per_minute.map(|v| v.max(0) as u32),
        per_hour: per_hour.map(|v| v.max(0) as u32),
        per_day: per_day.map(|v| v.max(0) as u32),
    };

    let mut record = CredentialRecord::new(CredentialId::new(id), client_name, key_hash, key_prefix)
        .with_active(is_active)
        .with_rate_ceilings(ceilings)
        .with_total_requests(total_requests.max(0) as u64)
        .with_last_used_at(last_used_at)
        .with_created_at(created_at);

    if let Some(expires_at) = expires_at {
        record = record.with_expiration(expires_at);
    }

    Ok(record)
}

fn get_column<'r, T>(row: &'r sqlx::postgres::PgRow, column: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(column)
        .map_err(|e| DomainError::storage(format!("Failed to decode column '{}': {}", column, e)))
}
