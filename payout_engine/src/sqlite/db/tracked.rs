use chrono::{TimeZone, Utc};
use pgw_common::TransactionStatus;
use sqlx::{FromRow, SqliteConnection};

use crate::db_types::TrackedTransaction;

#[derive(Debug, Clone, FromRow)]
struct TrackedRow {
    id: String,
    status: String,
    version: i64,
    expires_at: i64,
}

impl TryFrom<TrackedRow> for TrackedTransaction {
    type Error = String;

    fn try_from(row: TrackedRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<TransactionStatus>().map_err(|e| format!("{}: {e}", row.id))?;
        let expires_at = Utc
            .timestamp_millis_opt(row.expires_at)
            .single()
            .ok_or_else(|| format!("{}: invalid expiry timestamp {}", row.id, row.expires_at))?;
        Ok(Self { id: row.id, status, version: row.version, expires_at })
    }
}

fn decode(row: TrackedRow) -> Result<TrackedTransaction, sqlx::Error> {
    TrackedTransaction::try_from(row).map_err(|e| sqlx::Error::Decode(e.into()))
}

pub async fn exists(id: &str, now: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tracked_transactions WHERE id = $1 AND expires_at > $2")
        .bind(id)
        .bind(now)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Inserts a new record. Fails with a unique violation if a record for `id` exists, expired or not, so callers
/// should clear expired records first with [`delete_if_expired`].
pub async fn insert(
    id: &str,
    status: TransactionStatus,
    expires_at: i64,
    conn: &mut SqliteConnection,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO tracked_transactions (id, status, version, expires_at) VALUES ($1, $2, 1, $3)")
        .bind(id)
        .bind(status.as_str())
        .bind(expires_at)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_if_expired(id: &str, now: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tracked_transactions WHERE id = $1 AND expires_at <= $2")
        .bind(id)
        .bind(now)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn fetch(
    id: &str,
    now: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<TrackedTransaction>, sqlx::Error> {
    let row: Option<TrackedRow> = sqlx::query_as(
        "SELECT id, status, version, expires_at FROM tracked_transactions WHERE id = $1 AND expires_at > $2",
    )
    .bind(id)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    row.map(decode).transpose()
}

/// Sets the status of a live record and bumps its version. Returns the number of rows changed (0 or 1).
pub async fn update_status(
    id: &str,
    status: TransactionStatus,
    now: i64,
    conn: &mut SqliteConnection,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE tracked_transactions SET status = $1, version = version + 1 WHERE id = $2 AND expires_at > $3",
    )
    .bind(status.as_str())
    .bind(id)
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

/// Deletes the record only if it is still at `version`. Returns the number of rows removed (0 or 1).
pub async fn delete_version(id: &str, version: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tracked_transactions WHERE id = $1 AND version = $2")
        .bind(id)
        .bind(version)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete(id: &str, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tracked_transactions WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected())
}

pub async fn fetch_live(now: i64, conn: &mut SqliteConnection) -> Result<Vec<TrackedTransaction>, sqlx::Error> {
    let rows: Vec<TrackedRow> = sqlx::query_as(
        "SELECT id, status, version, expires_at FROM tracked_transactions WHERE expires_at > $1 ORDER BY expires_at",
    )
    .bind(now)
    .fetch_all(conn)
    .await?;
    rows.into_iter().map(decode).collect()
}

pub async fn purge_expired(now: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM tracked_transactions WHERE expires_at <= $1").bind(now).execute(conn).await?;
    Ok(result.rows_affected())
}
