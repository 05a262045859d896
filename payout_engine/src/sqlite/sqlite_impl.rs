//! `SqliteDatabase` is the durable backend of the payout engine.
//!
//! It implements [`StatusStore`] on top of the `tracked_transactions` table and [`TransactionLogs`] on top of the
//! `transaction_logs` table. Expiry is stored as a millisecond timestamp, and every query treats rows past their expiry
//! as if they were absent.
use std::{fmt::Debug, time::Duration};

use chrono::Utc;
use log::*;
use pgw_common::TransactionStatus;
use sqlx::{migrate::MigrateError, SqlitePool};

use super::db::{logs, new_pool, tracked};
use crate::{
    db_types::{NewTransactionLog, TrackedTransaction, TransactionLog},
    traits::{StatusStore, StatusStoreError, TransactionLogError, TransactionLogs, DEFAULT_RECORD_TTL},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
    ttl: Duration,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl StatusStore for SqliteDatabase {
    async fn exists(&self, id: &str) -> Result<bool, StatusStoreError> {
        let mut conn = self.pool.acquire().await.map_err(|e| StatusStoreError::database("exists", e))?;
        tracked::exists(id, now_millis(), &mut conn).await.map_err(|e| StatusStoreError::database("exists", e))
    }

    async fn commit(&self, id: &str, status: TransactionStatus) -> Result<(), StatusStoreError> {
        const OP: &str = "commit";
        let now = now_millis();
        let expires_at = now.saturating_add(i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX));
        let mut tx = self.pool.begin().await.map_err(|e| StatusStoreError::database(OP, e))?;
        let cleared =
            tracked::delete_if_expired(id, now, &mut tx).await.map_err(|e| StatusStoreError::database(OP, e))?;
        if cleared > 0 {
            debug!("🗃️ Expired record for {id} cleared before commit");
        }
        tracked::insert(id, status, expires_at, &mut tx).await.map_err(|e| match e {
            sqlx::Error::Database(err) if err.is_unique_violation() => StatusStoreError::already_tracked(OP, id),
            e => StatusStoreError::database(OP, e),
        })?;
        tx.commit().await.map_err(|e| StatusStoreError::database(OP, e))?;
        debug!("🗃️ {id} is now tracked with status {status}");
        Ok(())
    }

    async fn update_status(&self, id: &str, status: TransactionStatus) -> Result<(), StatusStoreError> {
        const OP: &str = "update_status";
        let mut conn = self.pool.acquire().await.map_err(|e| StatusStoreError::database(OP, e))?;
        let changed = tracked::update_status(id, status, now_millis(), &mut conn)
            .await
            .map_err(|e| StatusStoreError::database(OP, e))?;
        if changed == 0 {
            return Err(StatusStoreError::not_tracked(OP, id));
        }
        trace!("🗃️ {id} updated to {status}");
        Ok(())
    }

    async fn get_status(&self, id: &str) -> Result<TransactionStatus, StatusStoreError> {
        const OP: &str = "get_status";
        let mut conn = self.pool.acquire().await.map_err(|e| StatusStoreError::database(OP, e))?;
        let record = tracked::fetch(id, now_millis(), &mut conn)
            .await
            .map_err(|e| StatusStoreError::database(OP, e))?
            .ok_or_else(|| StatusStoreError::not_tracked(OP, id))?;
        if record.status.is_terminal() {
            let removed = tracked::delete_version(id, record.version, &mut conn)
                .await
                .map_err(|e| StatusStoreError::database(OP, e))?;
            if removed == 0 {
                return Err(StatusStoreError::concurrent_modification(OP, id));
            }
            debug!("🗃️ {id} reached {} and is no longer tracked", record.status);
        }
        Ok(record.status)
    }

    async fn delete(&self, id: &str) -> Result<(), StatusStoreError> {
        let mut conn = self.pool.acquire().await.map_err(|e| StatusStoreError::database("delete", e))?;
        let removed = tracked::delete(id, &mut conn).await.map_err(|e| StatusStoreError::database("delete", e))?;
        if removed > 0 {
            debug!("🗃️ {id} is no longer tracked");
        }
        Ok(())
    }

    async fn tracked(&self) -> Result<Vec<TrackedTransaction>, StatusStoreError> {
        let mut conn = self.pool.acquire().await.map_err(|e| StatusStoreError::database("tracked", e))?;
        tracked::fetch_live(now_millis(), &mut conn).await.map_err(|e| StatusStoreError::database("tracked", e))
    }

    async fn purge_expired(&self) -> Result<u64, StatusStoreError> {
        let mut conn = self.pool.acquire().await.map_err(|e| StatusStoreError::database("purge_expired", e))?;
        tracked::purge_expired(now_millis(), &mut conn)
            .await
            .map_err(|e| StatusStoreError::database("purge_expired", e))
    }
}

impl TransactionLogs for SqliteDatabase {
    async fn insert_log(&self, log: NewTransactionLog) -> Result<TransactionLog, TransactionLogError> {
        let mut conn = self.pool.acquire().await?;
        let id = log.transaction_id.clone();
        let result = logs::idempotent_insert(log, &mut conn).await?;
        debug!("🗃️ Transaction log for {id} saved with id {}", result.id);
        Ok(result)
    }

    async fn upsert_transaction_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> Result<(), TransactionLogError> {
        let mut conn = self.pool.acquire().await?;
        logs::upsert_status(transaction_id, status, &mut conn).await?;
        trace!("🗃️ Transaction log for {transaction_id} set to {status}");
        Ok(())
    }

    async fn fetch_log(&self, transaction_id: &str) -> Result<Option<TransactionLog>, TransactionLogError> {
        let mut conn = self.pool.acquire().await?;
        logs::fetch_log(transaction_id, &mut conn).await
    }
}

impl SqliteDatabase {
    /// Connects to the database at `url`, creating the file if it does not exist yet.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool, ttl: DEFAULT_RECORD_TTL })
    }

    /// Sets how long tracked records live after they are committed.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
