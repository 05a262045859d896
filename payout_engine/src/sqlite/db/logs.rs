use chrono::{DateTime, Utc};
use pgw_common::TransactionStatus;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{NewTransactionLog, TransactionLog, TransactionType},
    traits::TransactionLogError,
};

#[derive(Debug, Clone, FromRow)]
struct TransactionLogRow {
    id: i64,
    transaction_id: String,
    transaction_type: TransactionType,
    status: String,
    value: String,
    currency: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionLogRow> for TransactionLog {
    type Error = TransactionLogError;

    fn try_from(row: TransactionLogRow) -> Result<Self, Self::Error> {
        let status = row.status.parse::<TransactionStatus>().map_err(|e| TransactionLogError::CorruptRecord {
            transaction_id: row.transaction_id.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            id: row.id,
            transaction_id: row.transaction_id,
            transaction_type: row.transaction_type,
            status,
            value: row.value,
            currency: row.currency,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Inserts the log entry unless one already exists for the transaction. Either way, the stored entry is returned.
pub async fn idempotent_insert(
    log: NewTransactionLog,
    conn: &mut SqliteConnection,
) -> Result<TransactionLog, TransactionLogError> {
    sqlx::query(
        r#"
            INSERT INTO transaction_logs (transaction_id, transaction_type, status, value, currency)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (transaction_id) DO NOTHING;
        "#,
    )
    .bind(&log.transaction_id)
    .bind(log.transaction_type)
    .bind(log.status.as_str())
    .bind(&log.value)
    .bind(&log.currency)
    .execute(&mut *conn)
    .await?;
    fetch_log(&log.transaction_id, conn).await?.ok_or_else(|| TransactionLogError::CorruptRecord {
        transaction_id: log.transaction_id.clone(),
        reason: "the entry vanished straight after it was written".into(),
    })
}

/// Sets the status on the transaction's entry, creating a bare payout entry if there is none.
/// `updated_at` only moves when the status actually changes.
pub async fn upsert_status(
    transaction_id: &str,
    status: TransactionStatus,
    conn: &mut SqliteConnection,
) -> Result<(), TransactionLogError> {
    sqlx::query(
        r#"
            INSERT INTO transaction_logs (transaction_id, transaction_type, status)
            VALUES ($1, $2, $3)
            ON CONFLICT (transaction_id) DO UPDATE
                SET status = excluded.status, updated_at = CURRENT_TIMESTAMP
                WHERE transaction_logs.status <> excluded.status;
        "#,
    )
    .bind(transaction_id)
    .bind(TransactionType::Payout)
    .bind(status.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_log(
    transaction_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<TransactionLog>, TransactionLogError> {
    let row: Option<TransactionLogRow> = sqlx::query_as("SELECT * FROM transaction_logs WHERE transaction_id = $1")
        .bind(transaction_id)
        .fetch_optional(conn)
        .await?;
    row.map(TransactionLog::try_from).transpose()
}
