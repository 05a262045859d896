use std::future::Future;

use pgw_common::TransactionStatus;
use thiserror::Error;

use crate::db_types::{NewTransactionLog, TransactionLog};

/// The audit log of transactions that have been sent to the gateway.
pub trait TransactionLogs: Clone + Send + Sync + 'static {
    /// Stores a new log entry and returns it. If an entry for the transaction already exists, it is returned unchanged.
    fn insert_log(
        &self,
        log: NewTransactionLog,
    ) -> impl Future<Output = Result<TransactionLog, TransactionLogError>> + Send;

    /// Records the latest status of a transaction. Reporting the same status twice leaves a single entry behind. If
    /// the transaction has no entry yet, a minimal payout entry is created for it.
    fn upsert_transaction_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> impl Future<Output = Result<(), TransactionLogError>> + Send;

    fn fetch_log(
        &self,
        transaction_id: &str,
    ) -> impl Future<Output = Result<Option<TransactionLog>, TransactionLogError>> + Send;
}

#[derive(Debug, Clone, Error)]
pub enum TransactionLogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The log entry for {transaction_id} is corrupt. {reason}")]
    CorruptRecord { transaction_id: String, reason: String },
}

impl From<sqlx::Error> for TransactionLogError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(e.to_string())
    }
}
