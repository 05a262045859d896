use std::{fmt::Display, future::Future, time::Duration};

use pgw_common::TransactionStatus;
use thiserror::Error;

use crate::db_types::TrackedTransaction;

/// How long a record lives after it is committed, unless a store is configured otherwise.
pub const DEFAULT_RECORD_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Persistent record of in-flight transactions and their last known status.
///
/// Every record carries an expiry. A record that has expired behaves exactly as if it did not exist. Records with a
/// terminal status are not meant to outlive the read that observes them; [`StatusStore::get_status`] deletes them.
pub trait StatusStore: Clone + Send + Sync + 'static {
    /// Whether a live record exists for `id`.
    fn exists(&self, id: &str) -> impl Future<Output = Result<bool, StatusStoreError>> + Send;

    /// Creates the record for `id` and starts its expiry window.
    ///
    /// This is the only way records get created, and it is atomic: of several concurrent callers for the same `id`,
    /// exactly one succeeds and the rest get [`StatusStoreError::AlreadyTracked`].
    fn commit(&self, id: &str, status: TransactionStatus) -> impl Future<Output = Result<(), StatusStoreError>> + Send;

    /// Overwrites the status of a live record and bumps its version. The remaining expiry window is left untouched.
    ///
    /// Fails with [`StatusStoreError::NotTracked`] if there is no live record for `id`.
    fn update_status(
        &self,
        id: &str,
        status: TransactionStatus,
    ) -> impl Future<Output = Result<(), StatusStoreError>> + Send;

    /// Returns the last known status for `id`.
    ///
    /// If that status is terminal, the record is deleted as part of the read, provided it has not changed since it was
    /// read. Otherwise the call fails with [`StatusStoreError::ConcurrentModification`] and the caller may retry.
    fn get_status(&self, id: &str) -> impl Future<Output = Result<TransactionStatus, StatusStoreError>> + Send;

    /// Removes the record for `id`. Removing a record that does not exist is not an error.
    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StatusStoreError>> + Send;

    /// All live records.
    fn tracked(&self) -> impl Future<Output = Result<Vec<TrackedTransaction>, StatusStoreError>> + Send;

    /// Removes expired records and returns how many were removed.
    fn purge_expired(&self) -> impl Future<Output = Result<u64, StatusStoreError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusStoreError {
    #[error("{op}: transaction {id} is already being tracked")]
    AlreadyTracked { op: &'static str, id: String },
    #[error("{op}: transaction {id} is not being tracked")]
    NotTracked { op: &'static str, id: String },
    #[error("{op}: the record for transaction {id} changed while it was being read")]
    ConcurrentModification { op: &'static str, id: String },
    #[error("{op}: status store error. {message}")]
    DatabaseError { op: &'static str, message: String },
}

impl StatusStoreError {
    pub fn already_tracked(op: &'static str, id: &str) -> Self {
        Self::AlreadyTracked { op, id: id.to_string() }
    }

    pub fn not_tracked(op: &'static str, id: &str) -> Self {
        Self::NotTracked { op, id: id.to_string() }
    }

    pub fn concurrent_modification(op: &'static str, id: &str) -> Self {
        Self::ConcurrentModification { op, id: id.to_string() }
    }

    pub fn database<E: Display>(op: &'static str, e: E) -> Self {
        Self::DatabaseError { op, message: e.to_string() }
    }

    /// The store operation that failed.
    pub fn op(&self) -> &'static str {
        match self {
            Self::AlreadyTracked { op, .. }
            | Self::NotTracked { op, .. }
            | Self::ConcurrentModification { op, .. }
            | Self::DatabaseError { op, .. } => op,
        }
    }
}
