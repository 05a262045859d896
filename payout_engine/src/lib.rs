//! Payout Engine
//!
//! The payout engine sends money out through the payment gateway and keeps track of every payout until the gateway
//! reports it as settled. It is storage-agnostic: the tracker, the payout flow API and the ingestion worker only talk
//! to the traits in [`mod@traits`].
//!
//! The library is divided into these sections:
//! 1. Storage ([`SqliteDatabase`], [`MemoryStatusStore`]). The status store holds the last known status of each
//!    in-flight payout, and the transaction log records every transaction sent to the gateway.
//! 2. The payout tracker ([`mod@tracker`]). Each in-flight payout gets its own reconciliation loop that polls the
//!    gateway on a Fibonacci backoff schedule until the payout reaches a terminal status.
//! 3. The public API: [`PayoutFlowApi`] for creating payouts and [`mod@ingest`] for turning payment request messages
//!    into gateway payments.
pub mod db_types;
pub mod ingest;
mod integrations;
mod memory;
mod pe_api;
pub mod tracker;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use memory::MemoryStatusStore;
pub use pe_api::{errors::PayoutFlowError, payout_flow_api::PayoutFlowApi};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use traits::{
    PaymentGateway,
    PayoutGateway,
    PayoutStatusSource,
    StatusStore,
    StatusStoreError,
    TransactionLogError,
    TransactionLogs,
};
