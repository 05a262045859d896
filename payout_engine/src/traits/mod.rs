//! # Interface contracts of the payout engine
//!
//! Backends and integrations implement these traits so that the tracker, the payout flow API and the ingestion worker
//! stay agnostic of where state lives and which gateway answers.
//!
//! * [`StatusStore`] holds the last known status of every in-flight transaction. It is the single synchronization
//!   point between reconciliation loops.
//! * [`TransactionLogs`] is the audit log that every observed status change is reported to.
//! * [`PayoutStatusSource`], [`PayoutGateway`] and [`PaymentGateway`] are the ports to the payment gateway.
mod gateway;
mod status_store;
mod transaction_logs;

pub use gateway::{PaymentGateway, PayoutGateway, PayoutStatusSource};
pub use status_store::{StatusStore, StatusStoreError, DEFAULT_RECORD_TTL};
pub use transaction_logs::{TransactionLogError, TransactionLogs};
