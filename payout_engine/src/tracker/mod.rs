//! # Payout tracker
//!
//! Keeps the local view of every in-flight payout in line with the gateway.
//!
//! * [`PayoutSubscriber`] decides whether a payout needs tracking, registers it in the status store exactly once and
//!   spawns its reconciliation loop. On startup it also resumes loops for records left behind by a previous process.
//! * [`ReconciliationLoop`] polls the gateway on a [`BackoffSchedule`] and writes status changes to the store and the
//!   transaction log until the payout settles.
pub mod backoff;
mod config;
pub mod reconciliation;
mod subscriber;

pub use backoff::{BackoffSchedule, Tick, Ticker};
pub use config::{TrackerConfig, DEFAULT_FETCH_TIMEOUT, DEFAULT_MAX_READ_RETRIES, DEFAULT_POLL_UNIT};
pub use reconciliation::{LoopOutcome, ReconciliationError, ReconciliationLoop};
pub use subscriber::{PayoutSubscriber, ResumeReport, Subscription, SubscriptionError};
