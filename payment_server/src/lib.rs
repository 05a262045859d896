//! # Payout server
//! This crate hosts the long-running process that owns the payout tracker. It is responsible for:
//! * Resuming the tracking of payouts left in flight by a previous run.
//! * Running the payout tracker and the payment ingestion worker.
//! * Sweeping expired records out of the status store.
//! * Stopping every reconciliation loop cleanly on Ctrl-C, so that the next run can pick them up.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
pub mod cli;
pub mod config;
pub mod errors;
pub mod expiry_worker;
pub mod server;
