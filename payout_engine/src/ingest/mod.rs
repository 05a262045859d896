//! # Payment ingestion
//!
//! Payment requests arrive on a channel as opaque JSON payloads, each with a correlation key. The worker creates the
//! payment at the gateway, using the correlation key as the idempotency key, and answers on the outbound channel with
//! the same key. The transport feeding the channels (a message broker consumer, say) lives outside this crate.
mod messages;
mod worker;

pub use messages::{PaymentOutcome, PaymentRequestMessage, PaymentResultMessage};
pub use worker::PaymentIngestor;
