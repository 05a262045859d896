use gateway_tools::Payment;
use serde::{Deserialize, Serialize};

/// An inbound payment request. The payload is the JSON body of a `NewPayment`, exactly as the producer sent it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequestMessage {
    /// Ties the reply to the request. Also used as the gateway idempotency key.
    pub correlation_key: String,
    pub payload: Vec<u8>,
}

impl PaymentRequestMessage {
    pub fn new<K: Into<String>, P: Into<Vec<u8>>>(correlation_key: K, payload: P) -> Self {
        Self { correlation_key: correlation_key.into(), payload: payload.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum PaymentOutcome {
    Created { payment: Payment },
    Rejected { reason: String },
}

/// The reply to a [`PaymentRequestMessage`], carrying the same correlation key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentResultMessage {
    pub correlation_key: String,
    pub outcome: PaymentOutcome,
}

impl PaymentResultMessage {
    pub fn created(correlation_key: &str, payment: Payment) -> Self {
        Self { correlation_key: correlation_key.to_string(), outcome: PaymentOutcome::Created { payment } }
    }

    pub fn rejected<R: Into<String>>(correlation_key: &str, reason: R) -> Self {
        let outcome = PaymentOutcome::Rejected { reason: reason.into() };
        Self { correlation_key: correlation_key.to_string(), outcome }
    }

    pub fn is_created(&self) -> bool {
        matches!(self.outcome, PaymentOutcome::Created { .. })
    }

    /// The outcome as the JSON payload that goes back on the wire.
    pub fn payload(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.outcome)
    }
}
