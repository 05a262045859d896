use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use gateway_tools::{Payment, Payout};
use pgw_common::TransactionStatus;
use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

//--------------------------------------  TrackedTransaction   ---------------------------------------------------------
/// A transaction whose status is still being reconciled against the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedTransaction {
    pub id: String,
    pub status: TransactionStatus,
    /// Bumped on every write. Used to detect changes between a read and the clean-up that follows it.
    pub version: i64,
    pub expires_at: DateTime<Utc>,
}

//--------------------------------------    TransactionType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Payment,
    Refund,
    Payout,
    Deal,
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Payment => write!(f, "payment"),
            TransactionType::Refund => write!(f, "refund"),
            TransactionType::Payout => write!(f, "payout"),
            TransactionType::Deal => write!(f, "deal"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid transaction type: {0}")]
pub struct ConversionError(String);

impl FromStr for TransactionType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "payment" => Ok(Self::Payment),
            "refund" => Ok(Self::Refund),
            "payout" => Ok(Self::Payout),
            "deal" => Ok(Self::Deal),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

//--------------------------------------    TransactionLog     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransactionLog {
    pub transaction_id: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub value: String,
    pub currency: String,
}

impl NewTransactionLog {
    pub fn new(transaction_id: &str, transaction_type: TransactionType, status: TransactionStatus) -> Self {
        Self {
            transaction_id: transaction_id.to_string(),
            transaction_type,
            status,
            value: String::default(),
            currency: String::default(),
        }
    }

    pub fn with_amount(mut self, value: &str, currency: &str) -> Self {
        self.value = value.to_string();
        self.currency = currency.to_string();
        self
    }
}

impl From<&Payout> for NewTransactionLog {
    fn from(payout: &Payout) -> Self {
        Self::new(&payout.id, TransactionType::Payout, payout.status)
            .with_amount(&payout.amount.value, &payout.amount.currency)
    }
}

impl From<&Payment> for NewTransactionLog {
    fn from(payment: &Payment) -> Self {
        Self::new(&payment.id, TransactionType::Payment, payment.status)
            .with_amount(&payment.amount.value, &payment.amount.currency)
    }
}

/// The audit record kept for every transaction sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionLog {
    pub id: i64,
    pub transaction_id: String,
    pub transaction_type: TransactionType,
    pub status: TransactionStatus,
    pub value: String,
    pub currency: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
