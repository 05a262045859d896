use chrono::{DateTime, Utc};
use pgw_common::TransactionStatus;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Amount {
    /// Decimal amount as a string, e.g. "320.00"
    pub value: String,
    /// ISO-4217 currency code
    pub currency: String,
}

impl Amount {
    pub fn new<V: Into<String>, C: Into<String>>(value: V, currency: C) -> Self {
        Self { value: value.into(), currency: currency.into() }
    }
}

//--------------------------------------       Payouts       ---------------------------------------------------------

/// A payout as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Payout {
    pub id: String,
    pub amount: Amount,
    pub status: TransactionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_destination: Option<PayoutDestination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub test: bool,
}

/// Request body for creating a payout. Either `payout_token` or `payout_destination_data` identifies the payee.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NewPayout {
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_destination_data: Option<PayoutDestination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// The payee's means of payment. Which of the optional fields must be present depends on `kind`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PayoutDestination {
    /// One of `bank_card`, `sbp`, `yoo_money`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card: Option<BankCardData>,
    /// SBP participant bank id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_id: Option<String>,
    /// E.164 phone number the payee's SBP account is linked to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// YooMoney wallet number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BankCardData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_type: Option<String>,
}

//--------------------------------------      Payments       ---------------------------------------------------------

/// A payment as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Payment {
    pub id: String,
    pub status: TransactionStatus,
    #[serde(default)]
    pub paid: bool,
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub test: bool,
}

/// Request body for creating a payment.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NewPayment {
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capture: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<Confirmation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method_data: Option<PaymentMethodData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// How the payer confirms the payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Confirmation {
    /// One of `embedded`, `external`, `mobile_application`, `qr`, `redirect`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enforce: Option<bool>,
    /// Only present in gateway responses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentMethodData {
    /// e.g. `bank_card`, `sbp`, `mobile_balance`, `b2b_sberbank`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_purpose: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vat_data: Option<VatData>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct VatData {
    /// One of `untaxed`, `calculated`, `mixed`
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Amount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
}
