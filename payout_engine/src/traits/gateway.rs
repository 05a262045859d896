use std::future::Future;

use gateway_tools::{GatewayError, NewPayment, NewPayout, Payment, Payout};
use pgw_common::TransactionStatus;

/// Where reconciliation loops get the authoritative status of a payout.
pub trait PayoutStatusSource: Clone + Send + Sync + 'static {
    fn fetch_payout_status(
        &self,
        payout_id: &str,
    ) -> impl Future<Output = Result<TransactionStatus, GatewayError>> + Send;
}

pub trait PayoutGateway: Clone + Send + Sync + 'static {
    /// Creates a payout. Retrying with the same `idempotence_key` must not create a second payout.
    fn create_payout(
        &self,
        idempotence_key: &str,
        payout: &NewPayout,
    ) -> impl Future<Output = Result<Payout, GatewayError>> + Send;
}

pub trait PaymentGateway: Clone + Send + Sync + 'static {
    /// Creates a payment. Retrying with the same `idempotence_key` must not create a second payment.
    fn create_payment(
        &self,
        idempotence_key: &str,
        payment: &NewPayment,
    ) -> impl Future<Output = Result<Payment, GatewayError>> + Send;
}
