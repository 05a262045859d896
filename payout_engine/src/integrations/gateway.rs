use gateway_tools::{GatewayApi, GatewayError, NewPayment, NewPayout, Payment, Payout};
use pgw_common::TransactionStatus;

use crate::traits::{PaymentGateway, PayoutGateway, PayoutStatusSource};

impl PayoutStatusSource for GatewayApi {
    async fn fetch_payout_status(&self, payout_id: &str) -> Result<TransactionStatus, GatewayError> {
        self.get_payout(payout_id).await.map(|p| p.status)
    }
}

impl PayoutGateway for GatewayApi {
    async fn create_payout(&self, idempotence_key: &str, payout: &NewPayout) -> Result<Payout, GatewayError> {
        GatewayApi::create_payout(self, idempotence_key, payout).await
    }
}

impl PaymentGateway for GatewayApi {
    async fn create_payment(&self, idempotence_key: &str, payment: &NewPayment) -> Result<Payment, GatewayError> {
        GatewayApi::create_payment(self, idempotence_key, payment).await
    }
}
