use std::sync::Arc;

use gateway_tools::NewPayment;
use log::*;
use pgw_common::validation::Validator;
use tokio::sync::mpsc;

use crate::{
    db_types::NewTransactionLog,
    ingest::messages::{PaymentRequestMessage, PaymentResultMessage},
    traits::{PaymentGateway, TransactionLogs},
};

/// Turns payment request messages into gateway payments and answers each one with a result message.
pub struct PaymentIngestor<P, L> {
    gateway: P,
    logs: L,
    validator: Arc<Validator>,
}

impl<P, L> PaymentIngestor<P, L>
where
    P: PaymentGateway,
    L: TransactionLogs,
{
    pub fn new(gateway: P, logs: L, validator: Arc<Validator>) -> Self {
        Self { gateway, logs, validator }
    }

    /// Handles requests until every sender of `inbound` is dropped, or nobody listens on `outbound` any more.
    pub async fn run(
        self,
        mut inbound: mpsc::Receiver<PaymentRequestMessage>,
        outbound: mpsc::Sender<PaymentResultMessage>,
    ) {
        info!("📨️ Payment ingestion worker started");
        while let Some(request) = inbound.recv().await {
            let result = self.process(request).await;
            if outbound.send(result).await.is_err() {
                warn!("📨️ The payment result channel is closed. Stopping the ingestion worker.");
                break;
            }
        }
        info!("📨️ Payment ingestion worker has shut down");
    }

    pub async fn process(&self, request: PaymentRequestMessage) -> PaymentResultMessage {
        let key = request.correlation_key.as_str();
        let payment = match serde_json::from_slice::<NewPayment>(&request.payload) {
            Ok(p) => p,
            Err(e) => {
                warn!("📨️ [{key}] Malformed payment request. {e}");
                return PaymentResultMessage::rejected(key, format!("Malformed payment request. {e}"));
            },
        };
        if let Err(e) = self.validator.check(&payment) {
            debug!("📨️ [{key}] Payment request rejected. {e}");
            return PaymentResultMessage::rejected(key, e.to_string());
        }
        let created = match self.gateway.create_payment(key, &payment).await {
            Ok(p) => p,
            Err(e) => {
                error!("📨️ [{key}] The gateway did not accept the payment. {e}");
                return PaymentResultMessage::rejected(key, e.to_string());
            },
        };
        info!("📨️ [{key}] Payment {} created with status {}", created.id, created.status);
        if let Err(e) = self.logs.insert_log(NewTransactionLog::from(&created)).await {
            error!("📨️ [{key}] Payment {} was created but could not be logged. {e}", created.id);
        }
        PaymentResultMessage::created(key, created)
    }
}
