use std::{fmt::Debug, sync::Arc};

use gateway_tools::{NewPayout, Payout};
use log::*;
use pgw_common::validation::Validator;

use crate::{
    db_types::NewTransactionLog,
    pe_api::errors::PayoutFlowError,
    tracker::{PayoutSubscriber, Subscription},
    traits::{PayoutGateway, PayoutStatusSource, StatusStore, TransactionLogs},
};

/// `PayoutFlowApi` is the entry point for sending money out: it validates the request, creates the payout at the
/// gateway, logs it, and hands it to the payout tracker.
pub struct PayoutFlowApi<P, S, G, L> {
    gateway: P,
    logs: L,
    validator: Arc<Validator>,
    subscriber: PayoutSubscriber<S, G, L>,
}

impl<P, S, G, L> Debug for PayoutFlowApi<P, S, G, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PayoutFlowApi")
    }
}

impl<P, S, G, L> PayoutFlowApi<P, S, G, L>
where
    P: PayoutGateway,
    S: StatusStore,
    G: PayoutStatusSource,
    L: TransactionLogs,
{
    pub fn new(gateway: P, logs: L, validator: Arc<Validator>, subscriber: PayoutSubscriber<S, G, L>) -> Self {
        Self { gateway, logs, validator, subscriber }
    }

    pub fn subscriber(&self) -> &PayoutSubscriber<S, G, L> {
        &self.subscriber
    }

    /// Creates a payout at the gateway and starts tracking it.
    ///
    /// `idempotency_key` is forwarded to the gateway, so retrying a failed call with the same key never pays out
    /// twice. Failing to start tracking does not fail the call: the payout exists at that point, and the failure is
    /// logged instead.
    pub async fn submit_payout(&self, idempotency_key: &str, payout: NewPayout) -> Result<Payout, PayoutFlowError> {
        self.validator.check(&payout)?;
        let created = self.gateway.create_payout(idempotency_key, &payout).await?;
        debug!("🔄️💸️ Payout {} created with status {}", created.id, created.status);
        self.logs.insert_log(NewTransactionLog::from(&created)).await?;
        match self.subscriber.subscribe(&created.id, created.status).await {
            Ok(Subscription::Started) => debug!("🔄️💸️ Payout {} is being tracked", created.id),
            Ok(outcome) => trace!("🔄️💸️ Payout {} not tracked: {outcome:?}", created.id),
            Err(e) => error!("🔄️💸️ Could not start tracking payout {}. {e}", created.id),
        }
        Ok(created)
    }
}
