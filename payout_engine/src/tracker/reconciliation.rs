//! The per-payout polling loop.
//!
//! A loop owns exactly one tracked payout. On every tick of its backoff schedule it asks the gateway for the payout's
//! status and compares it with the last status in the store. Changes are written to the store first and then reported
//! to the transaction log. The loop ends when the payout reaches a terminal status, when the schedule runs out, when
//! the record disappears from the store, or when shutdown is signalled.
use gateway_tools::GatewayError;
use log::*;
use pgw_common::TransactionStatus;
use thiserror::Error;
use tokio::sync::watch;

use crate::{
    tracker::{backoff::Tick, TrackerConfig},
    traits::{PayoutStatusSource, StatusStore, StatusStoreError, TransactionLogError, TransactionLogs},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The payout reached a terminal status, the transaction log has it, and its record was removed.
    Terminal(TransactionStatus),
    /// Shutdown was signalled. The record stays in the store for the next process to pick up.
    Cancelled,
    /// The schedule ran out before the payout settled. The record is left to expire.
    ScheduleExhausted,
    /// The record expired or was removed by someone else.
    Untracked,
}

#[derive(Debug, Clone, Error)]
pub enum ReconciliationError {
    #[error("Could not fetch the status of payout {payout_id}. {source}")]
    Gateway { payout_id: String, source: GatewayError },
    #[error("Status store failure. {0}")]
    Store(#[from] StatusStoreError),
    #[error("Could not record the final status {status} of payout {payout_id}. {source}")]
    Log { payout_id: String, status: TransactionStatus, source: TransactionLogError },
}

pub struct ReconciliationLoop<S, G, L> {
    payout_id: String,
    store: S,
    source: G,
    logs: L,
    config: TrackerConfig,
    shutdown: watch::Receiver<bool>,
}

impl<S, G, L> ReconciliationLoop<S, G, L>
where
    S: StatusStore,
    G: PayoutStatusSource,
    L: TransactionLogs,
{
    pub fn new(
        payout_id: String,
        store: S,
        source: G,
        logs: L,
        config: TrackerConfig,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { payout_id, store, source, logs, config, shutdown }
    }

    pub fn payout_id(&self) -> &str {
        &self.payout_id
    }

    pub async fn run(self) -> Result<LoopOutcome, ReconciliationError> {
        let id = self.payout_id.as_str();
        let mut ticker = self.config.schedule().ticker(self.shutdown.clone());
        debug!("🔄️ Reconciliation loop for {id} started");
        loop {
            match ticker.next_tick().await {
                Tick::Tick(n) => trace!("🔄️ Tick #{n} for {id}"),
                Tick::Cancelled => {
                    debug!("🔄️ Reconciliation loop for {id} cancelled");
                    return Ok(LoopOutcome::Cancelled);
                },
                Tick::Exhausted => {
                    warn!("🔄️ Gave up polling {id}: it did not settle within {:?}", self.config.ttl);
                    return Ok(LoopOutcome::ScheduleExhausted);
                },
            }
            let fetched = match self.fetch_status().await {
                Ok(status) => status,
                Err(e) if e.is_transient() => {
                    warn!("🔄️ Could not fetch the status of {id}, will retry on the next tick. {e}");
                    continue;
                },
                Err(e) => return Err(ReconciliationError::Gateway { payout_id: self.payout_id.clone(), source: e }),
            };
            let known = match self.last_known_status().await {
                Ok(status) => status,
                Err(StatusStoreError::NotTracked { .. }) => {
                    info!("🔄️ {id} is no longer in the status store. Stopping.");
                    return Ok(LoopOutcome::Untracked);
                },
                Err(e) => return Err(e.into()),
            };
            if known == fetched {
                trace!("🔄️ {id} is still {known}");
                continue;
            }
            if let Some(outcome) = self.apply_change(known, fetched).await? {
                return Ok(outcome);
            }
        }
    }

    async fn fetch_status(&self) -> Result<TransactionStatus, GatewayError> {
        let timeout = self.config.fetch_timeout;
        tokio::time::timeout(timeout, self.source.fetch_payout_status(&self.payout_id))
            .await
            .unwrap_or_else(|_| Err(GatewayError::Timeout(format!("no answer after {timeout:?}"))))
    }

    /// Reads the stored status, retrying a few times if the record changed during the read.
    async fn last_known_status(&self) -> Result<TransactionStatus, StatusStoreError> {
        let mut attempts = 0;
        loop {
            match self.store.get_status(&self.payout_id).await {
                Err(StatusStoreError::ConcurrentModification { .. }) if attempts < self.config.max_read_retries => {
                    attempts += 1;
                    debug!("🔄️ Status of {} changed while reading it. Retry #{attempts}", self.payout_id);
                    tokio::task::yield_now().await;
                },
                result => return result,
            }
        }
    }

    async fn apply_change(
        &self,
        known: TransactionStatus,
        fetched: TransactionStatus,
    ) -> Result<Option<LoopOutcome>, ReconciliationError> {
        let id = self.payout_id.as_str();
        match self.store.update_status(id, fetched).await {
            Ok(()) => {},
            Err(StatusStoreError::NotTracked { .. }) => return Ok(Some(LoopOutcome::Untracked)),
            Err(e) => return Err(e.into()),
        }
        info!("🔄️ {id} moved from {known} to {fetched}");
        if let Err(e) = self.logs.upsert_transaction_status(id, fetched).await {
            if fetched.is_terminal() {
                // the record keeps the final status for resume_orphans
                return Err(ReconciliationError::Log { payout_id: id.to_string(), status: fetched, source: e });
            }
            error!("🔄️ Could not record status {fetched} for {id} in the transaction log. {e}");
        }
        if fetched.is_terminal() {
            self.store.delete(id).await?;
            return Ok(Some(LoopOutcome::Terminal(fetched)));
        }
        Ok(None)
    }
}
