use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use futures_util::future::join_all;
use log::*;
use pgw_common::TransactionStatus;
use thiserror::Error;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};

use crate::{
    tracker::{
        reconciliation::{LoopOutcome, ReconciliationLoop},
        TrackerConfig,
    },
    traits::{PayoutStatusSource, StatusStore, StatusStoreError, TransactionLogs},
};

/// What [`PayoutSubscriber::subscribe`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subscription {
    /// A record was committed and a reconciliation loop started.
    Started,
    /// Someone else is already tracking the payout.
    AlreadyTracked,
    /// The payout is already in a terminal status.
    NothingToTrack,
}

/// Outcome of [`PayoutSubscriber::resume_orphans`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeReport {
    /// Payouts that got a fresh reconciliation loop.
    pub resumed: Vec<String>,
    /// Payouts that were found in a terminal status. They were reported and removed from the store.
    pub settled: Vec<String>,
}

#[derive(Debug, Clone, Error)]
pub enum SubscriptionError {
    #[error("Could not register the payout for tracking. {0}")]
    Store(#[from] StatusStoreError),
    #[error("The payout tracker is shutting down")]
    ShuttingDown,
}

/// Registers payouts for tracking and owns the reconciliation loops that track them.
///
/// There is at most one loop per payout: the status store's `commit` only succeeds for one caller, and only that
/// caller starts a loop. All loops share one shutdown signal, fired by [`PayoutSubscriber::shutdown`].
pub struct PayoutSubscriber<S, G, L> {
    store: S,
    source: G,
    logs: L,
    config: TrackerConfig,
    loops: Arc<Mutex<HashMap<String, LoopHandle>>>,
    next_token: Arc<AtomicU64>,
    shutdown: Arc<watch::Sender<bool>>,
}

struct LoopHandle {
    token: u64,
    handle: JoinHandle<()>,
}

impl<S: Clone, G: Clone, L: Clone> Clone for PayoutSubscriber<S, G, L> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            source: self.source.clone(),
            logs: self.logs.clone(),
            config: self.config,
            loops: Arc::clone(&self.loops),
            next_token: Arc::clone(&self.next_token),
            shutdown: Arc::clone(&self.shutdown),
        }
    }
}

impl<S, G, L> PayoutSubscriber<S, G, L>
where
    S: StatusStore,
    G: PayoutStatusSource,
    L: TransactionLogs,
{
    pub fn new(store: S, source: G, logs: L, config: TrackerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            source,
            logs,
            config,
            loops: Arc::new(Mutex::new(HashMap::new())),
            next_token: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(shutdown),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts tracking `payout_id` unless that is pointless or somebody else already does. Returns as soon as the
    /// reconciliation loop has been spawned.
    pub async fn subscribe(
        &self,
        payout_id: &str,
        initial_status: TransactionStatus,
    ) -> Result<Subscription, SubscriptionError> {
        if initial_status.is_terminal() {
            debug!("📡️ {payout_id} is already {initial_status}. Nothing to track.");
            return Ok(Subscription::NothingToTrack);
        }
        if *self.shutdown.borrow() {
            return Err(SubscriptionError::ShuttingDown);
        }
        if self.store.exists(payout_id).await? {
            debug!("📡️ {payout_id} is already being tracked");
            return Ok(Subscription::AlreadyTracked);
        }
        match self.store.commit(payout_id, initial_status).await {
            Ok(()) => {},
            Err(StatusStoreError::AlreadyTracked { .. }) => {
                debug!("📡️ Lost the race to track {payout_id}. Someone else has it.");
                return Ok(Subscription::AlreadyTracked);
            },
            Err(e) => return Err(e.into()),
        }
        self.spawn_loop(payout_id.to_string()).await;
        info!("📡️ Tracking payout {payout_id} ({initial_status})");
        Ok(Subscription::Started)
    }

    /// Picks up the records left behind by a previous process.
    ///
    /// Non-terminal records get a reconciliation loop without being committed again. Terminal leftovers are reported
    /// to the transaction log and removed. A terminal leftover the log refuses is kept for the next run.
    pub async fn resume_orphans(&self) -> Result<ResumeReport, SubscriptionError> {
        let mut report = ResumeReport::default();
        for record in self.store.tracked().await? {
            if record.status.is_terminal() {
                let (id, status) = (&record.id, record.status);
                if let Err(e) = self.logs.upsert_transaction_status(id, status).await {
                    error!("📡️ Could not record status {status} for {id} in the transaction log. Keeping it. {e}");
                    continue;
                }
                self.store.delete(&record.id).await?;
                report.settled.push(record.id);
            } else if self.is_running(&record.id).await {
                debug!("📡️ {} already has a reconciliation loop", record.id);
            } else {
                self.spawn_loop(record.id.clone()).await;
                report.resumed.push(record.id);
            }
        }
        info!(
            "📡️ Startup reconciliation: {} payouts resumed, {} settled payouts cleaned up",
            report.resumed.len(),
            report.settled.len()
        );
        Ok(report)
    }

    /// The number of reconciliation loops still running.
    pub async fn active_loops(&self) -> usize {
        self.loops.lock().await.values().filter(|l| !l.handle.is_finished()).count()
    }

    pub async fn is_running(&self, payout_id: &str) -> bool {
        self.loops.lock().await.get(payout_id).is_some_and(|l| !l.handle.is_finished())
    }

    /// Signals every loop to stop and waits for them to do so. Records stay in the store.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let handles = self.loops.lock().await.drain().map(|(_, l)| l.handle).collect::<Vec<_>>();
        info!("📡️ Waiting for {} reconciliation loops to stop", handles.len());
        for result in join_all(handles).await {
            if let Err(e) = result {
                warn!("📡️ A reconciliation loop did not stop cleanly. {e}");
            }
        }
        info!("📡️ Payout tracker has shut down");
    }

    /// Spawns the loop for `payout_id`. A loop of this process that still holds the slot for the same payout can only
    /// be on its way out, since its record is gone; it is detached and finishes on its own.
    async fn spawn_loop(&self, payout_id: String) {
        let mut loops = self.loops.lock().await;
        let worker = ReconciliationLoop::new(
            payout_id.clone(),
            self.store.clone(),
            self.source.clone(),
            self.logs.clone(),
            self.config,
            self.shutdown.subscribe(),
        );
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(&self.loops);
        let key = payout_id.clone();
        let handle = tokio::spawn(async move {
            match worker.run().await {
                Ok(LoopOutcome::Terminal(status)) => info!("📡️ Payout {key} settled as {status}"),
                Ok(outcome) => debug!("📡️ Stopped tracking {key}: {outcome:?}"),
                Err(e) => error!("📡️ Tracking of payout {key} failed. {e}"),
            }
            let mut loops = registry.lock().await;
            if loops.get(&key).is_some_and(|l| l.token == token) {
                loops.remove(&key);
            }
        });
        loops.insert(payout_id, LoopHandle { token, handle });
    }
}
