use std::time::Duration;

use log::*;
use payout_engine::StatusStore;
use tokio::{sync::watch, task::JoinHandle};

/// Starts the worker that removes expired status records. It runs until `shutdown` flips to `true` or its sender is
/// dropped.
pub fn start_expiry_worker<S: StatusStore>(
    store: S,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        info!("🕰️ Expired record sweeper started");
        loop {
            tokio::select! {
                _ = timer.tick() => {},
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                },
            }
            trace!("🕰️ Running expired record sweep");
            match store.purge_expired().await {
                Ok(0) => trace!("🕰️ No expired records"),
                Ok(n) => info!("🕰️ {n} expired records removed"),
                Err(e) => error!("🕰️ Error running expired record sweep: {e}"),
            }
        }
        info!("🕰️ Expired record sweeper has shut down");
    })
}
