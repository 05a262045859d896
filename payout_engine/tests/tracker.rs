use std::time::Duration;

use gateway_tools::GatewayError;
use payout_engine::{
    tracker::{LoopOutcome, PayoutSubscriber, ReconciliationError, ReconciliationLoop, Subscription, SubscriptionError},
    MemoryStatusStore,
    StatusStore,
    StatusStoreError,
};
use pgw_common::TransactionStatus::{self, *};
use tokio::sync::watch;

use crate::support::{
    fakes::{ContendedStore, RecordingLogs, ScriptedStatusSource},
    prepare_env::{fast_tracker, init_logging},
};

mod support;

fn reconciliation_loop(
    id: &str,
    store: &MemoryStatusStore,
    source: &ScriptedStatusSource,
    logs: &RecordingLogs,
) -> (ReconciliationLoop<MemoryStatusStore, ScriptedStatusSource, RecordingLogs>, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    let worker =
        ReconciliationLoop::new(id.to_string(), store.clone(), source.clone(), logs.clone(), fast_tracker(), rx);
    (worker, tx)
}

async fn tracked(store: &MemoryStatusStore, id: &str, status: TransactionStatus) -> MemoryStatusStore {
    store.commit(id, status).await.expect("commit failed");
    store.clone()
}

#[tokio::test(start_paused = true)]
async fn each_distinct_status_is_reported_once() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Pending).await;
    let source = ScriptedStatusSource::statuses([Pending, Pending, WaitingForCapture, WaitingForCapture, Succeeded]);
    let logs = RecordingLogs::default();
    let (worker, _shutdown) = reconciliation_loop("po-1", &store, &source, &logs);

    let outcome = worker.run().await.unwrap();
    assert_eq!(outcome, LoopOutcome::Terminal(Succeeded));
    assert_eq!(logs.upserts_for("po-1"), vec![WaitingForCapture, Succeeded]);
    assert_eq!(source.calls(), 5);
    assert!(!store.exists("po-1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn transient_gateway_errors_skip_the_tick() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Pending).await;
    let source = ScriptedStatusSource::new([
        Err(GatewayError::Transport("connection reset".into())),
        Err(GatewayError::QueryError { status: 503, message: "maintenance".into() }),
        Ok(Canceled),
    ]);
    let logs = RecordingLogs::default();
    let (worker, _shutdown) = reconciliation_loop("po-1", &store, &source, &logs);

    assert_eq!(worker.run().await.unwrap(), LoopOutcome::Terminal(Canceled));
    assert_eq!(source.calls(), 3);
    assert_eq!(logs.upserts_for("po-1"), vec![Canceled]);
}

#[tokio::test(start_paused = true)]
async fn permanent_gateway_errors_end_the_loop() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Pending).await;
    let source = ScriptedStatusSource::new([Err(GatewayError::QueryError { status: 404, message: "unknown".into() })]);
    let logs = RecordingLogs::default();
    let (worker, _shutdown) = reconciliation_loop("po-1", &store, &source, &logs);

    let err = worker.run().await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Gateway { ref payout_id, .. } if payout_id == "po-1"));
    assert!(logs.upserts().is_empty());
    // the record is left to expire
    assert!(store.exists("po-1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn final_status_survives_a_failed_log_write() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Pending).await;
    let source = ScriptedStatusSource::statuses([Succeeded]);
    let logs = RecordingLogs::failing_upserts(1);
    let (worker, _shutdown) = reconciliation_loop("po-1", &store, &source, &logs);

    let err = worker.run().await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Log { ref payout_id, status: Succeeded, .. } if payout_id == "po-1"));
    assert!(logs.upserts().is_empty());
    let records = store.tracked().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, Succeeded);

    // the next startup reconciliation reports it and cleans up
    let subscriber = PayoutSubscriber::new(store.clone(), source, logs.clone(), fast_tracker());
    let report = subscriber.resume_orphans().await.unwrap();
    assert_eq!(report.settled, vec!["po-1".to_string()]);
    assert!(report.resumed.is_empty());
    assert_eq!(logs.upserts_for("po-1"), vec![Succeeded]);
    assert!(!store.exists("po-1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn failed_log_writes_of_interim_statuses_do_not_stop_the_loop() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Pending).await;
    let source = ScriptedStatusSource::statuses([WaitingForCapture, Succeeded]);
    let logs = RecordingLogs::failing_upserts(1);
    let (worker, _shutdown) = reconciliation_loop("po-1", &store, &source, &logs);

    assert_eq!(worker.run().await.unwrap(), LoopOutcome::Terminal(Succeeded));
    assert_eq!(logs.upserts_for("po-1"), vec![Succeeded]);
    assert!(!store.exists("po-1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn orphans_the_log_refuses_are_kept() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Canceled).await;
    let logs = RecordingLogs::failing_upserts(1);
    let source = ScriptedStatusSource::statuses([Canceled]);
    let subscriber = PayoutSubscriber::new(store.clone(), source, logs.clone(), fast_tracker());

    let report = subscriber.resume_orphans().await.unwrap();
    assert!(report.settled.is_empty());
    assert!(report.resumed.is_empty());
    assert!(store.exists("po-1").await.unwrap());

    let report = subscriber.resume_orphans().await.unwrap();
    assert_eq!(report.settled, vec!["po-1".to_string()]);
    assert_eq!(logs.upserts_for("po-1"), vec![Canceled]);
    assert!(!store.exists("po-1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn contended_reads_are_retried() {
    init_logging();
    let store = ContendedStore::new(tracked(&MemoryStatusStore::default(), "po-1", Pending).await, 2);
    let source = ScriptedStatusSource::statuses([Succeeded]);
    let logs = RecordingLogs::default();
    let (_tx, rx) = watch::channel(false);
    let worker = ReconciliationLoop::new("po-1".to_string(), store.clone(), source, logs.clone(), fast_tracker(), rx);

    assert_eq!(worker.run().await.unwrap(), LoopOutcome::Terminal(Succeeded));
    assert_eq!(store.reads(), 3);
    assert_eq!(logs.upserts_for("po-1"), vec![Succeeded]);
    assert!(!store.inner().exists("po-1").await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn persistent_contention_ends_the_loop() {
    init_logging();
    let config = fast_tracker();
    let store = ContendedStore::new(tracked(&MemoryStatusStore::default(), "po-1", Pending).await, 100);
    let source = ScriptedStatusSource::statuses([Succeeded]);
    let logs = RecordingLogs::default();
    let (_tx, rx) = watch::channel(false);
    let worker = ReconciliationLoop::new("po-1".to_string(), store.clone(), source, logs.clone(), config, rx);

    let err = worker.run().await.unwrap_err();
    assert!(matches!(err, ReconciliationError::Store(StatusStoreError::ConcurrentModification { .. })));
    assert_eq!(store.reads(), config.max_read_retries as usize + 1);
    assert!(logs.upserts().is_empty());
    assert_eq!(store.inner().get_status("po-1").await.unwrap(), Pending);
}

#[tokio::test(start_paused = true)]
async fn slow_gateway_counts_as_transient() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Pending).await;
    let source = ScriptedStatusSource::statuses([Succeeded]).with_delay(Duration::from_secs(5));
    let logs = RecordingLogs::default();
    let (tx, rx) = watch::channel(false);
    let mut config = fast_tracker();
    config.ttl = Duration::from_millis(200);
    let worker = ReconciliationLoop::new("po-1".to_string(), store.clone(), source.clone(), logs.clone(), config, rx);

    assert_eq!(worker.run().await.unwrap(), LoopOutcome::ScheduleExhausted);
    assert_eq!(source.calls(), config.schedule().len());
    assert!(logs.upserts().is_empty());
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn removed_records_stop_the_loop() {
    init_logging();
    let store = tracked(&MemoryStatusStore::default(), "po-1", Pending).await;
    let source = ScriptedStatusSource::statuses([Pending]);
    let logs = RecordingLogs::default();
    let (worker, _shutdown) = reconciliation_loop("po-1", &store, &source, &logs);

    let handle = tokio::spawn(worker.run());
    tokio::time::sleep(Duration::from_millis(25)).await;
    store.delete("po-1").await.unwrap();
    assert_eq!(handle.await.unwrap().unwrap(), LoopOutcome::Untracked);
    assert!(logs.upserts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn expired_records_stop_the_loop() {
    init_logging();
    let store = tracked(&MemoryStatusStore::new(Duration::from_millis(30)), "po-1", Pending).await;
    let source = ScriptedStatusSource::statuses([Pending]);
    let logs = RecordingLogs::default();
    let (worker, _shutdown) = reconciliation_loop("po-1", &store, &source, &logs);

    assert_eq!(worker.run().await.unwrap(), LoopOutcome::Untracked);
}

#[tokio::test(start_paused = true)]
async fn subscribing_twice_tracks_once() {
    init_logging();
    let logs = RecordingLogs::default();
    let source = ScriptedStatusSource::statuses([Pending]);
    let subscriber = PayoutSubscriber::new(MemoryStatusStore::default(), source, logs, fast_tracker());

    assert_eq!(subscriber.subscribe("po-1", Pending).await.unwrap(), Subscription::Started);
    assert_eq!(subscriber.subscribe("po-1", Pending).await.unwrap(), Subscription::AlreadyTracked);
    assert_eq!(subscriber.subscribe("po-2", Succeeded).await.unwrap(), Subscription::NothingToTrack);
    assert!(!subscriber.store().exists("po-2").await.unwrap());
    assert_eq!(subscriber.active_loops().await, 1);
    assert!(subscriber.is_running("po-1").await);
    subscriber.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn concurrent_subscribers_race_for_one_loop() {
    init_logging();
    let logs = RecordingLogs::default();
    let source = ScriptedStatusSource::statuses([Pending]);
    let first = PayoutSubscriber::new(MemoryStatusStore::default(), source, logs, fast_tracker());
    let second = first.clone();

    let (a, b) = tokio::join!(first.subscribe("po-1", Pending), second.subscribe("po-1", Pending));
    let mut outcomes = vec![a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|s| format!("{s:?}"));
    assert_eq!(outcomes, vec![Subscription::AlreadyTracked, Subscription::Started]);
    assert_eq!(first.active_loops().await, 1);
    first.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn settled_payouts_release_their_loop() {
    init_logging();
    let logs = RecordingLogs::default();
    let source = ScriptedStatusSource::statuses([WaitingForCapture, Succeeded]);
    let subscriber = PayoutSubscriber::new(MemoryStatusStore::default(), source, logs.clone(), fast_tracker());

    subscriber.subscribe("po-1", Pending).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(subscriber.active_loops().await, 0);
    assert_eq!(logs.upserts_for("po-1"), vec![WaitingForCapture, Succeeded]);
    assert!(subscriber.store().is_empty().await);
    // once settled, the payout can be tracked again
    assert_eq!(subscriber.subscribe("po-1", Pending).await.unwrap(), Subscription::Started);
    subscriber.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn shutdown_keeps_records_for_the_next_process() {
    init_logging();
    let logs = RecordingLogs::default();
    let source = ScriptedStatusSource::statuses([Pending]);
    let subscriber = PayoutSubscriber::new(MemoryStatusStore::default(), source, logs, fast_tracker());

    subscriber.subscribe("po-1", Pending).await.unwrap();
    subscriber.subscribe("po-2", WaitingForCapture).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    subscriber.shutdown().await;

    assert_eq!(subscriber.active_loops().await, 0);
    assert!(subscriber.store().exists("po-1").await.unwrap());
    assert!(subscriber.store().exists("po-2").await.unwrap());
    let err = subscriber.subscribe("po-3", Pending).await.unwrap_err();
    assert!(matches!(err, SubscriptionError::ShuttingDown));
}
