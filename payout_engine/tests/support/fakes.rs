use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
        Mutex,
    },
    time::Duration,
};

use chrono::Utc;
use gateway_tools::{GatewayError, NewPayment, NewPayout, Payment, Payout};
use payout_engine::{
    db_types::{NewTransactionLog, TrackedTransaction, TransactionLog, TransactionType},
    MemoryStatusStore,
    PaymentGateway,
    PayoutGateway,
    PayoutStatusSource,
    StatusStore,
    StatusStoreError,
    TransactionLogError,
    TransactionLogs,
};
use pgw_common::TransactionStatus;

//-------------------------------------- ScriptedStatusSource ---------------------------------------------------------

/// Answers status queries from a script. Once the script runs out, the last successful status is repeated.
#[derive(Clone, Default)]
pub struct ScriptedStatusSource {
    script: Arc<Mutex<VecDeque<Result<TransactionStatus, GatewayError>>>>,
    last: Arc<Mutex<Option<TransactionStatus>>>,
    calls: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl ScriptedStatusSource {
    pub fn new<I>(script: I) -> Self
    where I: IntoIterator<Item = Result<TransactionStatus, GatewayError>> {
        Self { script: Arc::new(Mutex::new(script.into_iter().collect())), ..Default::default() }
    }

    pub fn statuses<I: IntoIterator<Item = TransactionStatus>>(statuses: I) -> Self {
        Self::new(statuses.into_iter().map(Ok))
    }

    /// Every answer takes `delay` to arrive.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

impl PayoutStatusSource for ScriptedStatusSource {
    async fn fetch_payout_status(&self, _payout_id: &str) -> Result<TransactionStatus, GatewayError> {
        *self.calls.lock().unwrap() += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(status)) => {
                *self.last.lock().unwrap() = Some(status);
                Ok(status)
            },
            Some(Err(e)) => Err(e),
            None => self
                .last
                .lock()
                .unwrap()
                .ok_or_else(|| GatewayError::Transport("script is empty".to_string())),
        }
    }
}

//--------------------------------------   RecordingLogs   ------------------------------------------------------------

/// Keeps every call made to the transaction log.
#[derive(Clone, Default)]
pub struct RecordingLogs {
    inserted: Arc<Mutex<Vec<NewTransactionLog>>>,
    upserts: Arc<Mutex<Vec<(String, TransactionStatus)>>>,
    fail_inserts: bool,
    failing_upserts: Arc<AtomicUsize>,
}

impl RecordingLogs {
    pub fn failing_inserts() -> Self {
        Self { fail_inserts: true, ..Default::default() }
    }

    /// The next `count` status upserts fail. Failed upserts are not recorded.
    pub fn failing_upserts(count: usize) -> Self {
        Self { failing_upserts: Arc::new(AtomicUsize::new(count)), ..Default::default() }
    }

    pub fn inserted(&self) -> Vec<NewTransactionLog> {
        self.inserted.lock().unwrap().clone()
    }

    pub fn upserts(&self) -> Vec<(String, TransactionStatus)> {
        self.upserts.lock().unwrap().clone()
    }

    pub fn upserts_for(&self, id: &str) -> Vec<TransactionStatus> {
        self.upserts().into_iter().filter(|(tx, _)| tx == id).map(|(_, s)| s).collect()
    }
}

impl TransactionLogs for RecordingLogs {
    async fn insert_log(&self, log: NewTransactionLog) -> Result<TransactionLog, TransactionLogError> {
        if self.fail_inserts {
            return Err(TransactionLogError::DatabaseError("disk full".to_string()));
        }
        let mut inserted = self.inserted.lock().unwrap();
        inserted.push(log.clone());
        let now = Utc::now();
        Ok(TransactionLog {
            id: inserted.len() as i64,
            transaction_id: log.transaction_id,
            transaction_type: log.transaction_type,
            status: log.status,
            value: log.value,
            currency: log.currency,
            created_at: now,
            updated_at: now,
        })
    }

    async fn upsert_transaction_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> Result<(), TransactionLogError> {
        let failing = self.failing_upserts.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(TransactionLogError::DatabaseError("database is locked".to_string()));
        }
        self.upserts.lock().unwrap().push((transaction_id.to_string(), status));
        Ok(())
    }

    async fn fetch_log(&self, transaction_id: &str) -> Result<Option<TransactionLog>, TransactionLogError> {
        let status = self.upserts_for(transaction_id).last().copied();
        Ok(status.map(|status| {
            let now = Utc::now();
            TransactionLog {
                id: 0,
                transaction_id: transaction_id.to_string(),
                transaction_type: TransactionType::Payout,
                status,
                value: String::default(),
                currency: String::default(),
                created_at: now,
                updated_at: now,
            }
        }))
    }
}

//--------------------------------------   ContendedStore   ------------------------------------------------------------

/// A [`MemoryStatusStore`] whose next `conflicts` status reads fail as if another writer got in first.
#[derive(Clone)]
pub struct ContendedStore {
    inner: MemoryStatusStore,
    conflicts: Arc<AtomicUsize>,
    reads: Arc<AtomicUsize>,
}

impl ContendedStore {
    pub fn new(inner: MemoryStatusStore, conflicts: usize) -> Self {
        Self { inner, conflicts: Arc::new(AtomicUsize::new(conflicts)), reads: Arc::new(AtomicUsize::new(0)) }
    }

    pub fn inner(&self) -> &MemoryStatusStore {
        &self.inner
    }

    /// Every `get_status` call made so far, including the conflicting ones.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl StatusStore for ContendedStore {
    async fn exists(&self, id: &str) -> Result<bool, StatusStoreError> {
        self.inner.exists(id).await
    }

    async fn commit(&self, id: &str, status: TransactionStatus) -> Result<(), StatusStoreError> {
        self.inner.commit(id, status).await
    }

    async fn update_status(&self, id: &str, status: TransactionStatus) -> Result<(), StatusStoreError> {
        self.inner.update_status(id, status).await
    }

    async fn get_status(&self, id: &str) -> Result<TransactionStatus, StatusStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.conflicts.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok() {
            return Err(StatusStoreError::concurrent_modification("get_status", id));
        }
        self.inner.get_status(id).await
    }

    async fn delete(&self, id: &str) -> Result<(), StatusStoreError> {
        self.inner.delete(id).await
    }

    async fn tracked(&self) -> Result<Vec<TrackedTransaction>, StatusStoreError> {
        self.inner.tracked().await
    }

    async fn purge_expired(&self) -> Result<u64, StatusStoreError> {
        self.inner.purge_expired().await
    }
}

//--------------------------------------    FakeGateway    ------------------------------------------------------------

/// Creates payouts and payments with the ids and status it was set up with, and remembers the idempotence keys.
#[derive(Clone)]
pub struct FakeGateway {
    status: TransactionStatus,
    keys: Arc<Mutex<Vec<String>>>,
    error: Option<GatewayError>,
}

impl FakeGateway {
    pub fn new(status: TransactionStatus) -> Self {
        Self { status, keys: Arc::new(Mutex::new(Vec::new())), error: None }
    }

    pub fn failing(error: GatewayError) -> Self {
        Self { error: Some(error), ..Self::new(TransactionStatus::Pending) }
    }

    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }

    fn accept(&self, key: &str) -> Result<String, GatewayError> {
        if let Some(e) = &self.error {
            return Err(e.clone());
        }
        self.keys.lock().unwrap().push(key.to_string());
        Ok(format!("gw-{key}"))
    }
}

impl PayoutGateway for FakeGateway {
    async fn create_payout(&self, idempotence_key: &str, payout: &NewPayout) -> Result<Payout, GatewayError> {
        let id = self.accept(idempotence_key)?;
        Ok(Payout {
            id,
            amount: payout.amount.clone(),
            status: self.status,
            description: payout.description.clone(),
            payout_destination: payout.payout_destination_data.clone(),
            created_at: Some(Utc::now()),
            test: true,
        })
    }
}

impl PaymentGateway for FakeGateway {
    async fn create_payment(&self, idempotence_key: &str, payment: &NewPayment) -> Result<Payment, GatewayError> {
        let id = self.accept(idempotence_key)?;
        Ok(Payment {
            id,
            status: self.status,
            paid: false,
            amount: payment.amount.clone(),
            description: payment.description.clone(),
            confirmation: payment.confirmation.clone(),
            created_at: Some(Utc::now()),
            test: true,
        })
    }
}
