//! A process-local [`StatusStore`]. Records do not survive a restart, so it suits tests and single-shot tools.
use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::Utc;
use log::*;
use pgw_common::TransactionStatus;
use tokio::{sync::Mutex, time::Instant};

use crate::{
    db_types::TrackedTransaction,
    traits::{StatusStore, StatusStoreError, DEFAULT_RECORD_TTL},
};

#[derive(Debug, Clone)]
struct Entry {
    status: TransactionStatus,
    version: i64,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

#[derive(Debug, Clone)]
pub struct MemoryStatusStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new(DEFAULT_RECORD_TTL)
    }
}

impl MemoryStatusStore {
    pub fn new(ttl: Duration) -> Self {
        Self { entries: Arc::new(Mutex::new(HashMap::new())), ttl }
    }

    /// Number of records held, expired ones included.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl StatusStore for MemoryStatusStore {
    async fn exists(&self, id: &str) -> Result<bool, StatusStoreError> {
        let entries = self.entries.lock().await;
        Ok(entries.get(id).is_some_and(|e| e.is_live(Instant::now())))
    }

    async fn commit(&self, id: &str, status: TransactionStatus) -> Result<(), StatusStoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if entries.get(id).is_some_and(|e| e.is_live(now)) {
            return Err(StatusStoreError::already_tracked("commit", id));
        }
        entries.insert(id.to_string(), Entry { status, version: 1, expires_at: now + self.ttl });
        debug!("🗃️ {id} is now tracked with status {status}");
        Ok(())
    }

    async fn update_status(&self, id: &str, status: TransactionStatus) -> Result<(), StatusStoreError> {
        let mut entries = self.entries.lock().await;
        match entries.get_mut(id) {
            Some(entry) if entry.is_live(Instant::now()) => {
                entry.status = status;
                entry.version += 1;
                Ok(())
            },
            _ => Err(StatusStoreError::not_tracked("update_status", id)),
        }
    }

    async fn get_status(&self, id: &str) -> Result<TransactionStatus, StatusStoreError> {
        let mut entries = self.entries.lock().await;
        let status = match entries.get(id) {
            Some(entry) if entry.is_live(Instant::now()) => entry.status,
            _ => return Err(StatusStoreError::not_tracked("get_status", id)),
        };
        if status.is_terminal() {
            entries.remove(id);
            debug!("🗃️ {id} reached {status} and is no longer tracked");
        }
        Ok(status)
    }

    async fn delete(&self, id: &str) -> Result<(), StatusStoreError> {
        self.entries.lock().await.remove(id);
        Ok(())
    }

    async fn tracked(&self) -> Result<Vec<TrackedTransaction>, StatusStoreError> {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        let wall_now = Utc::now();
        let records = entries
            .iter()
            .filter(|(_, e)| e.is_live(now))
            .map(|(id, e)| {
                let remaining = chrono::Duration::from_std(e.expires_at - now).unwrap_or(chrono::Duration::zero());
                TrackedTransaction {
                    id: id.clone(),
                    status: e.status,
                    version: e.version,
                    expires_at: wall_now + remaining,
                }
            })
            .collect();
        Ok(records)
    }

    async fn purge_expired(&self) -> Result<u64, StatusStoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        Ok((before - entries.len()) as u64)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn commit_then_read() {
        let store = MemoryStatusStore::default();
        store.commit("tx1", TransactionStatus::Pending).await.unwrap();
        assert!(store.exists("tx1").await.unwrap());
        assert_eq!(store.get_status("tx1").await.unwrap(), TransactionStatus::Pending);
        assert!(store.exists("tx1").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_commit() {
        let store = MemoryStatusStore::default();
        store.commit("tx1", TransactionStatus::Pending).await.unwrap();
        let err = store.commit("tx1", TransactionStatus::Pending).await.unwrap_err();
        assert_eq!(err, StatusStoreError::already_tracked("commit", "tx1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn terminal_read_cleans_up() {
        let store = MemoryStatusStore::default();
        store.commit("tx1", TransactionStatus::Pending).await.unwrap();
        store.update_status("tx1", TransactionStatus::Succeeded).await.unwrap();
        assert_eq!(store.get_status("tx1").await.unwrap(), TransactionStatus::Succeeded);
        assert!(!store.exists("tx1").await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn update_missing() {
        let store = MemoryStatusStore::default();
        let err = store.update_status("missing", TransactionStatus::Succeeded).await.unwrap_err();
        assert!(matches!(err, StatusStoreError::NotTracked { op: "update_status", .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn records_expire() {
        let store = MemoryStatusStore::new(Duration::from_secs(60));
        store.commit("tx1", TransactionStatus::Pending).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        store.update_status("tx1", TransactionStatus::WaitingForCapture).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!store.exists("tx1").await.unwrap());
        assert!(store.get_status("tx1").await.is_err());
        // an expired record does not block a new commit
        store.commit("tx1", TransactionStatus::Pending).await.unwrap();
        assert_eq!(store.tracked().await.unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn purge() {
        let store = MemoryStatusStore::new(Duration::from_secs(10));
        store.commit("old", TransactionStatus::Pending).await.unwrap();
        tokio::time::advance(Duration::from_secs(11)).await;
        store.commit("new", TransactionStatus::Pending).await.unwrap();
        assert_eq!(store.purge_expired().await.unwrap(), 1);
        assert_eq!(store.len().await, 1);
    }
}
