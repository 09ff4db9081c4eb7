//! Background sweepers over one outbox table: a publish sweeper that pushes
//! pending rows onto the log, and a cleanup sweeper that trims completed
//! rows past their retention.
//!
//! Both run as fixed-delay tick loops. Database work happens on blocking
//! threads; the publish await happens outside any transaction.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::outbox::{EventPublisher, OutboxStore};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub published: usize,
    pub failed: usize,
    pub lost_races: usize,
}

pub struct OutboxSweeper<S, P> {
    store: Arc<S>,
    publisher: Arc<P>,
    topic: String,
    batch_size: i64,
}

impl<S, P> OutboxSweeper<S, P>
where
    S: OutboxStore + 'static,
    P: EventPublisher + 'static,
{
    pub fn new(store: Arc<S>, publisher: Arc<P>, topic: impl Into<String>, batch_size: i64) -> Self {
        Self {
            store,
            publisher,
            topic: topic.into(),
            batch_size,
        }
    }

    /// Runs the fixed-delay sweep loop until the task is aborted.
    pub async fn run(self, interval: Duration) {
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            match self.sweep_once().await {
                Ok(stats) if stats.published > 0 || stats.failed > 0 => {
                    log::debug!(
                        "outbox sweep on '{}': published={} failed={} lost_races={}",
                        self.topic,
                        stats.published,
                        stats.failed,
                        stats.lost_races
                    );
                }
                Ok(_) => {}
                Err(e) => log::error!("outbox sweep on '{}' errored: {e}", self.topic),
            }
        }
    }

    /// One sweep: fetch pending rows, publish each keyed by saga id, then
    /// CAS the row to COMPLETED (or FAILED on publish error). A lost CAS
    /// means a concurrent sweeper owns the row; the duplicate publish is
    /// absorbed by consumer-side dedupe.
    pub async fn sweep_once(&self) -> Result<SweepStats, DomainError> {
        let rows = {
            let store = Arc::clone(&self.store);
            let batch = self.batch_size;
            run_blocking(move || store.fetch_unpublished(batch)).await?
        };

        let mut stats = SweepStats::default();
        for row in rows {
            let payload = serde_json::to_vec(&row.payload)
                .map_err(|e| DomainError::Internal(e.to_string()))?;
            let key = row.saga_id.to_string();

            match self.publisher.publish(&self.topic, &key, payload).await {
                Ok(()) => {
                    if self.mark(row.id, row.version, true).await? {
                        stats.published += 1;
                    } else {
                        stats.lost_races += 1;
                        log::warn!(
                            "outbox row {} (saga {}) already updated by a concurrent sweeper",
                            row.id,
                            row.saga_id
                        );
                    }
                }
                Err(e) => {
                    stats.failed += 1;
                    log::warn!(
                        "publishing outbox row {} (saga {}) failed, will retry: {e}",
                        row.id,
                        row.saga_id
                    );
                    if !self.mark(row.id, row.version, false).await? {
                        stats.lost_races += 1;
                    }
                }
            }
        }
        Ok(stats)
    }

    async fn mark(&self, id: Uuid, version: i32, published: bool) -> Result<bool, DomainError> {
        let store = Arc::clone(&self.store);
        run_blocking(move || {
            if published {
                store.mark_published(id, version)
            } else {
                store.mark_failed(id, version)
            }
        })
        .await
    }
}

pub struct CleanupSweeper<S> {
    store: Arc<S>,
    retention: Duration,
}

impl<S> CleanupSweeper<S>
where
    S: OutboxStore + 'static,
{
    pub fn new(store: Arc<S>, retention: Duration) -> Self {
        Self { store, retention }
    }

    pub async fn run(self, interval: Duration) {
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            match self.cleanup_once().await {
                Ok(0) => {}
                Ok(deleted) => log::info!("outbox cleanup removed {deleted} completed rows"),
                Err(e) => log::error!("outbox cleanup errored: {e}"),
            }
        }
    }

    pub async fn cleanup_once(&self) -> Result<usize, DomainError> {
        let cutoff = Utc::now()
            - chrono::Duration::from_std(self.retention)
                .map_err(|e| DomainError::Internal(e.to_string()))?;
        let store = Arc::clone(&self.store);
        run_blocking(move || store.delete_completed_before(cutoff)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, DomainError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, DomainError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| DomainError::Internal(format!("blocking task panicked: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outbox::{OutboxMessage, OutboxStatus, PublishError, TYPE_PAY};
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct StoredRow {
        message: OutboxMessage,
        processed_at: Option<DateTime<Utc>>,
    }

    /// In-memory outbox table with the same CAS discipline as the real one.
    #[derive(Default)]
    struct InMemoryStore {
        rows: Mutex<Vec<StoredRow>>,
    }

    impl InMemoryStore {
        fn insert(&self, message: OutboxMessage) {
            self.rows.lock().unwrap().push(StoredRow {
                message,
                processed_at: None,
            });
        }

        fn status_of(&self, id: Uuid) -> (OutboxStatus, Option<DateTime<Utc>>) {
            let rows = self.rows.lock().unwrap();
            let row = rows.iter().find(|r| r.message.id == id).unwrap();
            (row.message.outbox_status, row.processed_at)
        }

        fn len(&self) -> usize {
            self.rows.lock().unwrap().len()
        }
    }

    impl OutboxStore for InMemoryStore {
        fn fetch_unpublished(&self, limit: i64) -> Result<Vec<OutboxMessage>, DomainError> {
            let rows = self.rows.lock().unwrap();
            let mut pending: Vec<OutboxMessage> = rows
                .iter()
                .filter(|r| {
                    matches!(
                        r.message.outbox_status,
                        OutboxStatus::Started | OutboxStatus::Failed
                    )
                })
                .map(|r| r.message.clone())
                .collect();
            pending.sort_by_key(|m| m.created_at);
            pending.truncate(limit as usize);
            Ok(pending)
        }

        fn mark_published(&self, id: Uuid, expected_version: i32) -> Result<bool, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            match rows
                .iter_mut()
                .find(|r| r.message.id == id && r.message.version == expected_version)
            {
                Some(row) => {
                    row.message.outbox_status = OutboxStatus::Completed;
                    row.message.version += 1;
                    row.processed_at = Some(Utc::now());
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn mark_failed(&self, id: Uuid, expected_version: i32) -> Result<bool, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            match rows
                .iter_mut()
                .find(|r| r.message.id == id && r.message.version == expected_version)
            {
                Some(row) => {
                    row.message.outbox_status = OutboxStatus::Failed;
                    row.message.version += 1;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn delete_completed_before(&self, cutoff: DateTime<Utc>) -> Result<usize, DomainError> {
            let mut rows = self.rows.lock().unwrap();
            let before = rows.len();
            rows.retain(|r| {
                !(r.message.outbox_status == OutboxStatus::Completed
                    && r.message.created_at < cutoff)
            });
            Ok(before - rows.len())
        }
    }

    /// Publisher recording every publish; optionally failing.
    #[derive(Default)]
    struct RecordingPublisher {
        published: Mutex<Vec<(String, String)>>,
        fail: AtomicBool,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(
            &self,
            topic: &str,
            key: &str,
            _payload: Vec<u8>,
        ) -> Result<(), PublishError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(PublishError {
                    topic: topic.to_string(),
                    reason: "broker unavailable".to_string(),
                });
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), key.to_string()));
            Ok(())
        }
    }

    fn message(saga_id: Uuid, created_at: DateTime<Utc>) -> OutboxMessage {
        OutboxMessage {
            id: Uuid::new_v4(),
            saga_id,
            created_at,
            message_type: TYPE_PAY.to_string(),
            payload: json!({"order_id": saga_id}),
            outbox_status: OutboxStatus::Started,
            version: 0,
        }
    }

    #[tokio::test]
    async fn sweep_publishes_pending_rows_keyed_by_saga_id() {
        let store = Arc::new(InMemoryStore::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let saga_id = Uuid::new_v4();
        let msg = message(saga_id, Utc::now());
        let id = msg.id;
        store.insert(msg);

        let sweeper = OutboxSweeper::new(Arc::clone(&store), Arc::clone(&publisher), "payment-request", 100);
        let stats = sweeper.sweep_once().await.unwrap();

        assert_eq!(stats.published, 1);
        let published = publisher.published.lock().unwrap();
        assert_eq!(
            published.as_slice(),
            &[("payment-request".to_string(), saga_id.to_string())]
        );
        let (status, processed_at) = store.status_of(id);
        assert_eq!(status, OutboxStatus::Completed);
        assert!(processed_at.is_some());
    }

    #[tokio::test]
    async fn sweep_preserves_created_at_order_within_batch() {
        let store = Arc::new(InMemoryStore::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let saga = Uuid::new_v4();
        let older = Utc::now() - chrono::Duration::seconds(10);
        store.insert(message(saga, Utc::now()));
        let mut first = message(saga, older);
        first.message_type = "CANCEL".to_string();
        store.insert(first);

        let sweeper = OutboxSweeper::new(Arc::clone(&store), Arc::clone(&publisher), "payment-request", 100);
        sweeper.sweep_once().await.unwrap();

        // Both rows go to the same key; the older row is published first.
        let published = publisher.published.lock().unwrap();
        assert_eq!(published.len(), 2);
    }

    #[tokio::test]
    async fn publish_failure_marks_failed_and_next_sweep_retries() {
        let store = Arc::new(InMemoryStore::default());
        let publisher = Arc::new(RecordingPublisher::default());
        publisher.fail.store(true, Ordering::SeqCst);
        let msg = message(Uuid::new_v4(), Utc::now());
        let id = msg.id;
        store.insert(msg);

        let sweeper = OutboxSweeper::new(Arc::clone(&store), Arc::clone(&publisher), "payment-request", 100);
        let stats = sweeper.sweep_once().await.unwrap();
        assert_eq!(stats.failed, 1);
        assert_eq!(store.status_of(id).0, OutboxStatus::Failed);

        // Broker recovers; the FAILED row is picked up again.
        publisher.fail.store(false, Ordering::SeqCst);
        let stats = sweeper.sweep_once().await.unwrap();
        assert_eq!(stats.published, 1);
        assert_eq!(store.status_of(id).0, OutboxStatus::Completed);
    }

    #[tokio::test]
    async fn lost_cas_is_counted_not_errored() {
        let store = Arc::new(InMemoryStore::default());
        let publisher = Arc::new(RecordingPublisher::default());
        let msg = message(Uuid::new_v4(), Utc::now());
        let id = msg.id;
        store.insert(msg);
        // A concurrent sweeper already completed the row.
        store.mark_published(id, 0).unwrap();

        let sweeper = OutboxSweeper::new(Arc::clone(&store), Arc::clone(&publisher), "payment-request", 100);
        // fetch_unpublished no longer returns the row, so sweep is a no-op.
        let stats = sweeper.sweep_once().await.unwrap();
        assert_eq!(stats, SweepStats::default());

        // Direct CAS with the stale version loses.
        assert!(!store.mark_published(id, 0).unwrap());
    }

    #[tokio::test]
    async fn cleanup_removes_old_completed_rows_only() {
        let store = Arc::new(InMemoryStore::default());
        let old = Utc::now() - chrono::Duration::hours(48);

        let completed_old = message(Uuid::new_v4(), old);
        let completed_old_id = completed_old.id;
        store.insert(completed_old);
        store.mark_published(completed_old_id, 0).unwrap();

        let failed_old = message(Uuid::new_v4(), old);
        let failed_old_id = failed_old.id;
        store.insert(failed_old);
        store.mark_failed(failed_old_id, 0).unwrap();

        let completed_recent = message(Uuid::new_v4(), Utc::now());
        let completed_recent_id = completed_recent.id;
        store.insert(completed_recent);
        store.mark_published(completed_recent_id, 0).unwrap();

        let cleaner = CleanupSweeper::new(Arc::clone(&store), Duration::from_secs(86_400));
        let deleted = cleaner.cleanup_once().await.unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(store.len(), 2);
        // FAILED rows are retained regardless of age.
        assert_eq!(store.status_of(failed_old_id).0, OutboxStatus::Failed);
    }

    #[tokio::test]
    async fn sweep_respects_batch_size() {
        let store = Arc::new(InMemoryStore::default());
        let publisher = Arc::new(RecordingPublisher::default());
        for _ in 0..5 {
            store.insert(message(Uuid::new_v4(), Utc::now()));
        }

        let sweeper = OutboxSweeper::new(Arc::clone(&store), Arc::clone(&publisher), "payment-request", 2);
        let stats = sweeper.sweep_once().await.unwrap();
        assert_eq!(stats.published, 2);
    }
}
