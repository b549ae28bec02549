use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use crate::{
    backend::QueueBackend, JobId, JobMessage, JobRecord, QueueError, QueueResult,
};

/// Default bound on stored records
pub const DEFAULT_MEMORY_CAPACITY: usize = 10_000;

/// In-memory backend for tests and short local runs.
///
/// Nothing here advances jobs unless the worker helpers are called, so queued
/// records never expire on their own. Expired terminal records are purged on
/// every enqueue, and once `capacity` live records are held further enqueues
/// are refused.
pub struct MemoryBackend {
    /// Job records indexed by job_id
    pub(crate) jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,

    /// queue_name -> job_ids in FIFO order
    pub(crate) queues: Arc<RwLock<HashMap<String, VecDeque<JobId>>>>,

    /// Number of enqueue calls received, successful or not
    pub(crate) enqueue_calls: AtomicUsize,

    /// When set, every operation fails as if the store were unreachable
    pub(crate) unavailable: AtomicBool,

    pub(crate) capacity: usize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            queues: Arc::new(RwLock::new(HashMap::new())),
            enqueue_calls: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
            capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Simulate an outage (`true`) or recover from it (`false`)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn enqueue_calls(&self) -> usize {
        self.enqueue_calls.load(Ordering::SeqCst)
    }

    /// Number of stored records, expired ones included
    pub fn len(&self) -> usize {
        self.jobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.read().is_empty()
    }

    /// Job ids waiting in a queue, oldest first
    pub fn queued_ids(&self, queue: &str) -> Vec<JobId> {
        self.queues
            .read()
            .get(queue)
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn check_available(&self) -> QueueResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(QueueError::unavailable("memory store marked unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl QueueBackend for MemoryBackend {
    async fn enqueue(&self, message: JobMessage) -> QueueResult<JobId> {
        self.enqueue_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let job_id = JobId::new();
        let queue_name = message.queue.clone();
        let record = JobRecord::new(job_id.clone(), message);

        // Both locks held together so no reader sees the record without its queue entry
        let mut jobs = self.jobs.write();
        let mut queues = self.queues.write();

        let now = Utc::now();
        jobs.retain(|_, record| !record.is_expired(now));
        if jobs.len() >= self.capacity {
            return Err(QueueError::Backend(format!(
                "memory store full ({} jobs)",
                self.capacity
            )));
        }

        jobs.insert(job_id.clone(), record);
        queues.entry(queue_name.clone()).or_default().push_back(job_id.clone());

        debug!(job_id = %job_id, queue = %queue_name, "memory store: job enqueued");
        Ok(job_id)
    }

    async fn fetch(&self, job_id: &JobId) -> QueueResult<Option<JobRecord>> {
        self.check_available()?;

        let now = Utc::now();
        let mut jobs = self.jobs.write();

        let expired = match jobs.get(job_id) {
            None => return Ok(None),
            Some(record) => record.is_expired(now),
        };

        if expired {
            jobs.remove(job_id);
            debug!(job_id = %job_id, "memory store: evicted expired job");
            return Ok(None);
        }

        Ok(jobs.get(job_id).cloned())
    }

    async fn ping(&self) -> QueueResult<()> {
        self.check_available()
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnqueuePolicy, JobStatus};
    use serde_json::json;
    use std::time::Duration;

    fn create_test_message() -> JobMessage {
        JobMessage::new("tasks.job_render", "default", json!({"files": ["a.mp4"]}))
    }

    #[tokio::test]
    async fn test_enqueue_then_fetch() {
        let backend = MemoryBackend::new();

        let job_id = backend.enqueue(create_test_message()).await.unwrap();
        let record = backend.fetch(&job_id).await.unwrap().unwrap();

        assert_eq!(record.id, job_id);
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.message.kwargs["files"], json!(["a.mp4"]));
        assert_eq!(backend.queued_ids("default"), vec![job_id]);
    }

    #[tokio::test]
    async fn test_fetch_unknown_is_none() {
        let backend = MemoryBackend::new();
        let missing = backend.fetch(&JobId::from("nope")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_writes_nothing() {
        let backend = MemoryBackend::new();
        backend.set_unavailable(true);

        let result = backend.enqueue(create_test_message()).await;

        assert!(matches!(result, Err(QueueError::Unavailable(_))));
        assert_eq!(backend.enqueue_calls(), 1);
        assert!(backend.is_empty());
        assert!(backend.queued_ids("default").is_empty());
        assert!(backend.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_capacity_bounds_live_records() {
        let backend = MemoryBackend::new().with_capacity(2);
        let quick = || create_test_message()
            .with_policy(EnqueuePolicy::default().with_result_ttl(Duration::ZERO));

        let first = backend.enqueue(quick()).await.unwrap();
        backend.enqueue(quick()).await.unwrap();

        let full = backend.enqueue(quick()).await;
        assert!(matches!(full, Err(QueueError::Backend(_))));
        assert!(!full.unwrap_err().is_unavailable());
        assert_eq!(backend.len(), 2);

        backend.mark_finished(&first, json!(null)).unwrap();
        backend.enqueue(quick()).await.unwrap();
        assert_eq!(backend.len(), 2);
        assert_eq!(backend.enqueue_calls(), 4);
    }

    #[tokio::test]
    async fn test_finished_job_is_evicted_after_result_ttl() {
        let backend = MemoryBackend::new();
        let message = create_test_message()
            .with_policy(EnqueuePolicy::default().with_result_ttl(Duration::ZERO));

        let job_id = backend.enqueue(message).await.unwrap();
        backend.mark_finished(&job_id, json!({"ok": true})).unwrap();

        assert!(backend.fetch(&job_id).await.unwrap().is_none());
        assert!(backend.is_empty());
    }
}
