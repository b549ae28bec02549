use chrono::Utc;
use serde_json::Value;
use tracing::debug;

use super::storage::MemoryBackend;
use crate::{JobId, JobRecord, QueueError, QueueResult};

/// Worker-side transitions.
///
/// The gateway never calls these; they stand in for the external worker so
/// that every lifecycle state can be observed in tests and local runs.
impl MemoryBackend {
    /// Pop the oldest job from `queue` and mark it started
    pub fn claim_next(&self, queue: &str) -> Option<JobId> {
        let mut jobs = self.jobs.write();
        let mut queues = self.queues.write();

        let ids = queues.get_mut(queue)?;
        while let Some(job_id) = ids.pop_front() {
            if let Some(record) = jobs.get_mut(&job_id) {
                record.start();
                debug!(job_id = %job_id, queue, "memory store: job claimed");
                return Some(job_id);
            }
        }
        None
    }

    pub fn mark_started(&self, job_id: &JobId) -> QueueResult<()> {
        self.update(job_id, JobRecord::start)?;
        self.remove_from_queues(job_id);
        Ok(())
    }

    pub fn mark_finished(&self, job_id: &JobId, result: Value) -> QueueResult<()> {
        self.update(job_id, |record| record.finish(result))?;
        self.remove_from_queues(job_id);
        Ok(())
    }

    pub fn mark_failed(&self, job_id: &JobId, exc_info: impl Into<String>) -> QueueResult<()> {
        let exc_info = exc_info.into();
        self.update(job_id, |record| record.fail(exc_info))?;
        self.remove_from_queues(job_id);
        Ok(())
    }

    /// Overwrite the record's status with a raw store string (transitional states)
    pub fn set_status(&self, job_id: &JobId, raw: &str) -> QueueResult<()> {
        self.update(job_id, |record| record.status = crate::JobStatus::parse(raw))
    }

    pub fn set_meta(&self, job_id: &JobId, key: impl Into<String>, value: Value) -> QueueResult<()> {
        let key = key.into();
        self.update(job_id, |record| {
            record.meta.insert(key, value);
        })
    }

    /// Drop a record immediately, as a store does once retention elapses
    pub fn evict(&self, job_id: &JobId) -> bool {
        self.remove_from_queues(job_id);
        self.jobs.write().remove(job_id).is_some()
    }

    /// One reaper cycle: remove every terminal record past its retention
    pub fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, record| !record.is_expired(now));
        let purged = before - jobs.len();
        if purged > 0 {
            debug!(purged, "memory store: purged expired jobs");
        }
        purged
    }

    fn update<F>(&self, job_id: &JobId, f: F) -> QueueResult<()>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut jobs = self.jobs.write();
        let record = jobs
            .get_mut(job_id)
            .ok_or_else(|| QueueError::JobNotFound(job_id.to_string()))?;
        f(record);
        Ok(())
    }

    fn remove_from_queues(&self, job_id: &JobId) {
        for ids in self.queues.write().values_mut() {
            ids.retain(|id| id != job_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EnqueuePolicy, JobMessage, JobStatus, QueueBackend};
    use serde_json::json;
    use std::time::Duration;

    fn message() -> JobMessage {
        JobMessage::new("tasks.job_render", "default", json!({"files": ["a.mp4"]}))
    }

    #[tokio::test]
    async fn claim_next_is_fifo() {
        let backend = MemoryBackend::new();
        let first = backend.enqueue(message()).await.unwrap();
        let second = backend.enqueue(message()).await.unwrap();

        assert_eq!(backend.claim_next("default"), Some(first.clone()));
        assert_eq!(backend.claim_next("default"), Some(second));
        assert_eq!(backend.claim_next("default"), None);

        let record = backend.fetch(&first).await.unwrap().unwrap();
        assert_eq!(record.status, JobStatus::Started);
        assert!(record.started_at.is_some());
    }

    #[tokio::test]
    async fn transitions_on_unknown_job_fail() {
        let backend = MemoryBackend::new();
        let missing = JobId::from("missing");
        assert!(matches!(
            backend.mark_failed(&missing, "boom"),
            Err(QueueError::JobNotFound(_))
        ));
        assert!(!backend.evict(&missing));
    }

    #[tokio::test]
    async fn purge_keeps_active_and_unexpired_jobs() {
        let backend = MemoryBackend::new();
        let short = message().with_policy(EnqueuePolicy::default().with_failure_ttl(Duration::ZERO));

        let expired = backend.enqueue(short).await.unwrap();
        let kept = backend.enqueue(message()).await.unwrap();
        let active = backend.enqueue(message()).await.unwrap();
        backend.mark_failed(&expired, "decode error").unwrap();
        backend.mark_finished(&kept, json!("done")).unwrap();

        assert_eq!(backend.purge_expired(), 1);
        assert_eq!(backend.len(), 2);
        assert!(backend.fetch(&active).await.unwrap().is_some());
    }
}
