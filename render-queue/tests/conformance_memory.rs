use std::collections::HashSet;
use std::sync::Arc;

use serde_json::json;

use render_queue::{
    backend::{memory::MemoryBackend, QueueBackend},
    JobId, JobMessage, JobStatus,
};

fn create_test_message() -> JobMessage {
    JobMessage::new(
        "tasks.job_render",
        "default",
        json!({"session_id": "s1", "files": ["http://x/a.mp4"], "mode": "human"}),
    )
}

/// A1. Enqueue creates exactly one queued record with the message as given
#[tokio::test]
async fn test_enqueue_records_message_verbatim() {
    let backend = MemoryBackend::new();
    let message = create_test_message();

    let job_id = backend.enqueue(message.clone()).await.unwrap();
    let record = backend.fetch(&job_id).await.unwrap().unwrap();

    assert_eq!(backend.len(), 1);
    assert_eq!(record.message, message);
    assert_eq!(record.status, JobStatus::Queued);
    assert!(record.started_at.is_none());
    assert!(record.result.is_none());
    assert!(record.exc_info.is_none());
}

/// A2. Full happy path is observable poll by poll
#[tokio::test]
async fn test_lifecycle_is_observable() {
    let backend = MemoryBackend::new();
    let job_id = backend.enqueue(create_test_message()).await.unwrap();

    assert_eq!(backend.claim_next("default"), Some(job_id.clone()));
    let started = backend.fetch(&job_id).await.unwrap().unwrap();
    assert_eq!(started.status, JobStatus::Started);

    backend.set_meta(&job_id, "progress", json!(0.5)).unwrap();
    backend.mark_finished(&job_id, json!({"output": "s3://b/o.mp4"})).unwrap();

    let finished = backend.fetch(&job_id).await.unwrap().unwrap();
    assert_eq!(finished.status, JobStatus::Finished);
    assert_eq!(finished.result, Some(json!({"output": "s3://b/o.mp4"})));
    assert_eq!(finished.meta["progress"], json!(0.5));
    assert!(finished.ended_at.unwrap() >= finished.started_at.unwrap());
}

/// A3. Evicted jobs look exactly like jobs that never existed
#[tokio::test]
async fn test_evicted_job_is_indistinguishable_from_unknown() {
    let backend = MemoryBackend::new();
    let job_id = backend.enqueue(create_test_message()).await.unwrap();
    backend.mark_failed(&job_id, "decode error").unwrap();

    assert!(backend.evict(&job_id));

    assert!(backend.fetch(&job_id).await.unwrap().is_none());
    assert!(backend.fetch(&JobId::from("never-seen")).await.unwrap().is_none());
}

/// A4. Concurrent enqueues through a shared trait object get distinct ids
#[tokio::test]
async fn test_concurrent_enqueue_through_shared_backend() {
    let backend: Arc<dyn QueueBackend> = Arc::new(MemoryBackend::new());

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.enqueue(create_test_message()).await })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap());
    }

    assert_eq!(ids.len(), 32);
    for id in &ids {
        assert!(backend.fetch(id).await.unwrap().is_some());
    }
}
