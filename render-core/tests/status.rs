use std::sync::Arc;
use std::time::Duration;

use render_core::{
    ErrorKind, HealthService, JobRequest, ModePolicy, QueueSettings, RenderError, StatusService,
    SubmissionService,
};
use render_queue::{backend::memory::MemoryBackend, EnqueuePolicy, JobId};
use serde_json::json;

struct Harness {
    backend: Arc<MemoryBackend>,
    submit: SubmissionService,
    status: StatusService,
}

fn harness(policy: EnqueuePolicy) -> Harness {
    let backend = Arc::new(MemoryBackend::new());
    let queue = QueueSettings {
        policy,
        ..QueueSettings::default()
    };
    Harness {
        submit: SubmissionService::new(backend.clone(), queue),
        status: StatusService::new(backend.clone()),
        backend,
    }
}

impl Harness {
    async fn submit(&self) -> JobId {
        self.submit
            .submit_request(JobRequest::with_files(["http://x/a.mp4"]), &ModePolicy::default())
            .await
            .unwrap()
            .job_id
    }
}

fn error_kind(err: &anyhow::Error) -> ErrorKind {
    RenderError::from_anyhow(err).expect("structured error").kind
}

#[tokio::test]
async fn scenario_a_poll_before_completion() {
    let h = harness(EnqueuePolicy::default());
    let job_id = h.submit().await;

    let view = h.status.get_status(job_id.as_str()).await.unwrap();
    assert!(view.ok);
    assert_eq!(view.status, "queued");
    assert!(view.result.is_none() && view.error.is_none());

    h.backend.claim_next("default").unwrap();
    let view = h.status.get_status(job_id.as_str()).await.unwrap();
    assert_eq!(view.status, "started");
    assert!(view.started_at.is_some());
    assert!(view.result.is_none() && view.error.is_none());
}

#[tokio::test]
async fn scenario_d_unknown_id_is_not_found() {
    let h = harness(EnqueuePolicy::default());

    let err = h.status.get_status("nonexistent-id").await.unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::NotFound);

    let err = h.status.get_status("   ").await.unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn scenario_e_failed_job_reports_detail() {
    let h = harness(EnqueuePolicy::default());
    let job_id = h.submit().await;
    h.backend.mark_failed(&job_id, "decode error").unwrap();

    let view = h.status.get_status(job_id.as_str()).await.unwrap();

    assert!(!view.ok);
    assert_eq!(view.status, "failed");
    assert_eq!(view.error.as_deref(), Some("decode error"));
    assert!(view.result.is_none());
    assert!(view.ended_at.is_some());
}

#[tokio::test]
async fn finished_job_exposes_result_and_meta() {
    let h = harness(EnqueuePolicy::default());
    let job_id = h.submit().await;
    h.backend.mark_started(&job_id).unwrap();
    h.backend.set_meta(&job_id, "stage", json!("upload")).unwrap();
    h.backend
        .mark_finished(&job_id, json!({"output_url": "s3://editdna/outputs/x.mp4"}))
        .unwrap();

    let view = h.status.get_status(job_id.as_str()).await.unwrap();

    assert!(view.ok);
    assert_eq!(view.status, "finished");
    assert_eq!(view.result, Some(json!({"output_url": "s3://editdna/outputs/x.mp4"})));
    assert!(view.error.is_none());
    assert_eq!(view.meta["stage"], json!("upload"));
}

#[tokio::test]
async fn polling_never_mutates_the_job() {
    let h = harness(EnqueuePolicy::default());
    let job_id = h.submit().await;
    h.backend.mark_failed(&job_id, "boom").unwrap();

    let before = h.status.get_status(job_id.as_str()).await.unwrap();
    let after = h.status.get_status(job_id.as_str()).await.unwrap();

    assert_eq!(before, after);
    assert_eq!(h.backend.enqueue_calls(), 1);
    assert!(h.backend.queued_ids("default").is_empty());
}

#[tokio::test]
async fn job_expired_between_polls_becomes_not_found() {
    let h = harness(EnqueuePolicy::default().with_result_ttl(Duration::ZERO));
    let job_id = h.submit().await;

    assert!(h.status.get_status(job_id.as_str()).await.is_ok());
    h.backend.mark_finished(&job_id, json!(null)).unwrap();

    let err = h.status.get_status(job_id.as_str()).await.unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::NotFound);
}

#[tokio::test]
async fn store_outage_while_polling_is_not_a_not_found() {
    let h = harness(EnqueuePolicy::default());
    let job_id = h.submit().await;
    h.backend.set_unavailable(true);

    let err = h.status.get_status(job_id.as_str()).await.unwrap_err();
    assert_eq!(error_kind(&err), ErrorKind::QueueUnavailable);
}

#[tokio::test]
async fn health_reports_store_state() {
    let backend = Arc::new(MemoryBackend::new());
    let health = HealthService::new(backend.clone());

    let up = health.check().await;
    assert!(up.ok && up.store);
    assert_eq!(up.backend, "memory");
    assert!(up.error.is_none());

    backend.set_unavailable(true);
    let down = health.check().await;
    assert!(!down.ok && !down.store);
    assert!(down.error.unwrap().contains("unavailable"));
}

#[tokio::test]
async fn blank_id_is_not_found_without_a_store_lookup() {
    let h = harness(EnqueuePolicy::default());
    h.backend.set_unavailable(true);

    for id in ["", "   "] {
        let err = h.status.get_status(id).await.unwrap_err();
        assert_eq!(error_kind(&err), ErrorKind::NotFound, "id {id:?}");
    }
}

#[tokio::test]
async fn transitional_store_state_is_reported_raw() {
    let h = harness(EnqueuePolicy::default());
    let id = h.submit().await;
    h.backend.set_status(&id, "deferred").unwrap();

    let view = h.status.get_status(id.as_str()).await.unwrap();

    assert!(view.ok);
    assert_eq!(view.status, "deferred");
    assert!(view.result.is_none() && view.error.is_none());
}
