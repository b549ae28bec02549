use std::sync::Arc;

use chrono::{DateTime, Utc};
use render_queue::{JobId, JobRecord, JobStatus, QueueBackend};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::errors::{RenderError, RenderResult};

/// Caller-facing view of one job.
///
/// `ok` says whether the *job* is healthy so far; a failed job is reported
/// with `ok: false` inside a successful response. `result` is only set for
/// finished jobs and `error` only for failed ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusView {
    pub ok: bool,
    pub id: JobId,
    pub status: String,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub meta: Map<String, Value>,
}

impl StatusView {
    pub fn from_record(record: JobRecord) -> Self {
        let (ok, result, error) = match record.status {
            JobStatus::Finished => (true, Some(record.result.unwrap_or(Value::Null)), None),
            JobStatus::Failed => (false, None, Some(record.exc_info.unwrap_or_default())),
            _ => (true, None, None),
        };

        Self {
            ok,
            id: record.id,
            status: record.status.as_str().to_string(),
            result,
            error,
            enqueued_at: record.enqueued_at,
            started_at: record.started_at,
            ended_at: record.ended_at,
            meta: record.meta,
        }
    }
}

/// Read-only lookups of job state. Never mutates, retries, or re-enqueues.
pub struct StatusService {
    backend: Arc<dyn QueueBackend>,
}

impl StatusService {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self { backend }
    }

    pub async fn get_status(&self, job_id: &str) -> RenderResult<StatusView> {
        let job_id = JobId::from(job_id);
        if job_id.is_blank() {
            crate::bail_render!(not_found, "job id must not be blank");
        }

        let record = self.backend.fetch(&job_id).await.map_err(|e| {
            warn!(job_id = %job_id, error = %e, "job fetch failed");
            RenderError::from(e).into_anyhow()
        })?;

        let Some(record) = record else {
            debug!(job_id = %job_id, "job not found");
            return Err(RenderError::not_found(format!("job {job_id} not found (unknown or expired)"))
                .with_data(serde_json::json!({"job_id": job_id}))
                .into_anyhow());
        };

        debug!(job_id = %job_id, status = %record.status, "job status resolved");
        Ok(StatusView::from_record(record))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthView {
    pub ok: bool,
    pub backend: String,
    pub store: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Store liveness probe. Reports failures instead of raising them.
pub struct HealthService {
    backend: Arc<dyn QueueBackend>,
}

impl HealthService {
    pub fn new(backend: Arc<dyn QueueBackend>) -> Self {
        Self { backend }
    }

    pub async fn check(&self) -> HealthView {
        let backend = self.backend.backend_name().to_string();
        match self.backend.ping().await {
            Ok(()) => HealthView {
                ok: true,
                backend,
                store: true,
                error: None,
            },
            Err(e) => {
                warn!(backend = %backend, error = %e, "store ping failed");
                HealthView {
                    ok: false,
                    backend,
                    store: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use render_queue::JobMessage;
    use serde_json::json;

    fn record() -> JobRecord {
        JobRecord::new(
            JobId::from("j1"),
            JobMessage::new("tasks.job_render", "default", json!({})),
        )
    }

    #[test]
    fn every_store_state_maps_to_one_shape() {
        let queued = StatusView::from_record(record());
        assert!(queued.ok);
        assert_eq!(queued.status, "queued");
        assert!(queued.result.is_none() && queued.error.is_none());

        let mut rec = record();
        rec.start();
        let started = StatusView::from_record(rec.clone());
        assert!(started.ok);
        assert_eq!(started.status, "started");
        assert!(started.result.is_none() && started.error.is_none());

        let mut finished = rec.clone();
        finished.finish(json!({"url": "s3://o.mp4"}));
        let finished = StatusView::from_record(finished);
        assert!(finished.ok);
        assert_eq!(finished.result, Some(json!({"url": "s3://o.mp4"})));
        assert!(finished.error.is_none());

        let mut failed = rec;
        failed.fail("decode error");
        let failed = StatusView::from_record(failed);
        assert!(!failed.ok);
        assert_eq!(failed.status, "failed");
        assert_eq!(failed.error.as_deref(), Some("decode error"));
        assert!(failed.result.is_none());
    }

    #[test]
    fn transitional_store_states_pass_through_raw() {
        let mut rec = record();
        rec.status = JobStatus::parse("deferred");
        let view = StatusView::from_record(rec);
        assert!(view.ok);
        assert_eq!(view.status, "deferred");
        assert!(view.result.is_none() && view.error.is_none());
    }

    #[test]
    fn failed_job_without_detail_has_empty_error() {
        let mut rec = record();
        rec.status = JobStatus::Failed;
        let view = StatusView::from_record(rec);
        assert_eq!(view.error.as_deref(), Some(""));
    }

    #[test]
    fn absent_result_and_error_serialize_as_null() {
        let body = serde_json::to_value(StatusView::from_record(record())).unwrap();
        assert_eq!(body["result"], Value::Null);
        assert_eq!(body["error"], Value::Null);
        assert!(body.as_object().unwrap().contains_key("result"));
        assert!(body.as_object().unwrap().contains_key("error"));
        assert_eq!(body["id"], "j1");
    }
}
