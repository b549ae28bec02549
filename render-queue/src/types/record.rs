use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{JobId, JobMessage, JobStatus};

/// Job record - runtime state owned by the store.
///
/// The gateway creates records through `enqueue` and reads them through
/// `fetch`. Every other transition belongs to the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,

    /// Immutable enqueue-time data
    pub message: JobMessage,

    pub status: JobStatus,

    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,

    /// Handler return value, present once the job finished
    pub result: Option<Value>,

    /// Failure detail (message or trace), present once the job failed
    pub exc_info: Option<String>,

    /// Free-form metadata written by the worker (progress, stage, ...)
    pub meta: Map<String, Value>,
}

impl JobRecord {
    /// Create a freshly queued record
    pub fn new(id: JobId, message: JobMessage) -> Self {
        Self {
            id,
            message,
            status: JobStatus::Queued,
            enqueued_at: Utc::now(),
            started_at: None,
            ended_at: None,
            result: None,
            exc_info: None,
            meta: Map::new(),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == JobStatus::Finished
    }

    pub fn is_failed(&self) -> bool {
        self.status == JobStatus::Failed
    }

    /// Worker claimed the job
    pub fn start(&mut self) {
        self.status = JobStatus::Started;
        self.started_at = Some(Utc::now());
    }

    /// Worker returned successfully
    pub fn finish(&mut self, result: Value) {
        self.status = JobStatus::Finished;
        self.result = Some(result);
        self.exc_info = None;
        self.ended_at = Some(Utc::now());
    }

    /// Worker raised
    pub fn fail(&mut self, exc_info: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.exc_info = Some(exc_info.into());
        self.result = None;
        self.ended_at = Some(Utc::now());
    }

    /// When the store may drop this record, if it is terminal
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let ended_at = self.ended_at?;
        let ttl = match self.status {
            JobStatus::Finished => self.message.policy.result_ttl,
            JobStatus::Failed => self.message.policy.failure_ttl,
            _ => return None,
        };
        let ttl = chrono::Duration::from_std(ttl).ok()?;
        ended_at.checked_add_signed(ttl)
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        matches!(self.expires_at(), Some(at) if at <= now)
    }
}
