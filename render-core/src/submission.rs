use std::sync::Arc;

use render_queue::{JobId, JobMessage, QueueBackend};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::config::QueueSettings;
use crate::contract::{PAYLOAD_SCHEMA_VERSION, RENDER_HANDLER};
use crate::errors::{RenderError, RenderResult};
use crate::payload::{normalize, JobPayload, JobRequest, ModePolicy};

/// Answer to a successful submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub ok: bool,
    pub job_id: JobId,
    pub status: String,
}

impl SubmissionResult {
    pub fn queued(job_id: JobId) -> Self {
        Self {
            ok: true,
            job_id,
            status: "queued".to_string(),
        }
    }
}

/// Validates payloads and enqueues exactly one job per accepted submission.
///
/// There is no retry loop here: a second enqueue after an ambiguous failure
/// could run the render twice, so retrying is left to the caller.
pub struct SubmissionService {
    backend: Arc<dyn QueueBackend>,
    queue: QueueSettings,
}

impl SubmissionService {
    pub fn new(backend: Arc<dyn QueueBackend>, queue: QueueSettings) -> Self {
        Self { backend, queue }
    }

    /// Check `files` first, then normalize and submit
    pub async fn submit_request(
        &self,
        request: JobRequest,
        modes: &ModePolicy,
    ) -> RenderResult<SubmissionResult> {
        ensure_files(&request.files)?;
        self.submit(normalize(request, modes)).await
    }

    pub async fn submit(&self, payload: JobPayload) -> RenderResult<SubmissionResult> {
        ensure_files(&payload.files)?;

        let kwargs = payload.to_kwargs().map_err(|e| {
            RenderError::general_error(format!("failed to encode job payload: {e}")).into_anyhow()
        })?;

        let message = JobMessage::new(RENDER_HANDLER, self.queue.name.clone(), kwargs)
            .with_schema_version(PAYLOAD_SCHEMA_VERSION)
            .with_policy(self.queue.policy);

        let job_id = self.backend.enqueue(message).await.map_err(|e| {
            warn!(
                queue = %self.queue.name,
                backend = self.backend.backend_name(),
                error = %e,
                "enqueue failed"
            );
            RenderError::from(e).into_anyhow()
        })?;

        info!(
            job_id = %job_id,
            queue = %self.queue.name,
            handler = RENDER_HANDLER,
            session_id = %payload.session_id,
            mode = %payload.mode,
            files = payload.files.len(),
            "render job enqueued"
        );

        Ok(SubmissionResult::queued(job_id))
    }
}

fn ensure_files(files: &[String]) -> RenderResult<()> {
    if files.is_empty() {
        return Err(RenderError::validation("files must contain at least one entry")
            .with_errors(json!({"files": ["must not be empty"]}))
            .into_anyhow());
    }
    Ok(())
}
