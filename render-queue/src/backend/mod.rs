#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

use async_trait::async_trait;

use crate::{JobId, JobMessage, JobRecord, QueueResult};

/// Backend trait for queue store primitives.
///
/// Implementations must be safe to share across concurrent requests; the
/// gateway holds one instance behind an `Arc` for the life of the process.
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Atomically create a queued job record and append it to its queue.
    /// Either a job exists afterwards and its id is returned, or nothing was written.
    async fn enqueue(&self, message: JobMessage) -> QueueResult<JobId>;

    /// Fetch a job record. `None` when the id was never seen or has been evicted.
    async fn fetch(&self, job_id: &JobId) -> QueueResult<Option<JobRecord>>;

    /// Cheap connectivity probe
    async fn ping(&self) -> QueueResult<()>;

    /// Short name for logs and health output
    fn backend_name(&self) -> &'static str;
}
