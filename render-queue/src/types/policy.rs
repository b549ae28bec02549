use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default execution timeout handed to the worker runtime (40 minutes)
pub const DEFAULT_JOB_TIMEOUT: Duration = Duration::from_secs(60 * 40);

/// Default retention of a finished job's result (1 day)
pub const DEFAULT_RESULT_TTL: Duration = Duration::from_secs(60 * 60 * 24);

/// Default retention of a failed job's error detail (7 days)
pub const DEFAULT_FAILURE_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Timing policy attached to every job at enqueue time.
///
/// The store and worker enforce these; the gateway only forwards them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnqueuePolicy {
    /// Maximum execution time before the worker runtime aborts the job
    pub job_timeout: Duration,

    /// How long a finished job stays queryable
    pub result_ttl: Duration,

    /// How long a failed job stays queryable
    pub failure_ttl: Duration,
}

impl Default for EnqueuePolicy {
    fn default() -> Self {
        Self {
            job_timeout: DEFAULT_JOB_TIMEOUT,
            result_ttl: DEFAULT_RESULT_TTL,
            failure_ttl: DEFAULT_FAILURE_TTL,
        }
    }
}

impl EnqueuePolicy {
    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn with_result_ttl(mut self, ttl: Duration) -> Self {
        self.result_ttl = ttl;
        self
    }

    pub fn with_failure_ttl(mut self, ttl: Duration) -> Self {
        self.failure_ttl = ttl;
        self
    }
}
