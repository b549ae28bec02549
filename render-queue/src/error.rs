use thiserror::Error;

/// Result type for queue store operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Infrastructure errors raised by a queue store.
///
/// None of these describe the outcome of a job. A job that the worker
/// reported as failed is a normal [`JobRecord`](crate::JobRecord) with
/// status `failed`.
#[derive(Error, Debug, Clone)]
pub enum QueueError {
    /// The store could not be reached (connection refused, dropped, timed out)
    #[error("Queue store unavailable: {0}")]
    Unavailable(String),

    /// The store answered, but the command failed
    #[error("Queue store error: {0}")]
    Backend(String),

    /// Raised by worker-side transitions on an id the store does not hold
    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A stored job exists but cannot be decoded
    #[error("Corrupt job record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },
}

impl QueueError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn corrupt(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Whether the failure is a connectivity problem the caller may retry later
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for QueueError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            Self::Unavailable(err.to_string())
        } else {
            Self::Backend(err.to_string())
        }
    }
}
