//! # render-queue: the job queue store contract
//!
//! The render gateway never executes work itself. It writes a job record into
//! a shared store and an independent worker process picks it up from there.
//! This crate owns everything both sides must agree on:
//!
//! - **Job records**: id, lifecycle status, timestamps, result, failure detail, metadata
//! - **Enqueue messages**: handler identifier, queue name, named arguments, timing policy
//! - **Backends**: an in-memory store for tests and local runs, and a Redis store
//!   (feature `redis`) for production
//!
//! ```rust
//! use render_queue::prelude::*;
//! use render_queue::backend::memory::MemoryBackend;
//! use serde_json::json;
//!
//! # async fn run() -> QueueResult<()> {
//! let backend = MemoryBackend::new();
//! let message = JobMessage::new("tasks.job_render", "default", json!({"files": ["a.mp4"]}));
//!
//! let job_id = backend.enqueue(message).await?;
//! let record = backend.fetch(&job_id).await?.expect("just enqueued");
//! assert_eq!(record.status, JobStatus::Queued);
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod codec;
pub mod error;
pub mod types;

pub use backend::QueueBackend;
pub use error::{QueueError, QueueResult};
pub use types::{EnqueuePolicy, JobId, JobMessage, JobRecord, JobStatus};

#[cfg(feature = "memory")]
pub use backend::memory::MemoryBackend;

#[cfg(feature = "redis")]
pub use backend::redis::RedisBackend;

/// Everything a store consumer usually needs
pub mod prelude {
    pub use crate::{
        EnqueuePolicy, JobId, JobMessage, JobRecord, JobStatus, QueueBackend, QueueError,
        QueueResult,
    };

    pub use async_trait::async_trait;
}
