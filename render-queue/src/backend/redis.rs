//! Redis-backed queue store.
//!
//! Layout (default prefix `render`):
//! - `render:job:<id>`       hash with the fields of [`crate::codec::hash`]
//! - `render:queue:<name>`   list of job ids, pushed on the right, popped by workers on the left
//! - `render:queues`         set of known queue keys
//!
//! One [`ConnectionManager`] is opened lazily on first use and cloned into
//! every request; it multiplexes and reconnects on its own.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::{
    backend::QueueBackend,
    codec::{decode_record, encode_record},
    JobId, JobMessage, JobRecord, QueueResult,
};

/// Default key namespace.
///
/// The job hash layout is not Python RQ's, so this must never be `rq`: an RQ
/// worker watching the same Redis would pop these ids and fail to load them.
pub const DEFAULT_KEY_PREFIX: &str = "render";

pub struct RedisBackend {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    key_prefix: String,
}

impl RedisBackend {
    /// Validate the URL and prepare the client. No connection is opened yet.
    pub fn open(redis_url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            connection: OnceCell::new(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
        })
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn job_key(&self, job_id: &JobId) -> String {
        format!("{}:job:{}", self.key_prefix, job_id)
    }

    pub fn queue_key(&self, queue: &str) -> String {
        format!("{}:queue:{}", self.key_prefix, queue)
    }

    pub fn queues_key(&self) -> String {
        format!("{}:queues", self.key_prefix)
    }

    async fn connection(&self) -> QueueResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let manager = self.client.get_connection_manager().await?;
                info!("redis store: connection established");
                Ok::<_, redis::RedisError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }
}

#[async_trait]
impl QueueBackend for RedisBackend {
    async fn enqueue(&self, message: JobMessage) -> QueueResult<JobId> {
        let job_id = JobId::new();
        let record = JobRecord::new(job_id.clone(), message);
        let fields = encode_record(&record)?;

        let job_key = self.job_key(&job_id);
        let queue_key = self.queue_key(&record.message.queue);

        let mut conn = self.connection().await?;
        let (): () = redis::pipe()
            .atomic()
            .hset_multiple(&job_key, &fields[..])
            .ignore()
            .rpush(&queue_key, job_id.as_str())
            .ignore()
            .sadd(self.queues_key(), &queue_key)
            .ignore()
            .query_async(&mut conn)
            .await?;

        debug!(job_id = %job_id, queue = %record.message.queue, "redis store: job enqueued");
        Ok(job_id)
    }

    async fn fetch(&self, job_id: &JobId) -> QueueResult<Option<JobRecord>> {
        let mut conn = self.connection().await?;
        let raw: HashMap<String, String> = conn.hgetall(self.job_key(job_id)).await?;

        if raw.is_empty() {
            return Ok(None);
        }
        decode_record(job_id, &raw).map(Some)
    }

    async fn ping(&self) -> QueueResult<()> {
        let mut conn = self.connection().await?;
        let _pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}
