use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::EnqueuePolicy;

/// Job message - immutable enqueue-time data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobMessage {
    /// Worker-side handler identifier
    pub handler: String,

    /// Target queue name
    pub queue: String,

    /// Version of the named-argument schema in `kwargs`
    pub schema_version: u32,

    /// Named arguments passed to the handler (a JSON object)
    pub kwargs: Value,

    /// Timing policy forwarded to the worker runtime
    pub policy: EnqueuePolicy,
}

impl JobMessage {
    pub fn new(handler: impl Into<String>, queue: impl Into<String>, kwargs: Value) -> Self {
        Self {
            handler: handler.into(),
            queue: queue.into(),
            schema_version: 1,
            kwargs,
            policy: EnqueuePolicy::default(),
        }
    }

    pub fn with_schema_version(mut self, version: u32) -> Self {
        self.schema_version = version;
        self
    }

    pub fn with_policy(mut self, policy: EnqueuePolicy) -> Self {
        self.policy = policy;
        self
    }
}
