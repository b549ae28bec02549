//! The gateway <-> worker contract.
//!
//! The worker process looks jobs up by handler identifier and decodes the
//! named arguments according to the schema version. Changing either value is
//! a breaking deployment change that both sides must ship together.

/// Worker-side function that processes render jobs
pub const RENDER_HANDLER: &str = "tasks.job_render";

/// Version of the [`JobPayload`](crate::JobPayload) named-argument schema
pub const PAYLOAD_SCHEMA_VERSION: u32 = 1;
