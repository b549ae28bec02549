//! render-core: the job submission and lifecycle-tracking protocol.
//!
//! Transport-agnostic. An HTTP adapter (render-axum) or any other front end
//! drives three pieces:
//! - [`payload::normalize`] turns an untrusted [`JobRequest`] into a canonical [`JobPayload`]
//! - [`SubmissionService`] validates and enqueues it under the fixed handler identifier
//! - [`StatusService`] maps the store's job record onto a caller-facing [`StatusView`]

pub mod config;
pub mod contract;
pub mod errors;
pub mod payload;
pub mod status;
pub mod submission;

pub use config::{GatewaySettings, LogFormat, QueueSettings, RenderConfig, RenderConfigSnapshot, StoreKind};
pub use contract::{PAYLOAD_SCHEMA_VERSION, RENDER_HANDLER};
pub use errors::{ErrorKind, RenderError, RenderResult};
pub use payload::{normalize, JobPayload, JobRequest, ModePolicy};
pub use status::{HealthService, HealthView, StatusService, StatusView};
pub use submission::{SubmissionResult, SubmissionService};
