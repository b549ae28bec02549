//! render-axum: HTTP surface for the render gateway.
//!
//! Routes:
//! - `GET  /health`          store liveness
//! - `POST /render`          submit a render request
//! - `GET  /jobs/{job_id}`   poll a job (`/job/{job_id}` is kept as an alias)

pub mod app;
pub mod handlers;
pub mod state;
mod error;

pub use app::{router, RenderApp};
pub use error::RenderAxumError;
pub use state::RenderState;
