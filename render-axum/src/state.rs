use std::sync::Arc;

use render_core::{GatewaySettings, HealthService, ModePolicy, StatusService, SubmissionService};
use render_queue::QueueBackend;

/// Shared, immutable request state. The only thing behind it with a
/// lifetime of its own is the store backend.
#[derive(Clone)]
pub struct RenderState {
    pub submission: Arc<SubmissionService>,
    pub status: Arc<StatusService>,
    pub health: Arc<HealthService>,
    pub modes: Arc<ModePolicy>,
}

impl RenderState {
    pub fn new(backend: Arc<dyn QueueBackend>, settings: &GatewaySettings) -> Self {
        Self {
            submission: Arc::new(SubmissionService::new(
                Arc::clone(&backend),
                settings.queue.clone(),
            )),
            status: Arc::new(StatusService::new(Arc::clone(&backend))),
            health: Arc::new(HealthService::new(backend)),
            modes: Arc::new(settings.modes.clone()),
        }
    }
}
