pub mod telemetry;

use std::sync::Arc;

use anyhow::{Context, Result};
use render_axum::RenderApp;
use render_core::{GatewaySettings, StoreKind};
use render_queue::{MemoryBackend, QueueBackend, RedisBackend};
use tracing::{info, warn};

/// Pick the store named by the settings. Redis is only validated here; the
/// first connection happens on the first request.
pub fn open_backend(settings: &GatewaySettings) -> Result<Arc<dyn QueueBackend>> {
    match settings.store {
        StoreKind::Redis => {
            let backend = RedisBackend::open(&settings.queue.url)
                .with_context(|| format!("invalid REDIS_URL {:?}", settings.queue.url))?
                .with_key_prefix(settings.queue.key_prefix.clone());
            Ok(Arc::new(backend))
        }
        StoreKind::Memory => {
            let backend = MemoryBackend::new();
            warn!(
                capacity = backend.capacity(),
                "using the in-memory store: jobs are not visible to workers, are lost on restart, and enqueue fails once capacity is reached"
            );
            Ok(Arc::new(backend))
        }
    }
}

pub fn build(settings: &GatewaySettings) -> Result<RenderApp> {
    let backend = open_backend(settings)?;
    info!(
        backend = backend.backend_name(),
        queue = %settings.queue.name,
        modes = ?settings.modes.allowed(),
        default_mode = settings.modes.default_mode(),
        "render gateway configured"
    );
    Ok(RenderApp::from_backend(backend, settings))
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
