use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use render_core::GatewaySettings;
use render_queue::QueueBackend;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::handlers;
use crate::RenderState;

/// Routes plus request-id and trace layers
pub fn router(state: RenderState) -> Router<()> {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id());

    Router::new()
        .route("/health", get(handlers::health))
        .route("/render", post(handlers::render))
        .route("/jobs/{job_id}", get(handlers::job_status))
        .route("/job/{job_id}", get(handlers::job_status))
        .fallback(handlers::fallback)
        .with_state(state)
        .layer(middleware)
}

#[derive(Clone)]
pub struct RenderApp {
    pub state: RenderState,
    pub router: Router<()>,
}

impl RenderApp {
    pub fn new(state: RenderState) -> Self {
        Self {
            router: router(state.clone()),
            state,
        }
    }

    pub fn from_backend(backend: Arc<dyn QueueBackend>, settings: &GatewaySettings) -> Self {
        Self::new(RenderState::new(backend, settings))
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests
    pub async fn listen<A, F>(self, addr: A, shutdown: F) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "render gateway listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("render gateway stopped accepting requests");
        Ok(())
    }
}
