//! Connection handlers for the Huddle server.
//!
//! This module wires the hub, the fan-out and the HTTP/WebSocket endpoints
//! together and runs each connection's event loop.

use crate::config::Config;
use crate::metrics::{self, ConnectionMetricsGuard};
use anyhow::{Context, Result};
use axum::{
    extract::{ws::WebSocketUpgrade, ConnectInfo, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use huddle_core::{Fanout, Hub, HubHandle, Registry, RegistryStats, Scheduler, SessionRouter};
use huddle_transport::{Connection, WebSocketConnection};
use serde::Serialize;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Shared server state.
pub struct AppState {
    /// Handle to the hub task.
    pub hub: HubHandle,
    /// Room-scoped delivery to connected sessions.
    pub fanout: Arc<Fanout>,
    /// Server configuration.
    pub config: Config,
}

impl AppState {
    /// Build the registry, router and scheduler and spawn the hub task.
    #[must_use]
    pub fn start(config: Config) -> (Arc<Self>, JoinHandle<()>) {
        let fanout = Arc::new(Fanout::new());
        let registry = Registry::with_config(config.registry_config());
        let router = SessionRouter::new(registry, Arc::clone(&fanout));
        let scheduler = Scheduler::new(config.refresh_interval());
        let (hub, task) = Hub::spawn(router, scheduler);

        let state = Arc::new(Self {
            hub,
            fanout,
            config,
        });
        (state, task)
    }
}

/// Build the HTTP router.
pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(&state.config.transport.websocket_path, get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Run the HTTP/WebSocket server until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the server fails to start.
pub async fn run_server(config: Config) -> Result<()> {
    if config.metrics.enabled {
        if let Err(e) = metrics::start_metrics_server(config.metrics.port) {
            error!("Failed to start metrics server: {}", e);
        }
    }

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    serve(listener, config, shutdown_signal()).await
}

/// Serve on an already bound listener until `shutdown` resolves, then stop
/// the hub.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve<F>(listener: TcpListener, config: Config, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (state, hub_task) = AppState::start(config);
    let addr = listener.local_addr()?;

    info!("Huddle server listening on {}", addr);
    info!(
        "WebSocket endpoint: ws://{}{}",
        addr, state.config.transport.websocket_path
    );

    let app = app(Arc::clone(&state));
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;

    if state.hub.shutdown().is_ok() {
        hub_task.await.context("Hub task failed")?;
    }
    info!("Huddle server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

/// Body of a healthy `/health` response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(flatten)]
    stats: RegistryStats,
    sessions: usize,
}

impl HealthResponse {
    fn new(stats: RegistryStats, sessions: usize) -> Self {
        Self {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            stats,
            sessions,
        }
    }
}

/// Health check handler.
async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.hub.stats().await {
        Ok(stats) => {
            let body = HealthResponse::new(stats, state.fanout.session_count());
            (StatusCode::OK, axum::Json(body)).into_response()
        }
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            axum::Json(serde_json::json!({
                "status": "unavailable",
                "error": e.to_string(),
            })),
        )
            .into_response(),
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let max_message_size = state.config.limits.max_message_size;
    ws.max_message_size(max_message_size)
        .on_upgrade(move |socket| {
            let conn = WebSocketConnection::new(socket, max_message_size).with_remote_addr(addr);
            handle_connection(conn, state)
        })
}

/// Run a connection until it closes.
///
/// Inbound events are queued to the hub; room updates from the fan-out are
/// written back. On exit the session leaves the fan-out and the hub is told
/// it disconnected.
pub async fn handle_connection<C: Connection>(mut conn: C, state: Arc<AppState>) {
    let _metrics_guard = ConnectionMetricsGuard::new();
    let session_id = conn.id().clone();

    let (outbound_tx, mut outbound) = mpsc::unbounded_channel();
    state.fanout.attach(session_id.clone(), outbound_tx);

    debug!(
        session = %session_id,
        remote = ?conn.remote_addr(),
        "Client connected"
    );

    loop {
        tokio::select! {
            Some(envelope) = outbound.recv() => {
                if let Err(e) = conn.send(&envelope).await {
                    warn!(session = %session_id, error = %e, "Failed to deliver room state");
                    metrics::record_error("send");
                    break;
                }
                metrics::record_message(envelope.data.len(), "outbound");
            }

            inbound = conn.recv() => match inbound {
                Ok(Some(envelope)) => {
                    debug!(session = %session_id, event = %envelope.event, "Event received");
                    metrics::record_event(&envelope.event);
                    metrics::record_message(envelope.data.len(), "inbound");

                    if state.hub.event(&session_id, envelope.event, envelope.data).is_err() {
                        error!(session = %session_id, "Hub is closed");
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) if !e.is_fatal() => {
                    warn!(session = %session_id, error = %e, "Dropped undecodable message");
                    metrics::record_error("protocol");
                }
                Err(e) => {
                    warn!(session = %session_id, error = %e, "Connection error");
                    metrics::record_error("transport");
                    break;
                }
            }
        }
    }

    state.fanout.detach(&session_id);
    if state.hub.disconnect(&session_id).is_err() {
        debug!(session = %session_id, "Hub already closed");
    }
    let _ = conn.close().await;

    debug!(session = %session_id, "Client disconnected");
}
