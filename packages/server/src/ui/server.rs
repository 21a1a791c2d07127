//! Server execution logic.

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, task::JoinHandle, time::MissedTickBehavior};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{infrastructure::dto::websocket::ServerMessage, usecase::ExpireIdleSessionsUseCase};

use super::{
    handler::{get_stats, health_check, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

/// Longest interval between two idle-session sweeps
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(30);
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// Signaling broker server
///
/// # Example
///
/// ```ignore
/// let server = Server::new(state).with_static_dir("public".into());
/// server.run("127.0.0.1".to_string(), 3000).await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    /// Set when idle sessions should expire
    idle_expiry: Option<Arc<ExpireIdleSessionsUseCase>>,
    static_dir: Option<PathBuf>,
}

impl Server {
    /// Create a new Server instance
    pub fn new(state: AppState) -> Self {
        Self {
            state: Arc::new(state),
            idle_expiry: None,
            static_dir: None,
        }
    }

    /// Serve files from `dir` for every path not handled by the broker
    pub fn with_static_dir(mut self, dir: PathBuf) -> Self {
        self.static_dir = Some(dir);
        self
    }

    /// Periodically close sessions nobody joined
    pub fn with_idle_expiry(mut self, usecase: Arc<ExpireIdleSessionsUseCase>) -> Self {
        self.idle_expiry = Some(usecase);
        self
    }

    /// Build the router
    ///
    /// - `GET /ws`: WebSocket signaling endpoint
    /// - `GET /api/health`: liveness probe
    /// - `GET /api/stats`: aggregate counters
    pub fn router(&self) -> Router {
        let mut app = Router::new()
            .route("/ws", get(websocket_handler))
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_stats))
            .with_state(self.state.clone());

        if let Some(dir) = &self.static_dir {
            app = app.fallback_service(ServeDir::new(dir));
        }

        app.layer(TraceLayer::new_for_http())
    }

    /// Run the server on an already bound listener until a shutdown signal arrives
    pub async fn serve(self, listener: TcpListener) -> std::io::Result<()> {
        let app = self.router();
        let sweeper = self.spawn_idle_sweeper();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        if let Some(sweeper) = sweeper {
            sweeper.abort();
        }
        Ok(())
    }

    /// Run the signaling broker
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 3000)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let bind_addr = format!("{}:{}", host, port);
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("PeerSend broker listening on {}", listener.local_addr()?);
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        if let Some(dir) = &self.static_dir {
            tracing::info!("Serving static files from {}", dir.display());
        }
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener).await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }

    fn spawn_idle_sweeper(&self) -> Option<JoinHandle<()>> {
        let usecase = self.idle_expiry.clone()?;
        let period = usecase
            .ttl()
            .min(MAX_SWEEP_INTERVAL)
            .max(MIN_SWEEP_INTERVAL);
        tracing::info!(
            "Idle sessions expire after {}s (checked every {}s)",
            usecase.ttl().as_secs(),
            period.as_secs()
        );

        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                for session in usecase.execute().await {
                    let message = ServerMessage::SessionExpired {
                        code: session.code.to_string(),
                    };
                    let json = match message.to_json() {
                        Ok(json) => json,
                        Err(e) => {
                            tracing::error!("Failed to serialize session-expired: {}", e);
                            continue;
                        }
                    };
                    if let Err(e) = usecase.notify_sender(&session, &json).await {
                        tracing::debug!("Failed to notify expiry of session {}: {}", session.code, e);
                    }
                }
            }
        }))
    }
}
