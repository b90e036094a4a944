use tokio::net::TcpListener;

use spicesniff_sdk::SpiceSniff;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;

/// SpiceSniff HTTP server.
pub struct SpiceSniffServer {
    config: ServerConfig,
    sdk: SpiceSniff,
}

impl SpiceSniffServer {
    pub fn new(config: ServerConfig, sdk: SpiceSniff) -> Self {
        Self { config, sdk }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.sdk.clone(), &self.config)
    }

    /// Serve until Ctrl-C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(
            addr = %self.config.bind_addr,
            allow_origin = %self.config.allow_origin,
            "SpiceSniff server listening"
        );
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
