use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use spicesniff_sdk::SpiceSniff;

use crate::config::ServerConfig;
use crate::{handler, telemetry, ws};

/// Build the axum router with all SpiceSniff endpoints.
pub fn build_router(sdk: SpiceSniff, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(handler::health_handler))
        .route("/status", get(handler::status_handler))
        .route(
            "/api/ingest",
            get(telemetry::ingest_info_handler).post(telemetry::ingest_handler),
        )
        .route("/api/sensor/latest", get(telemetry::latest_handler))
        .route("/api/sensor/history", get(telemetry::history_handler))
        .route("/api/sensor/commit", post(telemetry::commit_handler))
        .route("/sensor", post(handler::submit_handler))
        .route("/batch/:id", get(handler::batch_handler))
        .route("/batches", get(handler::batches_handler))
        .route("/ws", get(ws::websocket_handler))
        .fallback(handler::not_found_handler)
        .layer(cors_layer(&config.allow_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(sdk)
}

fn cors_layer(allow_origin: &str) -> CorsLayer {
    let origin = match allow_origin.trim() {
        "" | "*" => AllowOrigin::any(),
        exact => match HeaderValue::from_str(exact) {
            Ok(value) => AllowOrigin::exact(value),
            Err(e) => {
                warn!(origin = exact, error = %e, "invalid CORS origin; allowing any");
                AllowOrigin::any()
            }
        },
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
}
