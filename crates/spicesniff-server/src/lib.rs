//! HTTP server for SpiceSniff.
//!
//! Every route is a thin adapter over [`spicesniff_sdk::SpiceSniff`]; the
//! live sensor feed is pushed to browsers over a WebSocket at `/ws`.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod telemetry;
pub mod view;
pub mod ws;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::SpiceSniffServer;
