use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

use spicesniff_sdk::SdkError;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadInput(String),

    #[error("No sensor data available")]
    NoSensorData,

    #[error(transparent)]
    Sdk(#[from] SdkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        use spicesniff_sdk::{LedgerError as L, SdkError as S, StoreError as St};

        match self {
            Self::BadInput(_) => (StatusCode::BAD_REQUEST, "BAD_INPUT"),
            Self::NoSensorData => (StatusCode::NOT_FOUND, "NO_SENSOR_DATA"),
            Self::Sdk(err) => match err {
                S::BatchNotFound(_) => (StatusCode::NOT_FOUND, "BATCH_NOT_FOUND"),
                S::NoTelemetry => (StatusCode::BAD_REQUEST, "NO_SENSOR_DATA"),
                S::TelemetryNotReady => (StatusCode::BAD_REQUEST, "SENSOR_NOT_READY"),
                S::Telemetry(_) => (StatusCode::BAD_REQUEST, "BAD_INPUT"),
                S::Store(St::Retrieval { .. }) => (StatusCode::BAD_GATEWAY, "RETRIEVAL_ERROR"),
                S::Store(St::Config(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
                S::Store(_) => (StatusCode::BAD_GATEWAY, "STORE_ERROR"),
                S::Ledger(L::ConfirmationTimeout { .. }) => {
                    (StatusCode::GATEWAY_TIMEOUT, "CONFIRMATION_TIMEOUT")
                }
                S::Ledger(L::Anchor { .. }) => (StatusCode::BAD_GATEWAY, "ANCHOR_ERROR"),
                S::Ledger(L::ResolveTransport { .. }) => (StatusCode::BAD_GATEWAY, "RESOLVE_ERROR"),
                S::Ledger(L::Listing(_)) => (StatusCode::BAD_GATEWAY, "LISTING_ERROR"),
            },
            Self::Io(_) | Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR"),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        } else {
            tracing::debug!(code, error = %self, "request rejected");
        }
        (status, Json(json!({ "error": self.to_string(), "code": code }))).into_response()
    }
}
