use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("batch not found: {0}")]
    BatchNotFound(String),

    #[error("no sensor data to commit")]
    NoTelemetry,

    #[error("sensor data not ready (warming up or invalid)")]
    TelemetryNotReady,

    #[error("store error: {0}")]
    Store(#[from] spicesniff_store::StoreError),

    #[error("ledger error: {0}")]
    Ledger(#[from] spicesniff_ledger::LedgerError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] spicesniff_telemetry::TelemetryError),
}

pub type SdkResult<T> = Result<T, SdkError>;
