/// Errors from the live feed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelemetryError {
    #[error("deviceId required")]
    MissingDevice,
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
