use thiserror::Error;

/// Errors produced by type construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{field} too long: {actual} bytes (max {max})")]
    TooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("unknown schema version: {0}")]
    UnknownSchema(String),
}
