use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Version of the registry contract's ABI shape.
///
/// The registry contract has drifted before. Rather than probing alternate
/// function and event names at runtime, deployments name the shape they
/// target and the ledger client binds exactly that one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// `getBatch(string)` returns `(batchId, spice, cid, timestamp)`.
    #[default]
    V1,
    /// `batches(string)` returns `(spice, cid, timestamp)`.
    V2,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V1 => write!(f, "v1"),
            Self::V2 => write!(f, "v2"),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "v1" | "1" => Ok(Self::V1),
            "v2" | "2" => Ok(Self::V2),
            other => Err(TypeError::UnknownSchema(other.to_string())),
        }
    }
}
