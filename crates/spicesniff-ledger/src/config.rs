use std::time::Duration;

use serde::{Deserialize, Serialize};
use spicesniff_types::SchemaVersion;

/// How `list_all` treats a failed event-log query.
///
/// Lenient mode cannot tell "no batches exist" apart from "listing failed";
/// strict mode surfaces the failure so callers can.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    /// Event-query failure yields an empty list.
    #[default]
    Lenient,
    /// Event-query failure yields [`LedgerError::Listing`](crate::LedgerError::Listing).
    Strict,
}

/// Policy knobs for [`Ledger`](crate::Ledger).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    pub listing_mode: ListingMode,
}

/// Connection settings for [`JsonRpcRegistry`](crate::JsonRpcRegistry).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// HTTP JSON-RPC endpoint of an Ethereum-compatible node.
    pub rpc_url: String,
    /// Address of the deployed registry contract.
    pub contract_address: String,
    /// Node-managed account that sends anchoring transactions.
    pub from_address: String,
    pub schema_version: SchemaVersion,
    /// First block scanned when reconstructing the batch list.
    pub from_block: u64,
    /// Blocks required on top of (and including) the inclusion block.
    pub confirmations: u64,
    /// Bound on the whole confirmation wait.
    pub confirmation_timeout_ms: u64,
    pub poll_interval_ms: u64,
    /// Bound on each individual RPC request.
    pub request_timeout_ms: u64,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".into(),
            contract_address: String::new(),
            from_address: String::new(),
            schema_version: SchemaVersion::V1,
            from_block: 0,
            confirmations: 1,
            confirmation_timeout_ms: 120_000,
            poll_interval_ms: 2_000,
            request_timeout_ms: 30_000,
        }
    }
}

impl RpcConfig {
    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_millis(self.confirmation_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}
