use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Public gateways tried, in order, when the local daemon cannot serve a read.
pub const DEFAULT_GATEWAYS: &[&str] = &[
    "https://ipfs.io",
    "https://gateway.pinata.cloud",
    "https://cloudflare-ipfs.com",
    "https://dweb.link",
];

/// Configuration for [`IpfsContentStore`](crate::IpfsContentStore).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct IpfsConfig {
    /// Base URL of the daemon's RPC API (without `/api/v0`).
    pub api_url: String,
    /// Fallback gateway base URLs; content is fetched from `<gateway>/ipfs/<cid>`.
    pub gateways: Vec<String>,
    /// Bound on each individual gateway attempt.
    pub gateway_timeout_ms: u64,
    /// Bound on each daemon API request.
    pub api_timeout_ms: u64,
}

impl Default for IpfsConfig {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5001".into(),
            gateways: DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            gateway_timeout_ms: 10_000,
            api_timeout_ms: 30_000,
        }
    }
}

impl IpfsConfig {
    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_millis(self.gateway_timeout_ms)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }
}
