use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use spicesniff_sdk::{
    ContentStore, FeedConfig, InMemoryContentStore, InMemoryRegistry, IpfsConfig, IpfsContentStore,
    JsonRpcRegistry, Ledger, LedgerConfig, ListingMode, Registry, RpcConfig, SpiceSniff,
};
use spicesniff_server::ServerConfig;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StoreBackend {
    #[default]
    Ipfs,
    Memory,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerBackend {
    #[default]
    JsonRpc,
    Memory,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackend,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSection {
    pub backend: LedgerBackend,
    pub listing_mode: ListingMode,
}

/// Full service configuration, one table per component.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreSection,
    pub ipfs: IpfsConfig,
    pub ledger: LedgerSection,
    pub rpc: RpcConfig,
    pub feed: FeedConfig,
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("reading config file {}", path.display()))?;
                toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `SPICESNIFF_*`, `PORT` and `ALLOW_ORIGIN` overrides.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(bind) = var("SPICESNIFF_BIND") {
            self.server.bind_addr = bind
                .parse::<SocketAddr>()
                .with_context(|| format!("invalid SPICESNIFF_BIND {bind:?}"))?;
        }
        if let Some(port) = var("PORT") {
            let port: u16 = port.parse().with_context(|| format!("invalid PORT {port:?}"))?;
            self.server.bind_addr.set_port(port);
        }
        if let Some(origin) = var("ALLOW_ORIGIN") {
            self.server.allow_origin = origin;
        }
        if let Some(url) = var("SPICESNIFF_RPC_URL") {
            self.rpc.rpc_url = url;
        }
        if let Some(contract) = var("SPICESNIFF_CONTRACT") {
            self.rpc.contract_address = contract;
        }
        if let Some(from) = var("SPICESNIFF_FROM") {
            self.rpc.from_address = from;
        }
        if let Some(api) = var("SPICESNIFF_IPFS_API") {
            self.ipfs.api_url = api;
        }
        Ok(())
    }

    /// Wire the configured backends into a [`SpiceSniff`] instance.
    pub fn build_sdk(&self) -> anyhow::Result<SpiceSniff> {
        let store: Arc<dyn ContentStore> = match self.store.backend {
            StoreBackend::Ipfs => Arc::new(
                IpfsContentStore::new(self.ipfs.clone()).context("configuring IPFS content store")?,
            ),
            StoreBackend::Memory => Arc::new(InMemoryContentStore::new()),
        };
        let registry: Arc<dyn Registry> = match self.ledger.backend {
            LedgerBackend::JsonRpc => Arc::new(
                JsonRpcRegistry::new(self.rpc.clone()).context("configuring JSON-RPC registry")?,
            ),
            LedgerBackend::Memory => Arc::new(InMemoryRegistry::new()),
        };
        let ledger = Ledger::new(
            registry,
            LedgerConfig {
                listing_mode: self.ledger.listing_mode,
            },
        );
        Ok(SpiceSniff::new(store, ledger, self.feed.clone()))
    }
}
