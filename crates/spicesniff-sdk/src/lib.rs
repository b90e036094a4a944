//! High-level SDK for SpiceSniff provenance.
//!
//! [`SpiceSniff`] is the composition root: it wires a content store, a
//! ledger client, and the live telemetry feed behind one API. Writes go
//! store-then-anchor, reads go anchor-then-hydrate.

pub mod batch;
pub mod client;
pub mod commit;
pub mod error;

pub use batch::{FetchedBatch, ServiceStatus, SubmitReceipt};
pub use client::SpiceSniff;
pub use commit::{promotion_document, CommitReceipt};
pub use error::{SdkError, SdkResult};

// Re-export key types
pub use spicesniff_types::{
    AnchorReceipt, BatchId, BatchRecord, ContentId, SchemaVersion, TelemetrySample,
};
pub use spicesniff_store::{
    ContentStore, InMemoryContentStore, IpfsConfig, IpfsContentStore, StoreError,
};
pub use spicesniff_ledger::{
    InMemoryRegistry, JsonRpcRegistry, Ledger, LedgerConfig, LedgerError, ListingMode, Registry,
    RpcConfig,
};
pub use spicesniff_telemetry::{FeedConfig, LiveFeed, Subscription};
