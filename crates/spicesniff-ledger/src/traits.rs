use async_trait::async_trait;
use spicesniff_types::{AnchorReceipt, BatchId, ContentId};

use crate::error::RegistryResult;

/// One anchoring write: the triple recorded on-chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub batch_id: BatchId,
    pub spice_kind: String,
    pub content_id: ContentId,
}

/// Raw current-state record as returned by the registry's read accessor.
///
/// A missing batch comes back as the default record (empty strings, zero
/// timestamp); interpreting that is up to the caller.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoredBatch {
    pub spice_kind: String,
    pub content_id: String,
    /// Block timestamp of the confirming write, in seconds.
    pub timestamp: u64,
}

impl StoredBatch {
    /// True when the registry returned its default value for the key.
    pub fn is_empty(&self) -> bool {
        self.content_id.trim().is_empty()
    }
}

/// One decoded anchoring event from the registry's log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchEvent {
    /// Raw batch id as emitted; not yet validated.
    pub batch_id: String,
    pub spice_kind: String,
    pub content_id: String,
    pub receipt: AnchorReceipt,
    pub log_index: u64,
}

/// Boundary between ledger logic and a concrete chain backend.
///
/// Implementations perform exactly one logical remote operation per call and
/// never retry; retry policy belongs to callers.
#[async_trait]
pub trait Registry: Send + Sync {
    /// Submit the write and suspend until it is confirmed.
    async fn submit(&self, entry: &RegistryEntry) -> RegistryResult<AnchorReceipt>;

    /// Read current state for a batch id.
    async fn read(&self, batch_id: &BatchId) -> RegistryResult<StoredBatch>;

    /// All anchoring events, in chronological (block, log index) order.
    async fn events(&self) -> RegistryResult<Vec<BatchEvent>>;

    /// Current head block number.
    async fn head_block(&self) -> RegistryResult<u64>;
}
