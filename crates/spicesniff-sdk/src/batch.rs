use serde::{Deserialize, Serialize};
use serde_json::Value;

use spicesniff_types::{AnchorReceipt, BatchRecord, ContentId};

/// Outcome of a successful store-then-anchor write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub content_id: ContentId,
    pub transaction_ref: String,
    pub block_ref: u64,
}

impl SubmitReceipt {
    pub fn new(content_id: ContentId, receipt: AnchorReceipt) -> Self {
        Self {
            content_id,
            transaction_ref: receipt.transaction_ref,
            block_ref: receipt.block_ref,
        }
    }
}

/// An anchored record hydrated with its document body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchedBatch {
    pub record: BatchRecord,
    pub document: Value,
}

/// Reachability of the external collaborators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub store: bool,
    pub ledger: bool,
}

impl ServiceStatus {
    pub fn is_healthy(&self) -> bool {
        self.store && self.ledger
    }
}
