use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::ContentId;
use crate::error::TypeError;

/// Upper bound on the length of a newly submitted batch id, in bytes.
pub const MAX_BATCH_ID_LEN: usize = 128;

/// Human-assigned identifier of a spice production lot.
///
/// Batch ids are supplied by operators (e.g. `"TURM2025-01"`) and double as
/// the registry lookup key, so they are kept byte-exact. Ids read back from
/// the chain may have been written by other clients and are not normalized.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BatchId(String);

impl BatchId {
    /// Wrap a batch id exactly as given. Only empty or all-whitespace ids are
    /// rejected.
    pub fn new(raw: impl Into<String>) -> Result<Self, TypeError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TypeError::Empty("batch id"));
        }
        Ok(Self(raw))
    }

    /// Normalize an operator-typed id for a new submission: surrounding
    /// whitespace is trimmed and the length capped at [`MAX_BATCH_ID_LEN`].
    pub fn from_input(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        if trimmed.len() > MAX_BATCH_ID_LEN {
            return Err(TypeError::TooLong {
                field: "batch id",
                max: MAX_BATCH_ID_LEN,
                actual: trimmed.len(),
            });
        }
        Self::new(trimmed)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BatchId({})", self.0)
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for BatchId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for BatchId {
    type Error = TypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BatchId> for String {
    fn from(id: BatchId) -> Self {
        id.0
    }
}

/// Ledger provenance of a confirmed anchoring transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorReceipt {
    /// Transaction hash assigned by the ledger.
    pub transaction_ref: String,
    /// Block number the transaction was included in.
    pub block_ref: u64,
}

impl AnchorReceipt {
    pub fn new(transaction_ref: impl Into<String>, block_ref: u64) -> Self {
        Self {
            transaction_ref: transaction_ref.into(),
            block_ref,
        }
    }
}

/// The canonical unit of provenance: an anchored `(batch id → content id)` pair.
///
/// Once anchored a record is immutable and never deleted. The ledger is the
/// authority for its existence and content id; the content store holds the
/// document body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRecord {
    pub batch_id: BatchId,
    pub spice_kind: String,
    pub content_id: ContentId,
    /// Time of on-chain confirmation as recorded by the registry.
    pub anchored_at: DateTime<Utc>,
    /// Anchoring transaction, when known. Point reads of current state do
    /// not carry it; event-log reconstruction does.
    pub transaction_ref: Option<String>,
    pub block_ref: Option<u64>,
}

impl BatchRecord {
    /// Attach ledger provenance taken from an anchoring event or receipt.
    pub fn with_provenance(mut self, receipt: &AnchorReceipt) -> Self {
        self.transaction_ref = Some(receipt.transaction_ref.clone());
        self.block_ref = Some(receipt.block_ref);
        self
    }
}
