//! JSON shapes returned to dashboard clients.

use serde::Serialize;
use serde_json::Value;

use spicesniff_sdk::{BatchRecord, CommitReceipt, FetchedBatch, SubmitReceipt};

/// Public view of an anchored batch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchView {
    pub batch_id: String,
    pub spice_name: String,
    pub cid: String,
    /// RFC 3339 confirmation time.
    pub timestamp: String,
    pub tx_hash: Option<String>,
    pub block_number: Option<u64>,
}

impl From<&BatchRecord> for BatchView {
    fn from(record: &BatchRecord) -> Self {
        Self {
            batch_id: record.batch_id.to_string(),
            spice_name: record.spice_kind.clone(),
            cid: record.content_id.to_string(),
            timestamp: record.anchored_at.to_rfc3339(),
            tx_hash: record.transaction_ref.clone(),
            block_number: record.block_ref,
        }
    }
}

/// A batch hydrated with its stored document under `data`.
#[derive(Debug, Serialize)]
pub struct HydratedBatchView {
    #[serde(flatten)]
    pub batch: BatchView,
    pub data: Value,
}

impl From<FetchedBatch> for HydratedBatchView {
    fn from(fetched: FetchedBatch) -> Self {
        Self {
            batch: BatchView::from(&fetched.record),
            data: fetched.document,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitView {
    pub status: &'static str,
    pub cid: String,
    pub tx_hash: String,
    pub block_number: u64,
}

impl From<SubmitReceipt> for SubmitView {
    fn from(receipt: SubmitReceipt) -> Self {
        Self {
            status: "success",
            cid: receipt.content_id.into(),
            tx_hash: receipt.transaction_ref,
            block_number: receipt.block_ref,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommitView {
    #[serde(flatten)]
    pub submit: SubmitView,
    pub purity: Option<f64>,
    pub grade: Option<String>,
}

impl From<CommitReceipt> for CommitView {
    fn from(receipt: CommitReceipt) -> Self {
        Self {
            submit: receipt.submit.into(),
            purity: receipt.purity,
            grade: receipt.grade,
        }
    }
}
