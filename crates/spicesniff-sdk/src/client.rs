use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use spicesniff_ledger::{InMemoryRegistry, Ledger, LedgerConfig};
use spicesniff_store::{ContentStore, InMemoryContentStore};
use spicesniff_telemetry::{FeedConfig, LiveFeed, Subscription};
use spicesniff_types::{BatchId, BatchRecord, TelemetrySample};

use crate::batch::{FetchedBatch, ServiceStatus, SubmitReceipt};
use crate::commit::{promotion_document, CommitReceipt};
use crate::error::{SdkError, SdkResult};

/// High-level SpiceSniff API.
///
/// Cheap to clone; all clones share the same backends and live feed.
#[derive(Clone)]
pub struct SpiceSniff {
    store: Arc<dyn ContentStore>,
    ledger: Ledger,
    feed: Arc<LiveFeed>,
}

impl SpiceSniff {
    pub fn new(store: Arc<dyn ContentStore>, ledger: Ledger, feed: FeedConfig) -> Self {
        Self {
            store,
            ledger,
            feed: Arc::new(LiveFeed::new(feed)),
        }
    }

    /// Fully in-memory instance for local demos.
    pub fn in_memory() -> Self {
        let ledger = Ledger::new(Arc::new(InMemoryRegistry::new()), LedgerConfig::default());
        Self::new(Arc::new(InMemoryContentStore::new()), ledger, FeedConfig::default())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn feed(&self) -> &Arc<LiveFeed> {
        &self.feed
    }

    // ---- Batch operations ----

    /// Store the document, then anchor its content id.
    ///
    /// A store failure aborts before any ledger write. An anchor failure
    /// leaves the document in the store unanchored; it is logged and never
    /// cleaned up.
    pub async fn submit_batch(
        &self,
        batch_id: &BatchId,
        spice_kind: &str,
        document: &Value,
    ) -> SdkResult<SubmitReceipt> {
        info!(batch_id = %batch_id, spice = spice_kind, "submitting batch");
        let content_id = self.store.store(document).await?;

        match self.ledger.anchor(batch_id, spice_kind, &content_id).await {
            Ok(receipt) => Ok(SubmitReceipt::new(content_id, receipt)),
            Err(e) => {
                warn!(
                    batch_id = %batch_id,
                    cid = %content_id,
                    error = %e,
                    "document stored but not anchored; content id is dangling"
                );
                Err(e.into())
            }
        }
    }

    /// Resolve the batch on-chain, then hydrate its document from the store.
    pub async fn fetch_batch(&self, batch_id: &BatchId) -> SdkResult<FetchedBatch> {
        let record = self
            .ledger
            .resolve(batch_id)
            .await?
            .ok_or_else(|| SdkError::BatchNotFound(batch_id.to_string()))?;
        let document = self.store.retrieve(&record.content_id).await?;
        Ok(FetchedBatch { record, document })
    }

    pub async fn list_batches(&self) -> SdkResult<Vec<BatchRecord>> {
        Ok(self.ledger.list_all().await?)
    }

    // ---- Telemetry operations ----

    /// Accept a live sample, stamped with the current wall clock.
    pub fn ingest(&self, sample: TelemetrySample) -> SdkResult<TelemetrySample> {
        let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();
        Ok(self.feed.accept(sample, now_ms)?)
    }

    pub fn latest(&self) -> Option<TelemetrySample> {
        self.feed.latest()
    }

    pub fn history(&self) -> Vec<TelemetrySample> {
        self.feed.history()
    }

    pub fn subscribe(&self) -> Subscription {
        self.feed.subscribe()
    }

    /// Promote the latest live sample into an anchored batch.
    pub async fn commit_latest(&self, batch_id: &BatchId, spice_kind: &str) -> SdkResult<CommitReceipt> {
        let sample = self.feed.latest().ok_or(SdkError::NoTelemetry)?;
        if !sample.is_ready() {
            return Err(SdkError::TelemetryNotReady);
        }

        let document = promotion_document(batch_id, spice_kind, &sample);
        let submit = self.submit_batch(batch_id, spice_kind, &document).await?;
        info!(
            batch_id = %batch_id,
            device = %sample.device_id,
            tx = %submit.transaction_ref,
            "committed sensor reading"
        );
        Ok(CommitReceipt {
            submit,
            purity: sample.purity,
            grade: sample.grade,
        })
    }

    // ---- Status ----

    pub async fn store_available(&self) -> bool {
        self.store.is_available().await
    }

    pub async fn status(&self) -> ServiceStatus {
        let (store, ledger) = tokio::join!(self.store.is_available(), self.ledger.is_reachable());
        ServiceStatus { store, ledger }
    }
}

impl std::fmt::Debug for SpiceSniff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpiceSniff")
            .field("ledger", &self.ledger)
            .field("feed", &self.feed)
            .finish()
    }
}
