use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use spicesniff_types::{AnchorReceipt, BatchId, BatchRecord, ContentId};

use crate::config::{LedgerConfig, ListingMode};
use crate::error::{LedgerError, LedgerResult, RegistryError};
use crate::traits::{Registry, RegistryEntry};

/// Ledger client: anchoring, point resolution, and event-log reconciliation
/// on top of any [`Registry`] backend.
#[derive(Clone)]
pub struct Ledger {
    registry: Arc<dyn Registry>,
    config: LedgerConfig,
}

impl Ledger {
    pub fn new(registry: Arc<dyn Registry>, config: LedgerConfig) -> Self {
        Self { registry, config }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Record `(batch_id, spice_kind, content_id)` on-chain and wait for
    /// confirmation. Failures are surfaced as-is; nothing is retried.
    pub async fn anchor(
        &self,
        batch_id: &BatchId,
        spice_kind: &str,
        content_id: &ContentId,
    ) -> LedgerResult<AnchorReceipt> {
        let entry = RegistryEntry {
            batch_id: batch_id.clone(),
            spice_kind: spice_kind.to_string(),
            content_id: content_id.clone(),
        };

        match self.registry.submit(&entry).await {
            Ok(receipt) => {
                info!(
                    batch_id = %batch_id,
                    cid = %content_id,
                    tx = %receipt.transaction_ref,
                    block = receipt.block_ref,
                    "batch anchored"
                );
                Ok(receipt)
            }
            Err(RegistryError::ConfirmationTimeout {
                transaction_ref,
                waited_ms,
            }) => {
                warn!(batch_id = %batch_id, tx = %transaction_ref, waited_ms, "anchor confirmation timed out");
                Err(LedgerError::ConfirmationTimeout {
                    batch_id: batch_id.to_string(),
                    transaction_ref,
                    waited_ms,
                })
            }
            Err(e) => {
                warn!(batch_id = %batch_id, error = %e, "anchor failed");
                Err(LedgerError::Anchor {
                    batch_id: batch_id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Current on-chain state for `batch_id`.
    ///
    /// Returns `Ok(None)` when the registry holds its default (empty) record.
    /// Errors only on transport failure.
    pub async fn resolve(&self, batch_id: &BatchId) -> LedgerResult<Option<BatchRecord>> {
        let stored = self
            .registry
            .read(batch_id)
            .await
            .map_err(|e| LedgerError::ResolveTransport {
                batch_id: batch_id.to_string(),
                reason: e.to_string(),
            })?;

        if stored.is_empty() {
            debug!(batch_id = %batch_id, "no record on-chain");
            return Ok(None);
        }

        let content_id = ContentId::new(stored.content_id).map_err(|e| LedgerError::ResolveTransport {
            batch_id: batch_id.to_string(),
            reason: e.to_string(),
        })?;
        let anchored_at = i64::try_from(stored.timestamp)
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .unwrap_or_default();

        Ok(Some(BatchRecord {
            batch_id: batch_id.clone(),
            spice_kind: stored.spice_kind,
            content_id,
            anchored_at,
            transaction_ref: None,
            block_ref: None,
        }))
    }

    /// Reconstruct every anchored batch from the registry's event log.
    ///
    /// Ids are compared byte-exact and deduplicated with first-seen order kept; each is then
    /// re-resolved so the latest on-chain state wins. Ids whose resolve
    /// fails are omitted. An event-query failure yields an empty list in
    /// lenient mode and [`LedgerError::Listing`] in strict mode.
    pub async fn list_all(&self) -> LedgerResult<Vec<BatchRecord>> {
        let events = match self.registry.events().await {
            Ok(events) => events,
            Err(e) => {
                return match self.config.listing_mode {
                    ListingMode::Lenient => {
                        warn!(error = %e, "event query failed; reporting no batches");
                        Ok(Vec::new())
                    }
                    ListingMode::Strict => Err(LedgerError::Listing(e.to_string())),
                };
            }
        };

        let mut order: Vec<BatchId> = Vec::new();
        let mut latest: HashMap<BatchId, AnchorReceipt> = HashMap::new();
        for event in events {
            let batch_id = match BatchId::new(event.batch_id.as_str()) {
                Ok(id) => id,
                Err(e) => {
                    debug!(raw = %event.batch_id, error = %e, "skipping event with invalid batch id");
                    continue;
                }
            };
            if latest.insert(batch_id.clone(), event.receipt).is_none() {
                order.push(batch_id);
            }
        }

        let mut records = Vec::with_capacity(order.len());
        for batch_id in order {
            match self.resolve(&batch_id).await {
                Ok(Some(record)) => match latest.get(&batch_id) {
                    Some(receipt) => records.push(record.with_provenance(receipt)),
                    None => records.push(record),
                },
                Ok(None) => debug!(batch_id = %batch_id, "event without current state; omitting"),
                Err(e) => warn!(batch_id = %batch_id, error = %e, "resolve failed; omitting from listing"),
            }
        }

        info!(count = records.len(), "listed batches");
        Ok(records)
    }

    /// Whether the registry backend answers at all.
    pub async fn is_reachable(&self) -> bool {
        match self.registry.head_block().await {
            Ok(block) => {
                debug!(block, "registry reachable");
                true
            }
            Err(e) => {
                debug!(error = %e, "registry unreachable");
                false
            }
        }
    }
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("listing_mode", &self.config.listing_mode)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use crate::memory::InMemoryRegistry;

    fn setup(mode: ListingMode) -> (Arc<InMemoryRegistry>, Ledger) {
        let registry = Arc::new(InMemoryRegistry::new());
        let ledger = Ledger::new(registry.clone(), LedgerConfig { listing_mode: mode });
        (registry, ledger)
    }

    fn id(raw: &str) -> BatchId {
        BatchId::new(raw).unwrap()
    }

    fn cid(raw: &str) -> ContentId {
        ContentId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn anchor_then_resolve() {
        let (_, ledger) = setup(ListingMode::Lenient);
        let receipt = ledger.anchor(&id("TURM2025-01"), "Turmeric", &cid("C1")).await.unwrap();
        assert_eq!(receipt.block_ref, 1);

        let record = ledger.resolve(&id("TURM2025-01")).await.unwrap().unwrap();
        assert_eq!(record.spice_kind, "Turmeric");
        assert_eq!(record.content_id, cid("C1"));
        assert!(record.anchored_at.timestamp() > 0);
        assert!(record.transaction_ref.is_none());
    }

    #[tokio::test]
    async fn resolve_never_anchored_is_none() {
        let (_, ledger) = setup(ListingMode::Lenient);
        assert_eq!(ledger.resolve(&id("GHOST-1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn resolve_transport_failure_surfaces() {
        let (registry, ledger) = setup(ListingMode::Lenient);
        registry.fail_read_for("B1");
        let err = ledger.resolve(&id("B1")).await.unwrap_err();
        assert!(matches!(err, LedgerError::ResolveTransport { ref batch_id, .. } if batch_id == "B1"));
    }

    #[tokio::test]
    async fn unconfirmed_anchor_keeps_transaction_ref() {
        let (registry, ledger) = setup(ListingMode::Lenient);
        registry.stall_confirmations(Some(120_000));
        let err = ledger.anchor(&id("B1"), "Cumin", &cid("C1")).await.unwrap_err();
        match err {
            LedgerError::ConfirmationTimeout {
                batch_id,
                transaction_ref,
                waited_ms,
            } => {
                assert_eq!(batch_id, "B1");
                assert!(transaction_ref.starts_with("0x"));
                assert_eq!(waited_ms, 120_000);
            }
            other => panic!("expected confirmation timeout, got {other:?}"),
        }
        assert_eq!(ledger.resolve(&id("B1")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn anchor_failure_is_anchor_error() {
        let (registry, ledger) = setup(ListingMode::Lenient);
        registry.set_fail_submit(true);
        let err = ledger.anchor(&id("B1"), "Cumin", &cid("C1")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Anchor { .. }));
        assert_eq!(registry.submit_count(), 1);
    }

    #[tokio::test]
    async fn list_all_deduplicates_and_keeps_first_seen_order() {
        let (_, ledger) = setup(ListingMode::Lenient);
        ledger.anchor(&id("B1"), "Turmeric", &cid("C1")).await.unwrap();
        ledger.anchor(&id("B2"), "Cumin", &cid("C2")).await.unwrap();
        ledger.anchor(&id("B1"), "Turmeric", &cid("C1b")).await.unwrap();
        ledger.anchor(&id("B3"), "Saffron", &cid("C3")).await.unwrap();

        let records = ledger.list_all().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["B1", "B2", "B3"]);

        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), records.len());
    }

    #[tokio::test]
    async fn list_all_uses_latest_state_and_provenance() {
        let (_, ledger) = setup(ListingMode::Lenient);
        ledger.anchor(&id("B1"), "Turmeric", &cid("C1")).await.unwrap();
        let second = ledger.anchor(&id("B1"), "Turmeric", &cid("C1b")).await.unwrap();

        let records = ledger.list_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].content_id, cid("C1b"));
        assert_eq!(records[0].transaction_ref.as_deref(), Some(second.transaction_ref.as_str()));
        assert_eq!(records[0].block_ref, Some(2));
    }

    #[tokio::test]
    async fn list_all_omits_failed_and_stateless_ids() {
        let (registry, ledger) = setup(ListingMode::Lenient);
        ledger.anchor(&id("B1"), "Turmeric", &cid("C1")).await.unwrap();
        ledger.anchor(&id("B2"), "Cumin", &cid("C2")).await.unwrap();
        registry.inject_event("ORPHAN", "Pepper", "C9");
        registry.inject_event("   ", "Pepper", "C10");
        registry.fail_read_for("B2");

        let records = ledger.list_all().await.unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["B1"]);
    }

    #[tokio::test]
    async fn list_all_keeps_ids_byte_exact() {
        let (_, ledger) = setup(ListingMode::Lenient);
        let long = "L".repeat(200);
        ledger.anchor(&id(" LOT-7"), "Cumin", &cid("QmPadded")).await.unwrap();
        ledger.anchor(&id("LOT-7"), "Cumin", &cid("QmPlain")).await.unwrap();
        ledger.anchor(&id(&long), "Cumin", &cid("QmLong")).await.unwrap();

        let records = ledger.list_all().await.unwrap();
        let listed: Vec<(&str, &str)> = records
            .iter()
            .map(|r| (r.batch_id.as_str(), r.content_id.as_str()))
            .collect();
        assert_eq!(
            listed,
            vec![(" LOT-7", "QmPadded"), ("LOT-7", "QmPlain"), (long.as_str(), "QmLong")]
        );
        assert_eq!(records[0].block_ref, Some(1));
    }

    #[tokio::test]
    async fn lenient_listing_hides_event_failure() {
        let (registry, ledger) = setup(ListingMode::Lenient);
        ledger.anchor(&id("B1"), "Turmeric", &cid("C1")).await.unwrap();
        registry.set_fail_events(true);
        assert!(ledger.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn strict_listing_surfaces_event_failure() {
        let (registry, ledger) = setup(ListingMode::Strict);
        registry.set_fail_events(true);
        assert!(matches!(ledger.list_all().await, Err(LedgerError::Listing(_))));
    }

    #[tokio::test]
    async fn empty_log_lists_nothing() {
        let (_, ledger) = setup(ListingMode::Strict);
        assert!(ledger.list_all().await.unwrap().is_empty());
        assert!(ledger.is_reachable().await);
    }
}
