use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use ethers::types::H256;
use ethers::utils::keccak256;
use tracing::debug;

use spicesniff_types::{AnchorReceipt, BatchId};

use crate::error::{RegistryError, RegistryResult};
use crate::traits::{BatchEvent, Registry, RegistryEntry, StoredBatch};

/// In-memory registry for tests, local demos, and embedding.
///
/// Behaves like the on-chain contract: every write mines one block, emits
/// one event, and overwrites current state for the batch id. Failure
/// switches and raw event injection let tests reproduce chain histories the
/// service cannot produce itself.
pub struct InMemoryRegistry {
    inner: RwLock<RegistryState>,
    fail_submit: AtomicBool,
    fail_events: AtomicBool,
    submits: AtomicUsize,
}

#[derive(Default)]
struct RegistryState {
    batches: HashMap<String, StoredBatch>,
    events: Vec<BatchEvent>,
    failing_reads: HashSet<String>,
    stalled_ms: Option<u64>,
    block: u64,
}

fn now_secs() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp()).unwrap_or_default()
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryState::default()),
            fail_submit: AtomicBool::new(false),
            fail_events: AtomicBool::new(false),
            submits: AtomicUsize::new(0),
        }
    }

    /// Number of `submit` calls received, failed or not.
    pub fn submit_count(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn event_count(&self) -> usize {
        self.inner.read().expect("registry lock poisoned").events.len()
    }

    pub fn set_fail_submit(&self, fail: bool) {
        self.fail_submit.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_events(&self, fail: bool) {
        self.fail_events.store(fail, Ordering::SeqCst);
    }

    /// Leave every later write pending: `submit` reports a confirmation
    /// timeout of `waited_ms` and nothing is mined. `None` resumes mining.
    pub fn stall_confirmations(&self, waited_ms: Option<u64>) {
        self.inner.write().expect("registry lock poisoned").stalled_ms = waited_ms;
    }

    /// Make point reads for one batch id fail with a transport error.
    pub fn fail_read_for(&self, batch_id: &str) {
        self.inner
            .write()
            .expect("registry lock poisoned")
            .failing_reads
            .insert(batch_id.to_string());
    }

    /// Append a raw event without touching current state.
    pub fn inject_event(&self, batch_id: &str, spice_kind: &str, content_id: &str) {
        let mut state = self.inner.write().expect("registry lock poisoned");
        state.block += 1;
        let receipt = AnchorReceipt::new(format!("0xinjected{}", state.block), state.block);
        state.events.push(BatchEvent {
            batch_id: batch_id.to_string(),
            spice_kind: spice_kind.to_string(),
            content_id: content_id.to_string(),
            receipt,
            log_index: 0,
        });
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Registry for InMemoryRegistry {
    async fn submit(&self, entry: &RegistryEntry) -> RegistryResult<AnchorReceipt> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(RegistryError::Transport("in-memory registry configured to fail".into()));
        }

        let mut state = self.inner.write().expect("registry lock poisoned");
        let block = state.block + 1;
        let mut preimage = block.to_be_bytes().to_vec();
        preimage.extend_from_slice(entry.batch_id.as_str().as_bytes());
        preimage.extend_from_slice(entry.content_id.as_str().as_bytes());
        let transaction_ref = format!("{:?}", H256::from(keccak256(&preimage)));
        if let Some(waited_ms) = state.stalled_ms {
            return Err(RegistryError::ConfirmationTimeout {
                transaction_ref,
                waited_ms,
            });
        }
        state.block = block;
        let receipt = AnchorReceipt::new(transaction_ref, block);

        state.batches.insert(
            entry.batch_id.to_string(),
            StoredBatch {
                spice_kind: entry.spice_kind.clone(),
                content_id: entry.content_id.to_string(),
                timestamp: now_secs(),
            },
        );
        state.events.push(BatchEvent {
            batch_id: entry.batch_id.to_string(),
            spice_kind: entry.spice_kind.clone(),
            content_id: entry.content_id.to_string(),
            receipt: receipt.clone(),
            log_index: 0,
        });

        debug!(batch_id = %entry.batch_id, block, "anchored in memory");
        Ok(receipt)
    }

    async fn read(&self, batch_id: &BatchId) -> RegistryResult<StoredBatch> {
        let state = self.inner.read().expect("registry lock poisoned");
        if state.failing_reads.contains(batch_id.as_str()) {
            return Err(RegistryError::Transport(format!("read of {batch_id} configured to fail")));
        }
        Ok(state.batches.get(batch_id.as_str()).cloned().unwrap_or_default())
    }

    async fn events(&self) -> RegistryResult<Vec<BatchEvent>> {
        if self.fail_events.load(Ordering::SeqCst) {
            return Err(RegistryError::Transport("event query configured to fail".into()));
        }
        Ok(self.inner.read().expect("registry lock poisoned").events.clone())
    }

    async fn head_block(&self) -> RegistryResult<u64> {
        Ok(self.inner.read().expect("registry lock poisoned").block)
    }
}

impl std::fmt::Debug for InMemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRegistry")
            .field("event_count", &self.event_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spicesniff_types::ContentId;

    fn entry(batch: &str, cid: &str) -> RegistryEntry {
        RegistryEntry {
            batch_id: BatchId::new(batch).unwrap(),
            spice_kind: "Turmeric".into(),
            content_id: ContentId::new(cid).unwrap(),
        }
    }

    #[tokio::test]
    async fn submit_mines_block_and_emits_event() {
        let registry = InMemoryRegistry::new();
        let r1 = registry.submit(&entry("B1", "C1")).await.unwrap();
        let r2 = registry.submit(&entry("B2", "C2")).await.unwrap();
        assert_eq!(r1.block_ref, 1);
        assert_eq!(r2.block_ref, 2);
        assert_ne!(r1.transaction_ref, r2.transaction_ref);
        assert_eq!(registry.event_count(), 2);
        assert_eq!(registry.head_block().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn read_missing_returns_default() {
        let registry = InMemoryRegistry::new();
        let stored = registry.read(&BatchId::new("nope").unwrap()).await.unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn later_write_overwrites_state() {
        let registry = InMemoryRegistry::new();
        registry.submit(&entry("B1", "C1")).await.unwrap();
        registry.submit(&entry("B1", "C9")).await.unwrap();
        let stored = registry.read(&BatchId::new("B1").unwrap()).await.unwrap();
        assert_eq!(stored.content_id, "C9");
        assert_eq!(registry.event_count(), 2);
    }

    #[tokio::test]
    async fn failure_switches() {
        let registry = InMemoryRegistry::new();
        registry.set_fail_submit(true);
        assert!(registry.submit(&entry("B1", "C1")).await.is_err());
        assert_eq!(registry.submit_count(), 1);
        assert_eq!(registry.event_count(), 0);

        registry.set_fail_events(true);
        assert!(registry.events().await.is_err());

        registry.fail_read_for("B1");
        assert!(registry.read(&BatchId::new("B1").unwrap()).await.is_err());
    }

    #[tokio::test]
    async fn stalled_write_is_not_mined() {
        let registry = InMemoryRegistry::new();
        registry.stall_confirmations(Some(250));
        let err = registry.submit(&entry("B1", "C1")).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::ConfirmationTimeout { waited_ms: 250, ref transaction_ref }
                if transaction_ref.starts_with("0x")
        ));
        assert_eq!(registry.event_count(), 0);
        assert_eq!(registry.head_block().await.unwrap(), 0);

        registry.stall_confirmations(None);
        assert_eq!(registry.submit(&entry("B1", "C1")).await.unwrap().block_ref, 1);
    }
}
