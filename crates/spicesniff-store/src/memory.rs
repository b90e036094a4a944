use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use spicesniff_types::ContentId;

use crate::canonical::canonical_bytes;
use crate::error::{StoreError, StoreResult};
use crate::traits::ContentStore;

/// In-memory, digest-keyed content store.
///
/// Intended for tests and local demos. Documents are stored as canonical
/// bytes keyed by their BLAKE3 [`ContentId`], so writes are idempotent.
/// Failure switches let tests exercise the upload and retrieval error paths.
pub struct InMemoryContentStore {
    documents: RwLock<HashMap<ContentId, Vec<u8>>>,
    fail_uploads: AtomicBool,
    fail_reads: AtomicBool,
    uploads: AtomicUsize,
}

impl InMemoryContentStore {
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            fail_uploads: AtomicBool::new(false),
            fail_reads: AtomicBool::new(false),
            uploads: AtomicUsize::new(0),
        }
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().expect("lock poisoned").is_empty()
    }

    pub fn contains(&self, id: &ContentId) -> bool {
        self.documents.read().expect("lock poisoned").contains_key(id)
    }

    /// Number of `store` calls that reached the backend, failed or not.
    pub fn upload_attempts(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    /// Make every subsequent upload fail.
    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent retrieval fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

impl Default for InMemoryContentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentStore for InMemoryContentStore {
    async fn store(&self, document: &Value) -> StoreResult<ContentId> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(StoreError::Upload("in-memory store configured to fail".into()));
        }
        let bytes = canonical_bytes(document)?;
        let id = ContentId::digest(&bytes);
        self.documents
            .write()
            .expect("lock poisoned")
            .entry(id.clone())
            .or_insert(bytes);
        debug!(cid = %id, "stored document in memory");
        Ok(id)
    }

    async fn retrieve(&self, id: &ContentId) -> StoreResult<Value> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Retrieval {
                content_id: id.clone(),
                attempts: 1,
            });
        }
        let bytes = self
            .documents
            .read()
            .expect("lock poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::Retrieval {
                content_id: id.clone(),
                attempts: 1,
            })?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    async fn is_available(&self) -> bool {
        !self.fail_uploads.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for InMemoryContentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryContentStore")
            .field("document_count", &self.len())
            .finish()
    }
}
