use async_trait::async_trait;
use serde_json::Value;
use spicesniff_types::ContentId;

use crate::error::StoreResult;

/// Content-addressed document store.
///
/// Implementations must guarantee:
/// - `store` serializes canonically, so equal documents yield equal ids.
/// - A pin failure after a successful upload still reports success.
/// - `retrieve` fails with [`StoreError::Retrieval`] only after every tier
///   it knows about has failed.
///
/// [`StoreError::Retrieval`]: crate::StoreError::Retrieval
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Upload a JSON document and return its content id.
    async fn store(&self, document: &Value) -> StoreResult<ContentId>;

    /// Fetch and parse a JSON document by content id.
    async fn retrieve(&self, id: &ContentId) -> StoreResult<Value>;

    /// Whether the primary store is reachable. Never fails.
    async fn is_available(&self) -> bool;
}
