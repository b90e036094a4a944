use spicesniff_types::ContentId;

/// Errors from content store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Uploading the document to the primary store failed.
    #[error("upload failed: {0}")]
    Upload(String),

    /// The primary store and every fallback gateway failed.
    #[error("could not retrieve {content_id} after {attempts} attempts")]
    Retrieval { content_id: ContentId, attempts: usize },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store was configured with an unusable endpoint or client setting.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
