use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Content-store address of a document.
///
/// The format is owned by the store: an IPFS CID for the daemon backend, a
/// BLAKE3 digest for the in-memory backend. SpiceSniff treats it as opaque.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    pub fn new(raw: impl Into<String>) -> Result<Self, TypeError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypeError::Empty("content id"));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Derive an id from raw bytes (BLAKE3, hex-encoded, `b3` prefixed).
    ///
    /// Identical content always produces the same id.
    pub fn digest(data: &[u8]) -> Self {
        Self(format!("b3{}", hex::encode(blake3::hash(data).as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentId({})", self.0)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ContentId {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ContentId> for String {
    fn from(id: ContentId) -> Self {
        id.0
    }
}
