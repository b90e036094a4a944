//! Content-addressed document storage for SpiceSniff.
//!
//! Full batch documents (sensor readings plus derived metrics) live in a
//! content-addressed store; only their [`ContentId`] goes on-chain.
//!
//! # Storage Backends
//!
//! All backends implement the [`ContentStore`] trait:
//!
//! - [`IpfsContentStore`] -- Kubo daemon API as primary, public HTTP gateways as fallback
//! - [`InMemoryContentStore`] -- digest-keyed store for tests and local demos
//!
//! # Design Rules
//!
//! 1. Documents are serialized canonically (sorted object keys) before upload,
//!    so the same document always yields the same bytes.
//! 2. Pinning is best-effort: a pin failure is logged, never surfaced.
//! 3. Retrieval degrades across tiers and fails only when every tier failed.
//! 4. Every fallback gateway attempt is independently time-bounded.
//!
//! [`ContentId`]: spicesniff_types::ContentId

pub mod canonical;
pub mod config;
pub mod error;
pub mod ipfs;
pub mod memory;
pub mod traits;

pub use canonical::{canonical_bytes, canonicalize};
pub use config::{IpfsConfig, DEFAULT_GATEWAYS};
pub use error::{StoreError, StoreResult};
pub use ipfs::IpfsContentStore;
pub use memory::InMemoryContentStore;
pub use traits::ContentStore;
