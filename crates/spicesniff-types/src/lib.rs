//! Foundation types for SpiceSniff provenance.
//!
//! Every other SpiceSniff crate depends on `spicesniff-types`.
//!
//! # Key Types
//!
//! - [`BatchId`] -- human-assigned production lot identifier, the on-chain lookup key
//! - [`ContentId`] -- content-store address of a batch document
//! - [`BatchRecord`] -- anchored `(batch id → content id)` pair with ledger provenance
//! - [`AnchorReceipt`] -- transaction and block reference of a confirmed anchor
//! - [`SchemaVersion`] -- explicit version of the registry contract ABI
//! - [`TelemetrySample`] -- ephemeral live sensor reading

pub mod batch;
pub mod content;
pub mod error;
pub mod schema;
pub mod telemetry;

pub use batch::{AnchorReceipt, BatchId, BatchRecord, MAX_BATCH_ID_LEN};
pub use content::ContentId;
pub use error::TypeError;
pub use schema::SchemaVersion;
pub use telemetry::TelemetrySample;
