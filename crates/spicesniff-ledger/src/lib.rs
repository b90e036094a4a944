//! Ledger client for SpiceSniff provenance.
//!
//! This crate anchors `(batch id, spice kind, content id)` triples on an
//! append-only on-chain registry and reads them back. It provides:
//! - A versioned [`RegistrySchema`] binding one canonical ABI shape
//! - The [`Registry`] trait boundary, with [`JsonRpcRegistry`] for real
//!   chains and [`InMemoryRegistry`] for tests and embedding
//! - [`Ledger`]: anchor, point resolve, and event-log reconciliation
//!
//! The registry exposes point lookups by id but no enumeration, so listing
//! is two-phase: discover ids from the event log, then confirm each one
//! against current state.

pub mod config;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod rpc;
pub mod schema;
pub mod traits;

pub use config::{LedgerConfig, ListingMode, RpcConfig};
pub use error::{LedgerError, LedgerResult, RegistryError, RegistryResult};
pub use ledger::Ledger;
pub use memory::InMemoryRegistry;
pub use rpc::JsonRpcRegistry;
pub use schema::{ReadLayout, RegistrySchema};
pub use traits::{BatchEvent, Registry, RegistryEntry, StoredBatch};
