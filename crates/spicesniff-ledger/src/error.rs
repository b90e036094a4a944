/// Failures reported by a [`Registry`](crate::Registry) backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("abi error: {0}")]
    Abi(String),

    #[error("transaction {transaction_ref} reverted")]
    Reverted { transaction_ref: String },

    /// The node forgot the transaction before it was mined.
    #[error("transaction {transaction_ref} dropped before confirmation")]
    Dropped { transaction_ref: String },

    #[error("transaction {transaction_ref} unconfirmed after {waited_ms}ms")]
    ConfirmationTimeout { transaction_ref: String, waited_ms: u64 },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors produced by [`Ledger`](crate::Ledger) operations.
///
/// "No record" is not an error: `resolve` reports it as `Ok(None)`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Submission or confirmation of an anchoring write failed. Never retried.
    #[error("anchor of batch {batch_id} failed: {reason}")]
    Anchor { batch_id: String, reason: String },

    /// The anchoring transaction was submitted but not confirmed in time.
    #[error("anchor of batch {batch_id} unconfirmed: transaction {transaction_ref} still pending after {waited_ms}ms")]
    ConfirmationTimeout {
        batch_id: String,
        transaction_ref: String,
        waited_ms: u64,
    },

    /// Transport failure during a point lookup.
    #[error("resolve of batch {batch_id} failed: {reason}")]
    ResolveTransport { batch_id: String, reason: String },

    /// The event log query failed (strict listing mode only).
    #[error("listing failed: {0}")]
    Listing(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
