//! Live telemetry feed for SpiceSniff.
//!
//! Field devices push readings continuously. The feed keeps the most recent
//! one, a bounded FIFO history, and fans every accepted sample out to
//! connected observers. Nothing here is persisted: promotion of a sample
//! into an anchored batch is a separate, explicit operation in the SDK.

pub mod error;
pub mod feed;
pub mod history;

pub use error::{TelemetryError, TelemetryResult};
pub use feed::{FeedConfig, LiveFeed, Subscription};
pub use history::HistoryBuffer;
