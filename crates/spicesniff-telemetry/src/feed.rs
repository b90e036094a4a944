use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use spicesniff_types::TelemetrySample;

use crate::error::{TelemetryError, TelemetryResult};
use crate::history::HistoryBuffer;

/// Configuration for the [`LiveFeed`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Samples retained in the recent-history buffer.
    pub history_capacity: usize,
    /// Per-observer backlog before a slow observer starts skipping samples.
    pub channel_capacity: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            history_capacity: 100,
            channel_capacity: 256,
        }
    }
}

struct FeedState {
    latest: Option<TelemetrySample>,
    history: HistoryBuffer<TelemetrySample>,
}

/// Latest-sample slot, bounded history, and broadcast fan-out.
///
/// All mutation happens under one short write lock that is never held across
/// an await point. Broadcasting happens under the same lock so a new
/// subscriber sees each sample exactly once: either as its initial latest
/// value or through the channel.
pub struct LiveFeed {
    state: RwLock<FeedState>,
    sender: broadcast::Sender<TelemetrySample>,
}

impl LiveFeed {
    pub fn new(config: FeedConfig) -> Self {
        let (sender, _) = broadcast::channel(config.channel_capacity.max(1));
        Self {
            state: RwLock::new(FeedState {
                latest: None,
                history: HistoryBuffer::new(config.history_capacity),
            }),
            sender,
        }
    }

    /// Accept a reading: stamp it, replace the latest slot, append it to the
    /// history, and push it to every connected observer.
    pub fn accept(&self, mut sample: TelemetrySample, now_ms: u64) -> TelemetryResult<TelemetrySample> {
        if sample.device_id.trim().is_empty() {
            return Err(TelemetryError::MissingDevice);
        }
        sample.stamp(now_ms);

        let mut state = self.state.write().expect("feed lock poisoned");
        state.latest = Some(sample.clone());
        state.history.push(sample.clone());
        let observers = self.sender.send(sample.clone()).unwrap_or(0);
        drop(state);

        info!(
            device = %sample.device_id,
            purity = ?sample.purity,
            grade = ?sample.grade,
            available = sample.available,
            observers,
            "sensor reading received"
        );
        Ok(sample)
    }

    pub fn latest(&self) -> Option<TelemetrySample> {
        self.state.read().expect("feed lock poisoned").latest.clone()
    }

    /// Retained history, oldest first.
    pub fn history(&self) -> Vec<TelemetrySample> {
        self.state.read().expect("feed lock poisoned").history.to_vec()
    }

    pub fn history_len(&self) -> usize {
        self.state.read().expect("feed lock poisoned").history.len()
    }

    /// Register an observer. It starts from the current latest sample only;
    /// history is never replayed.
    pub fn subscribe(&self) -> Subscription {
        let state = self.state.read().expect("feed lock poisoned");
        let receiver = self.sender.subscribe();
        let initial = state.latest.clone();
        drop(state);
        debug!(observers = self.sender.receiver_count(), "observer subscribed");
        Subscription { initial, receiver }
    }

    pub fn observer_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new(FeedConfig::default())
    }
}

impl std::fmt::Debug for LiveFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveFeed")
            .field("history_len", &self.history_len())
            .field("observers", &self.observer_count())
            .finish()
    }
}

/// One observer's view of the feed.
pub struct Subscription {
    initial: Option<TelemetrySample>,
    receiver: broadcast::Receiver<TelemetrySample>,
}

impl Subscription {
    /// Next sample for this observer: the latest-at-subscribe sample first,
    /// then every newly accepted one. Returns `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<TelemetrySample> {
        if let Some(sample) = self.initial.take() {
            return Some(sample);
        }
        loop {
            match self.receiver.recv().await {
                Ok(sample) => return Some(sample),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "observer lagging; skipping samples");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}
