use tokio::sync::broadcast;
use tracing::debug;

const LOG_TARGET: &str = "realtime::hub";

pub const DEFAULT_HUB_CAPACITY: usize = 64;

/// Out-of-band fan-out of serialized leaderboard snapshots to every live
/// connection.
///
/// Publishing never blocks. With no subscribers the payload is dropped, and a
/// subscriber that falls more than `capacity` payloads behind skips ahead.
#[derive(Clone)]
pub struct LeaderboardHub {
    tx: broadcast::Sender<String>,
}

impl LeaderboardHub {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    /// Returns how many connections the payload was queued for.
    pub fn publish(&self, payload: String) -> usize {
        match self.tx.send(payload) {
            Ok(receivers) => {
                debug!(target: LOG_TARGET, receivers, "published leaderboard");
                receivers
            }
            Err(_) => {
                debug!(target: LOG_TARGET, "no live connections, leaderboard push dropped");
                0
            }
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for LeaderboardHub {
    fn default() -> Self {
        Self::new(DEFAULT_HUB_CAPACITY)
    }
}
