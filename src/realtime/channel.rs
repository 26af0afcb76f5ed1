use std::fmt::Display;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{Sink, SinkExt, Stream, StreamExt};
use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::leaderboard::{LeaderboardEntry, LeaderboardService};

use super::hub::LeaderboardHub;
use super::tally::ConnectionTally;

const LOG_TARGET: &str = "realtime::channel";

#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("failed to encode leaderboard: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write frame: {0}")]
    Send(String),
}

/// Replies go out in the same frame type the client used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Text,
    Binary,
}

/// Live leaderboard connections.
///
/// Each inbound frame carries a player name: the tally for that name is
/// bumped, then the current leaderboard is written back on the same
/// connection. Payloads published on the hub are forwarded to every
/// connection as text frames.
pub struct RealtimeChannel {
    leaderboard: LeaderboardService,
    tally: Arc<ConnectionTally>,
    hub: LeaderboardHub,
    shutdown: CancellationToken,
}

impl RealtimeChannel {
    pub fn new(
        leaderboard: LeaderboardService,
        tally: Arc<ConnectionTally>,
        hub: LeaderboardHub,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            leaderboard,
            tally,
            hub,
            shutdown,
        }
    }

    pub fn tally(&self) -> &ConnectionTally {
        &self.tally
    }

    pub fn hub(&self) -> &LeaderboardHub {
        &self.hub
    }

    /// Serializes a snapshot and pushes it to every live connection.
    pub fn publish_snapshot(&self, entries: &[LeaderboardEntry]) -> Result<usize, RealtimeError> {
        let payload = serde_json::to_string(entries)?;
        Ok(self.hub.publish(payload))
    }

    pub async fn serve(&self, socket: WebSocket) {
        let (sink, stream) = socket.split();
        self.run(sink, stream).await;
    }

    /// Drives one connection until the peer closes, a read or write fails,
    /// or the server shuts down.
    pub async fn run<S, R, E>(&self, mut sink: S, mut stream: R)
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
        R: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        let connection_id = Uuid::new_v4();
        let mut pushes = self.hub.subscribe();
        let mut hub_open = true;
        info!(target: LOG_TARGET, %connection_id, "realtime connection established");

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    debug!(target: LOG_TARGET, %connection_id, "shutdown signal received");
                    let _ = sink.send(Message::Close(None)).await;
                    break;
                }
                inbound = stream.next() => {
                    let (player, kind) = match inbound {
                        Some(Ok(Message::Text(text))) => (text, FrameKind::Text),
                        Some(Ok(Message::Binary(bytes))) => {
                            (String::from_utf8_lossy(&bytes).into_owned(), FrameKind::Binary)
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!(target: LOG_TARGET, %connection_id, ?frame, "closed by client");
                            break;
                        }
                        Some(Ok(_)) => continue,
                        Some(Err(err)) => {
                            warn!(target: LOG_TARGET, %connection_id, error = %err, "error reading message");
                            break;
                        }
                        None => {
                            debug!(target: LOG_TARGET, %connection_id, "stream ended");
                            break;
                        }
                    };

                    if let Err(err) = self.answer(&mut sink, &player, kind).await {
                        warn!(target: LOG_TARGET, %connection_id, error = %err, "dropping connection");
                        break;
                    }
                }
                pushed = pushes.recv(), if hub_open => {
                    match pushed {
                        Ok(payload) => {
                            if let Err(err) = sink.send(Message::Text(payload)).await {
                                warn!(target: LOG_TARGET, %connection_id, error = %err, "failed to forward leaderboard push");
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(target: LOG_TARGET, %connection_id, skipped, "lagged on leaderboard pushes");
                        }
                        Err(RecvError::Closed) => hub_open = false,
                    }
                }
            }
        }

        let _ = sink.close().await;
        info!(target: LOG_TARGET, %connection_id, "realtime connection closed");
    }

    /// Tally, then snapshot, then encode, then write. A failed snapshot read
    /// skips the reply but keeps the connection.
    async fn answer<S>(&self, sink: &mut S, player: &str, kind: FrameKind) -> Result<(), RealtimeError>
    where
        S: Sink<Message> + Unpin,
        S::Error: Display,
    {
        let count = self.tally.increment(player);
        debug!(target: LOG_TARGET, player, count, "received message");

        let snapshot = match self.leaderboard.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(target: LOG_TARGET, player, error = %err, "error fetching latest leaderboard");
                return Ok(());
            }
        };

        let payload = serde_json::to_string(&snapshot)?;
        let frame = match kind {
            FrameKind::Text => Message::Text(payload),
            FrameKind::Binary => Message::Binary(payload.into_bytes()),
        };
        sink.send(frame)
            .await
            .map_err(|err| RealtimeError::Send(err.to_string()))
    }
}
