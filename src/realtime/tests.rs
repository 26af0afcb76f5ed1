use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::leaderboard::{LeaderboardEntry, LeaderboardService};
use crate::store::{GameStore, InMemoryStore};

const WAIT: Duration = Duration::from_secs(2);

struct Harness {
    store: InMemoryStore,
    channel: Arc<RealtimeChannel>,
    shutdown: CancellationToken,
}

impl Harness {
    fn new() -> Self {
        let store = InMemoryStore::new();
        let shutdown = CancellationToken::new();
        let channel = Arc::new(RealtimeChannel::new(
            LeaderboardService::new(Arc::new(store.clone())),
            Arc::new(ConnectionTally::new()),
            LeaderboardHub::default(),
            shutdown.clone(),
        ));
        Self {
            store,
            channel,
            shutdown,
        }
    }

    fn connect(&self) -> Connection {
        let (client_tx, server_rx) = mpsc::unbounded::<Result<Message, Infallible>>();
        let (server_tx, client_rx) = mpsc::unbounded::<Message>();
        let channel = Arc::clone(&self.channel);
        let task = tokio::spawn(async move { channel.run(server_tx, server_rx).await });
        Connection {
            tx: client_tx,
            rx: client_rx,
            task,
        }
    }
}

struct Connection {
    tx: mpsc::UnboundedSender<Result<Message, Infallible>>,
    rx: mpsc::UnboundedReceiver<Message>,
    task: JoinHandle<()>,
}

impl Connection {
    async fn send_text(&mut self, text: &str) {
        self.tx
            .send(Ok(Message::Text(text.to_string())))
            .await
            .unwrap();
    }

    async fn next_frame(&mut self) -> Message {
        timeout(WAIT, self.rx.next())
            .await
            .expect("frame within timeout")
            .expect("connection still open")
    }

    async fn next_leaderboard(&mut self) -> Vec<LeaderboardEntry> {
        match self.next_frame().await {
            Message::Text(text) => serde_json::from_str(&text).unwrap(),
            other => panic!("expected text frame, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn each_message_bumps_tally_and_replies_with_leaderboard() {
    let harness = Harness::new();
    harness.store.set_score("leaderboard", "alice", 5.0).await.unwrap();
    harness.store.set_score("leaderboard", "bob", 9.0).await.unwrap();

    let mut conn = harness.connect();
    for _ in 0..3 {
        conn.send_text("alice").await;
        let board = conn.next_leaderboard().await;
        assert_eq!(board[0].user_name, "bob");
        assert_eq!(board[1].user_name, "alice");
    }

    assert_eq!(harness.channel.tally().count("alice"), 3);
    assert_eq!(harness.channel.tally().count("bob"), 0);
}

#[tokio::test]
async fn binary_frames_get_binary_replies() {
    let harness = Harness::new();
    let mut conn = harness.connect();

    conn.tx
        .send(Ok(Message::Binary(b"carol".to_vec())))
        .await
        .unwrap();
    match conn.next_frame().await {
        Message::Binary(bytes) => assert_eq!(bytes, b"[]".to_vec()),
        other => panic!("expected binary frame, got {other:?}"),
    }
    assert_eq!(harness.channel.tally().count("carol"), 1);
}

#[tokio::test]
async fn failed_leaderboard_read_skips_reply_but_keeps_connection() {
    let harness = Harness::new();
    let mut conn = harness.connect();

    harness.store.set_unavailable(true);
    conn.send_text("alice").await;
    assert!(timeout(Duration::from_millis(200), conn.rx.next())
        .await
        .is_err());

    harness.store.set_unavailable(false);
    conn.send_text("alice").await;
    assert!(conn.next_leaderboard().await.is_empty());
    assert_eq!(harness.channel.tally().count("alice"), 2);
    assert!(!conn.task.is_finished());
}

#[tokio::test]
async fn write_failure_tears_down_connection() {
    let harness = Harness::new();
    let Connection { mut tx, rx, task } = harness.connect();
    drop(rx);

    tx.send(Ok(Message::Text("alice".into()))).await.unwrap();
    timeout(WAIT, task).await.expect("loop ends").unwrap();
}

#[tokio::test]
async fn close_frame_ends_connection() {
    let harness = Harness::new();
    let Connection { mut tx, rx: _rx, task } = harness.connect();

    tx.send(Ok(Message::Close(None))).await.unwrap();
    timeout(WAIT, task).await.expect("loop ends").unwrap();
    assert!(harness.channel.tally().is_empty());
}

#[tokio::test]
async fn hub_pushes_reach_every_connection() {
    let harness = Harness::new();
    assert_eq!(harness.channel.publish_snapshot(&[]).unwrap(), 0);

    let mut first = harness.connect();
    let mut second = harness.connect();
    first.send_text("alice").await;
    first.next_leaderboard().await;
    second.send_text("bob").await;
    second.next_leaderboard().await;

    let snapshot = vec![LeaderboardEntry {
        user_name: "alice".into(),
        user_score: 3,
    }];
    assert_eq!(harness.channel.publish_snapshot(&snapshot).unwrap(), 2);

    assert_eq!(first.next_leaderboard().await, snapshot);
    assert_eq!(second.next_leaderboard().await, snapshot);
}

#[tokio::test]
async fn shutdown_closes_live_connections() {
    let harness = Harness::new();
    let mut conn = harness.connect();
    conn.send_text("alice").await;
    conn.next_leaderboard().await;

    harness.shutdown.cancel();
    assert!(matches!(conn.next_frame().await, Message::Close(None)));
    timeout(WAIT, conn.task).await.expect("loop ends").unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_increments_are_not_lost() {
    let tally = Arc::new(ConnectionTally::new());
    let mut handles = Vec::new();
    for worker in 0..8 {
        let tally = Arc::clone(&tally);
        handles.push(tokio::spawn(async move {
            for _ in 0..500 {
                tally.increment("shared");
                tally.increment(&format!("worker-{worker}"));
                tokio::task::yield_now().await;
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(tally.count("shared"), 8 * 500);
    assert_eq!(tally.count("worker-3"), 500);
    assert_eq!(tally.len(), 9);
}
