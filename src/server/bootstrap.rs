use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::store::{GameStore, RedisStore};

use super::routes::{KittenServer, ServerContext};

const LOG_TARGET: &str = "server::bootstrap";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub redis_url: String,
    pub leaderboard_key: String,
    pub broadcast_capacity: usize,
}

/// Connects the store, builds the shared context and serves until Ctrl-C.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let store: Arc<dyn GameStore> = Arc::new(
        RedisStore::connect(&config.redis_url)
            .await
            .with_context(|| format!("failed to connect to redis at {}", config.redis_url))?,
    );
    let context = Arc::new(ServerContext::new(
        store,
        &config.leaderboard_key,
        config.broadcast_capacity,
    ));

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    let local_addr = listener.local_addr()?;
    info!(
        target: LOG_TARGET,
        %local_addr,
        leaderboard = %config.leaderboard_key,
        "kitten leaderboard server listening"
    );

    serve(listener, context, shutdown_signal()).await
}

/// Serves the router on `listener` until `signal` resolves, then closes every
/// realtime connection and drains in-flight requests.
pub async fn serve<F>(listener: TcpListener, context: Arc<ServerContext>, signal: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let shutdown = context.shutdown_token();
    let router = KittenServer::new(context).into_router();

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(async move {
            signal.await;
            shutdown.cancel();
        })
        .await
        .context("server exited with error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(
            target: LOG_TARGET,
            error = %err,
            "failed to install ctrl-c handler"
        );
    }
    info!(target: LOG_TARGET, "shutdown signal received");
}
