use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::Query;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::game_state::GameStateRepository;
use crate::leaderboard::{LeaderboardEntry, LeaderboardService};
use crate::realtime::{ConnectionTally, LeaderboardHub, RealtimeChannel};
use crate::store::GameStore;

use super::dto::{GameQuery, GameResponse, ResetGameRequest, UpdateGameRequest};
use super::error::ApiError;
use super::logging::log_requests;

const LOG_TARGET: &str = "server::routes";

/// Everything a request handler needs, built once at startup around a
/// single shared store handle.
pub struct ServerContext {
    pub games: GameStateRepository,
    pub realtime: Arc<RealtimeChannel>,
    shutdown: CancellationToken,
}

impl ServerContext {
    pub fn new(store: Arc<dyn GameStore>, leaderboard_key: &str, hub_capacity: usize) -> Self {
        let shutdown = CancellationToken::new();
        let leaderboard = LeaderboardService::with_key(Arc::clone(&store), leaderboard_key);
        let realtime = RealtimeChannel::new(
            leaderboard.clone(),
            Arc::new(ConnectionTally::new()),
            LeaderboardHub::new(hub_capacity),
            shutdown.clone(),
        );

        Self {
            games: GameStateRepository::new(store, leaderboard),
            realtime: Arc::new(realtime),
            shutdown,
        }
    }

    pub fn leaderboard(&self) -> &LeaderboardService {
        self.games.leaderboard()
    }

    /// Cancelling this token closes every live realtime connection.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Reads the leaderboard and pushes it to live connections.
    async fn snapshot_and_publish(&self) -> Result<Vec<LeaderboardEntry>, ApiError> {
        let leaderboard = self.leaderboard().snapshot().await?;
        self.realtime.publish_snapshot(&leaderboard)?;
        Ok(leaderboard)
    }
}

pub struct KittenServer {
    router: Router,
}

impl KittenServer {
    pub fn new(context: Arc<ServerContext>) -> Self {
        let router = Router::new()
            .route("/game", get(get_game).put(update_game).delete(reset_game))
            .route("/ws", get(realtime_socket))
            .layer(Extension(context))
            .layer(middleware::from_fn(log_requests))
            .layer(CorsLayer::permissive());

        Self { router }
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

async fn get_game(
    Extension(ctx): Extension<Arc<ServerContext>>,
    Query(query): Query<GameQuery>,
) -> Result<Json<GameResponse>, ApiError> {
    ctx.games.ensure_initialized(&query.user_name).await?;
    let game_data = ctx.games.read(&query.user_name).await?;
    let leaderboard = ctx.leaderboard().snapshot().await?;

    Ok(Json(GameResponse {
        game_data,
        leaderboard,
    }))
}

async fn update_game(
    Extension(ctx): Extension<Arc<ServerContext>>,
    body: Result<Json<UpdateGameRequest>, JsonRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let Json(request) = body?;
    let update = request.to_update()?;
    ctx.games.update(&request.user_name, &update).await?;

    Ok(Json(ctx.snapshot_and_publish().await?))
}

async fn reset_game(
    Extension(ctx): Extension<Arc<ServerContext>>,
    body: Result<Json<ResetGameRequest>, JsonRejection>,
) -> Result<Json<Vec<LeaderboardEntry>>, ApiError> {
    let Json(request) = body?;
    ctx.games.reset(&request.user_name).await?;

    Ok(Json(ctx.snapshot_and_publish().await?))
}

async fn realtime_socket(
    Extension(ctx): Extension<Arc<ServerContext>>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            warn!(target: LOG_TARGET, error = %rejection, "error upgrading to websocket");
            return rejection.into_response();
        }
    };

    let realtime = Arc::clone(&ctx.realtime);
    upgrade.on_upgrade(move |socket| async move { realtime.serve(socket).await })
}
