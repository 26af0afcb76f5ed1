use std::sync::Arc;

use tracing::{debug, info};

use crate::cards::generate_random_cards;
use crate::leaderboard::{LeaderboardService, MAX_SCORE};
use crate::store::{GameStore, WriteBatch};

use super::codec::{decode_state, encode_update};
use super::error::GameError;
use super::types::{PlayerState, PlayerStateUpdate};

const LOG_TARGET: &str = "game_state::repository";

/// Player records live under this prefix so no player name can collide with
/// the leaderboard sorted set.
pub const PLAYER_KEY_PREFIX: &str = "player:";

pub fn player_key(player: &str) -> String {
    format!("{PLAYER_KEY_PREFIX}{player}")
}

/// Reads and writes player records keyed by player name, keeping the
/// leaderboard in step with each record's score.
///
/// Nothing is cached: every call goes to the store.
#[derive(Clone)]
pub struct GameStateRepository {
    store: Arc<dyn GameStore>,
    leaderboard: LeaderboardService,
}

impl GameStateRepository {
    pub fn new(store: Arc<dyn GameStore>, leaderboard: LeaderboardService) -> Self {
        Self { store, leaderboard }
    }

    pub fn leaderboard(&self) -> &LeaderboardService {
        &self.leaderboard
    }

    /// Seeds a record and a zero leaderboard score for a previously unseen
    /// player. Returns `true` when it seeded, `false` for an empty name or an
    /// existing record.
    pub async fn ensure_initialized(&self, player: &str) -> Result<bool, GameError> {
        if player.is_empty() {
            return Ok(false);
        }
        let key = player_key(player);
        if self.store.exists(&key).await? {
            return Ok(false);
        }

        let cards = generate_random_cards(&mut rand::thread_rng());
        let seeded = PlayerState::seeded(cards);

        let mut batch = WriteBatch::new();
        batch.write_fields(&key, encode_update(&PlayerStateUpdate::from(seeded))?);
        self.leaderboard.stage_upsert(&mut batch, player, 0);
        self.store.commit(batch).await?;

        info!(target: LOG_TARGET, player, "initialized new player");
        Ok(true)
    }

    /// Reads the record, defaulting any field that is missing or malformed.
    pub async fn read(&self, player: &str) -> Result<PlayerState, GameError> {
        let fields = self.store.read_fields(&player_key(player)).await?;
        Ok(decode_state(&fields))
    }

    /// Writes the given fields verbatim and forwards a new score to the
    /// leaderboard in the same commit.
    pub async fn update(&self, player: &str, update: &PlayerStateUpdate) -> Result<(), GameError> {
        if player.is_empty() {
            return Err(GameError::invalid_argument("userName is required"));
        }
        if let Some(score) = update.score.filter(|score| *score > MAX_SCORE) {
            return Err(GameError::invalid_argument(format!(
                "score {score} exceeds the maximum of {MAX_SCORE}"
            )));
        }
        if update.is_empty() {
            debug!(target: LOG_TARGET, player, "empty update ignored");
            return Ok(());
        }

        let mut batch = WriteBatch::new();
        batch.write_fields(&player_key(player), encode_update(update)?);
        if let Some(score) = update.score {
            self.leaderboard.stage_upsert(&mut batch, player, score);
        }
        self.store.commit(batch).await?;

        debug!(target: LOG_TARGET, player, score = ?update.score, "updated player state");
        Ok(())
    }

    /// Zeroes every field and drops the player from the leaderboard.
    pub async fn reset(&self, player: &str) -> Result<(), GameError> {
        if player.is_empty() {
            return Err(GameError::invalid_argument("userName is required"));
        }

        let mut batch = WriteBatch::new();
        batch.write_fields(
            &player_key(player),
            encode_update(&PlayerStateUpdate::from(PlayerState::default()))?,
        );
        self.leaderboard.stage_remove(&mut batch, player);
        self.store.commit(batch).await?;

        info!(target: LOG_TARGET, player, "reset player state");
        Ok(())
    }
}
