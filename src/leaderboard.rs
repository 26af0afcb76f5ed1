use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::store::{GameStore, StoreError, WriteBatch};

pub const DEFAULT_LEADERBOARD_KEY: &str = "leaderboard";

/// Largest score a sorted-set float holds exactly (2^53).
pub const MAX_SCORE: u64 = 1 << 53;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "userScore")]
    pub user_score: u64,
}

/// Global ranking of player scores held in a single store sorted set.
#[derive(Clone)]
pub struct LeaderboardService {
    store: Arc<dyn GameStore>,
    key: String,
}

impl LeaderboardService {
    pub fn new(store: Arc<dyn GameStore>) -> Self {
        Self::with_key(store, DEFAULT_LEADERBOARD_KEY)
    }

    pub fn with_key(store: Arc<dyn GameStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Creates the member or overwrites its score. Last write wins. Scores
    /// above [`MAX_SCORE`] lose precision.
    pub async fn upsert(&self, player: &str, score: u64) -> Result<(), StoreError> {
        self.store.set_score(&self.key, player, score as f64).await
    }

    pub async fn remove(&self, player: &str) -> Result<(), StoreError> {
        self.store.remove_member(&self.key, player).await
    }

    /// Queues an upsert on a batch the caller commits.
    pub fn stage_upsert(&self, batch: &mut WriteBatch, player: &str, score: u64) {
        batch.set_score(&self.key, player, score as f64);
    }

    pub fn stage_remove(&self, batch: &mut WriteBatch, player: &str) {
        batch.remove_member(&self.key, player);
    }

    /// Fresh copy of the ranking, highest score first.
    pub async fn snapshot(&self) -> Result<Vec<LeaderboardEntry>, StoreError> {
        let ranked = self.store.read_ranked_descending(&self.key).await?;
        Ok(ranked
            .into_iter()
            .map(|(user_name, score)| LeaderboardEntry {
                user_name,
                // sorted-set scores are floats; negatives saturate to 0
                user_score: score as u64,
            })
            .collect())
    }
}
