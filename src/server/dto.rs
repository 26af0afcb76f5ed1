use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::game_state::{PlayerState, PlayerStateUpdate};
use crate::leaderboard::LeaderboardEntry;

use super::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct GameQuery {
    #[serde(rename = "userName", default)]
    pub user_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameResponse {
    #[serde(rename = "gameData")]
    pub game_data: PlayerState,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Clients send the score as a string; plain numbers are accepted too.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    Number(u64),
    Text(String),
}

impl ScoreValue {
    pub fn parse(&self) -> Result<u64, ApiError> {
        match self {
            ScoreValue::Number(score) => Ok(*score),
            ScoreValue::Text(raw) => raw.trim().parse().map_err(|_| {
                ApiError::bad_request(format!("score must be a non-negative integer, got {raw:?}"))
            }),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGameRequest {
    #[serde(default)]
    pub user_name: String,
    pub score: ScoreValue,
    #[serde(default)]
    pub game_cards: Option<Vec<Card>>,
    #[serde(default)]
    pub has_defuse_card: Option<bool>,
    #[serde(default)]
    pub active_card: Option<String>,
}

impl UpdateGameRequest {
    /// Full replacement of every stored field; missing optional fields reset
    /// to their zero value.
    pub fn to_update(&self) -> Result<PlayerStateUpdate, ApiError> {
        let active_card = self
            .active_card
            .as_deref()
            .filter(|name| !name.is_empty())
            .map(Card::named);

        Ok(PlayerStateUpdate {
            score: Some(self.score.parse()?),
            cards: Some(self.game_cards.clone().unwrap_or_default()),
            has_defuse_card: Some(self.has_defuse_card.unwrap_or(false)),
            active_card: Some(active_card),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ResetGameRequest {
    #[serde(rename = "userName", default)]
    pub user_name: String,
}
