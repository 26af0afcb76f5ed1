use serde::{Deserialize, Serialize};

use crate::cards::Card;

/// Persisted per-player game record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub score: u64,
    #[serde(rename = "gameCards")]
    pub cards: Vec<Card>,
    #[serde(rename = "hasDefuseCard")]
    pub has_defuse_card: bool,
    #[serde(rename = "activeCard")]
    pub active_card: Option<Card>,
}

impl PlayerState {
    /// State written for a brand-new player.
    pub fn seeded(cards: Vec<Card>) -> Self {
        Self {
            cards,
            ..Self::default()
        }
    }
}

/// Partial or full replacement of a player's fields. `None` leaves the
/// stored field untouched; `active_card: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerStateUpdate {
    pub score: Option<u64>,
    pub cards: Option<Vec<Card>>,
    pub has_defuse_card: Option<bool>,
    pub active_card: Option<Option<Card>>,
}

impl PlayerStateUpdate {
    pub fn is_empty(&self) -> bool {
        self.score.is_none()
            && self.cards.is_none()
            && self.has_defuse_card.is_none()
            && self.active_card.is_none()
    }
}

impl From<PlayerState> for PlayerStateUpdate {
    fn from(state: PlayerState) -> Self {
        Self {
            score: Some(state.score),
            cards: Some(state.cards),
            has_defuse_card: Some(state.has_defuse_card),
            active_card: Some(state.active_card),
        }
    }
}
