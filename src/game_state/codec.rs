//! Mapping between [`PlayerState`] and the flat string fields of a store hash.
//!
//! Decoding never fails: malformed values fall back to the zero value for
//! the field, so a partially written record still reads.

use tracing::debug;

use crate::cards::Card;
use crate::store::FieldMap;

use super::error::GameError;
use super::types::{PlayerState, PlayerStateUpdate};

const LOG_TARGET: &str = "game_state::codec";

pub(crate) const FIELD_SCORE: &str = "score";
pub(crate) const FIELD_CARDS: &str = "gameCards";
pub(crate) const FIELD_HAS_DEFUSE: &str = "hasDefuseCard";
pub(crate) const FIELD_ACTIVE_CARD: &str = "activeCard";

pub(crate) fn encode_update(update: &PlayerStateUpdate) -> Result<Vec<(String, String)>, GameError> {
    let mut fields = Vec::with_capacity(4);
    if let Some(cards) = &update.cards {
        let encoded = serde_json::to_string(cards).map_err(|source| GameError::Encode {
            field: FIELD_CARDS,
            source,
        })?;
        fields.push((FIELD_CARDS.to_string(), encoded));
    }
    if let Some(has_defuse_card) = update.has_defuse_card {
        fields.push((FIELD_HAS_DEFUSE.to_string(), has_defuse_card.to_string()));
    }
    if let Some(active_card) = &update.active_card {
        let name = active_card
            .as_ref()
            .map(|card| card.name.clone())
            .unwrap_or_default();
        fields.push((FIELD_ACTIVE_CARD.to_string(), name));
    }
    if let Some(score) = update.score {
        fields.push((FIELD_SCORE.to_string(), score.to_string()));
    }
    Ok(fields)
}

pub(crate) fn decode_state(fields: &FieldMap) -> PlayerState {
    PlayerState {
        score: decode_score(fields.get(FIELD_SCORE)),
        cards: decode_cards(fields.get(FIELD_CARDS)),
        has_defuse_card: decode_bool(fields.get(FIELD_HAS_DEFUSE)),
        active_card: fields
            .get(FIELD_ACTIVE_CARD)
            .filter(|name| !name.is_empty())
            .map(Card::named),
    }
}

fn decode_score(raw: Option<&String>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    raw.trim().parse().unwrap_or_else(|_| {
        debug!(target: LOG_TARGET, field = FIELD_SCORE, %raw, "defaulting unparsable field");
        0
    })
}

fn decode_cards(raw: Option<&String>) -> Vec<Card> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Vec::new();
    };
    serde_json::from_str(raw).unwrap_or_else(|err| {
        debug!(target: LOG_TARGET, field = FIELD_CARDS, error = %err, "defaulting unparsable field");
        Vec::new()
    })
}

/// Accepts the spellings older writers used (`1`/`0`, `t`/`f`, ...).
fn decode_bool(raw: Option<&String>) -> bool {
    match raw.map(String::as_str) {
        None | Some("") => false,
        Some("1" | "t" | "T" | "true" | "TRUE" | "True") => true,
        Some("0" | "f" | "F" | "false" | "FALSE" | "False") => false,
        Some(other) => {
            debug!(target: LOG_TARGET, field = FIELD_HAS_DEFUSE, raw = %other, "defaulting unparsable field");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardKind;

    fn map(pairs: &[(&str, &str)]) -> FieldMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn malformed_fields_fall_back_to_zero_values() {
        let state = decode_state(&map(&[
            (FIELD_SCORE, "lots"),
            (FIELD_CARDS, "{not json"),
            (FIELD_HAS_DEFUSE, "maybe"),
            (FIELD_ACTIVE_CARD, ""),
        ]));
        assert_eq!(state, PlayerState::default());
        assert_eq!(decode_state(&FieldMap::new()), PlayerState::default());
    }

    #[test]
    fn legacy_encodings_decode() {
        let state = decode_state(&map(&[
            (FIELD_SCORE, "9"),
            (FIELD_CARDS, r#"["Cat card 😼","Defuse card 🙅‍♂️"]"#),
            (FIELD_HAS_DEFUSE, "1"),
            (FIELD_ACTIVE_CARD, "Shuffle card 🔀 "),
        ]));
        assert_eq!(state.score, 9);
        assert_eq!(
            state.cards,
            vec![
                Card::named(CardKind::Cat.label()),
                Card::named(CardKind::Defuse.label())
            ]
        );
        assert!(state.has_defuse_card);
        assert_eq!(state.active_card, Some(Card::named(CardKind::Shuffle.label())));
    }

    #[test]
    fn partial_update_encodes_only_present_fields() {
        let update = PlayerStateUpdate {
            score: Some(3),
            active_card: Some(None),
            ..PlayerStateUpdate::default()
        };
        let fields = encode_update(&update).unwrap();
        assert_eq!(
            fields,
            vec![
                (FIELD_ACTIVE_CARD.to_string(), String::new()),
                (FIELD_SCORE.to_string(), "3".to_string()),
            ]
        );
    }

    #[test]
    fn encoded_state_decodes_to_same_state() {
        let state = PlayerState {
            score: 12,
            cards: vec![
                Card::from(CardKind::ExplodingKitten),
                Card::from(CardKind::Cat),
            ],
            has_defuse_card: true,
            active_card: Some(Card::named("Cat card 😼")),
        };
        let fields: FieldMap = encode_update(&PlayerStateUpdate::from(state.clone()))
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(decode_state(&fields), state);
    }
}
