use rand::Rng;
use serde::{Deserialize, Serialize};

/// Number of cards dealt to a freshly initialized player.
pub const DECK_SIZE: usize = 5;

/// The fixed card catalog. The name literals are matched on by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CardKind {
    Cat,
    Defuse,
    Shuffle,
    ExplodingKitten,
}

impl CardKind {
    pub const ALL: [CardKind; 4] = [
        CardKind::Cat,
        CardKind::Defuse,
        CardKind::Shuffle,
        CardKind::ExplodingKitten,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CardKind::Cat => "Cat card \u{1F63C}",
            CardKind::Defuse => "Defuse card \u{1F645}\u{200D}\u{2642}\u{FE0F}",
            // trailing space is part of the published literal
            CardKind::Shuffle => "Shuffle card \u{1F500} ",
            CardKind::ExplodingKitten => "Exploding kitten card \u{1F4A3}",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            CardKind::Cat => "cat",
            CardKind::Defuse => "defuse",
            CardKind::Shuffle => "shuffle",
            CardKind::ExplodingKitten => "exploding_kitten",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.label() == label)
    }
}

/// A single card. `kind` is empty when only the name is known, e.g. an
/// active card rebuilt from its stored name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CardRepr")]
pub struct Card {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Card {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: String::new(),
        }
    }
}

impl From<CardKind> for Card {
    fn from(kind: CardKind) -> Self {
        Self {
            name: kind.label().to_string(),
            kind: kind.slug().to_string(),
        }
    }
}

/// Accepts both `{"name": .., "type": ..}` and a bare name string.
#[derive(Deserialize)]
#[serde(untagged)]
enum CardRepr {
    Name(String),
    Full {
        name: String,
        #[serde(rename = "type", default)]
        kind: String,
    },
}

impl From<CardRepr> for Card {
    fn from(repr: CardRepr) -> Self {
        match repr {
            CardRepr::Name(name) => Card::named(name),
            CardRepr::Full { name, kind } => Card { name, kind },
        }
    }
}

/// Draws `DECK_SIZE` cards independently and uniformly from the catalog.
pub fn generate_random_cards<R: Rng>(rng: &mut R) -> Vec<Card> {
    (0..DECK_SIZE)
        .map(|_| Card::from(CardKind::ALL[rng.gen_range(0..CardKind::ALL.len())]))
        .collect()
}
