use rand::{CryptoRng, Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::CommandError;

/// Player identifier as handed to the engine by the room service.
pub type GamerId = i64;

/// Meld identifier, unique within a session.
pub type MeldId = u32;

/// Stable card identifier in `0..52`.
pub type CardId = u8;

pub const DECK_SIZE: usize = 52;

pub const SPETO_POINTS: i32 = 50;
pub const ACE_POINTS: i32 = 15;
pub const FACE_POINTS: i32 = 10;
pub const PIP_POINTS: i32 = 5;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Club,
    Diamond,
    Heart,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Club, Suit::Diamond, Suit::Heart, Suit::Spade];

    const fn index(self) -> u8 {
        match self {
            Self::Club => 0,
            Self::Diamond => 1,
            Self::Heart => 2,
            Self::Spade => 3,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Diamond => "♦",
            Self::Heart => "♥",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card rank. Ace is 1 (always low), king is 13.
pub type Rank = u8;

pub const ACE: Rank = 1;
pub const JACK: Rank = 11;
pub const QUEEN: Rank = 12;
pub const KING: Rank = 13;

/// A card is a tuple of a rank (ace=1u8 ... king=13u8) and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Rank, pub Suit);

impl Card {
    #[must_use]
    pub const fn id(self) -> CardId {
        self.1.index() * 13 + (self.0 - 1)
    }

    #[must_use]
    pub fn from_id(id: CardId) -> Option<Self> {
        if usize::from(id) >= DECK_SIZE {
            return None;
        }
        let suit = Suit::ALL[usize::from(id / 13)];
        Some(Self(id % 13 + 1, suit))
    }

    #[must_use]
    pub const fn rank(self) -> Rank {
        self.0
    }

    #[must_use]
    pub const fn suit(self) -> Suit {
        self.1
    }

    /// 2♣ and Q♠ are the speto cards.
    #[must_use]
    pub const fn is_speto(self) -> bool {
        matches!(self, Card(2, Suit::Club) | Card(QUEEN, Suit::Spade))
    }

    /// Point value used for melds, deposits and deadwood.
    #[must_use]
    pub const fn points(self) -> i32 {
        if self.is_speto() {
            return SPETO_POINTS;
        }
        match self.0 {
            ACE => ACE_POINTS,
            10..=KING => FACE_POINTS,
            _ => PIP_POINTS,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = match self.0 {
            ACE => "A",
            JACK => "J",
            QUEEN => "Q",
            KING => "K",
            v => &v.to_string(),
        };
        write!(f, "{rank}{}", self.1)
    }
}

/// Sum of point values.
#[must_use]
pub fn total_points(cards: &[Card]) -> i32 {
    cards.iter().map(|c| c.points()).sum()
}

/// Where a card currently lives. Every card has exactly one location.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "at", rename_all = "snake_case")]
pub enum Location {
    Deck,
    Discard,
    Hand { owner: GamerId },
    Meld { meld_id: MeldId },
}

/// Undealt cards. The last element is the top of the deck.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Default for Deck {
    fn default() -> Self {
        let cards = Suit::ALL
            .into_iter()
            .flat_map(|suit| (ACE..=KING).map(move |rank| Card(rank, suit)))
            .collect();
        Self { cards }
    }
}

impl Deck {
    /// Rebuilds a deck from a recorded order (bottom first).
    pub fn from_order(order: &[CardId]) -> Result<Self, CommandError> {
        let mut seen = [false; DECK_SIZE];
        let mut cards = Vec::with_capacity(order.len());
        for &id in order {
            let card = Card::from_id(id).ok_or_else(|| {
                CommandError::InvariantViolation(format!("unknown card id {id} in deck order"))
            })?;
            if std::mem::replace(&mut seen[usize::from(id)], true) {
                return Err(CommandError::InvariantViolation(format!(
                    "card {card} appears twice in deck order"
                )));
            }
            cards.push(card);
        }
        Ok(Self { cards })
    }

    /// Fisher-Yates shuffle. Only unpredictable generators are accepted.
    pub fn shuffle<R: Rng + CryptoRng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    #[must_use]
    pub fn shuffled<R: Rng + CryptoRng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::default();
        deck.shuffle(rng);
        deck
    }

    pub fn draw(&mut self) -> Result<Card, CommandError> {
        self.cards.pop().ok_or(CommandError::DeckEmpty)
    }

    #[must_use]
    pub fn order(&self) -> Vec<CardId> {
        self.cards.iter().map(|c| c.id()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

/// Discard pile. Only the top card (the "head") may be picked up.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct DiscardPile {
    cards: Vec<Card>,
}

impl DiscardPile {
    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[must_use]
    pub fn top(&self) -> Option<Card> {
        self.cards.last().copied()
    }

    /// Takes the head card. Callers must meld it within the same command.
    pub fn take_top(&mut self) -> Result<Card, CommandError> {
        self.cards.pop().ok_or(CommandError::DiscardPileEmpty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}
