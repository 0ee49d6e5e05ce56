use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    cards::{Card, CardId, GamerId},
    errors::CommandError,
    melds::MeldTable,
};

/// Cards held by one player, keyed by id.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct Hand {
    cards: BTreeMap<CardId, Card>,
}

impl Hand {
    pub fn add_cards(&mut self, cards: impl IntoIterator<Item = Card>) {
        for card in cards {
            self.cards.insert(card.id(), card);
        }
    }

    /// Checks every id before removing any, so a failure leaves the hand
    /// untouched.
    pub fn remove_cards(&mut self, ids: &[CardId]) -> Result<Vec<Card>, CommandError> {
        let mut seen = BTreeSet::new();
        for &id in ids {
            if !self.cards.contains_key(&id) || !seen.insert(id) {
                return Err(CommandError::CardNotInHand(id));
            }
        }
        Ok(ids.iter().filter_map(|id| self.cards.remove(id)).collect())
    }

    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
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
        self.cards.values()
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<Card> {
        self.cards.values().copied().collect()
    }

    /// Highest-point card, ties broken by highest id. Used for forced discards.
    #[must_use]
    pub fn heaviest_card(&self) -> Option<Card> {
        self.cards
            .values()
            .copied()
            .max_by_key(|c| (c.points(), c.id()))
    }
}

/// Sum of the owner's hand cards that aren't referenced by any of the
/// owner's melds.
#[must_use]
pub fn compute_deadwood(hand: &Hand, melds: &MeldTable, owner: GamerId) -> i32 {
    let melded: BTreeSet<CardId> = melds
        .owned_by(owner)
        .flat_map(|meld| meld.cards.iter().map(|c| c.id()))
        .collect();
    hand.cards()
        .filter(|c| !melded.contains(&c.id()))
        .map(|c| c.points())
        .sum()
}
