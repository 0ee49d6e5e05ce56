use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    cards::{Card, GamerId, MeldId, Suit},
    errors::CommandError,
    rules,
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeldKind {
    /// Same rank, distinct suits.
    Set,
    /// Same suit, consecutive ranks, ace low.
    Run,
}

/// A group of cards laid on the table.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Meld {
    pub id: MeldId,
    pub kind: MeldKind,
    /// Runs are kept in ascending rank order.
    pub cards: Vec<Card>,
    pub owner: GamerId,
    /// Formed with the discard pile's head card.
    pub created_from_head: bool,
    pub includes_speto: bool,
    /// Owner plus everyone who deposited into the meld.
    pub contributors: BTreeSet<GamerId>,
}

impl Meld {
    /// The meld's suit if every card shares one.
    #[must_use]
    pub fn single_suit(&self) -> Option<Suit> {
        let first = self.cards.first()?.suit();
        self.cards.iter().all(|c| c.suit() == first).then_some(first)
    }

    #[must_use]
    pub fn points(&self) -> i32 {
        super::cards::total_points(&self.cards)
    }
}

/// Every meld on the table, keyed by id.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct MeldTable {
    melds: BTreeMap<MeldId, Meld>,
    next_id: MeldId,
}

impl MeldTable {
    /// Validates and stores a new meld, returning its id.
    pub fn add_meld(
        &mut self,
        owner: GamerId,
        mut cards: Vec<Card>,
        created_from_head: bool,
    ) -> Result<MeldId, CommandError> {
        let kind = rules::classify_meld(&cards).ok_or(CommandError::InvalidMeld)?;
        if kind == MeldKind::Run {
            cards.sort_by_key(|c| c.rank());
        }
        self.next_id += 1;
        let id = self.next_id;
        self.melds.insert(
            id,
            Meld {
                id,
                kind,
                includes_speto: cards.iter().any(|c| c.is_speto()),
                cards,
                owner,
                created_from_head,
                contributors: BTreeSet::from([owner]),
            },
        );
        Ok(id)
    }

    /// Lays cards off onto any meld on the table. The meld keeps its kind.
    pub fn deposit_cards(
        &mut self,
        meld_id: MeldId,
        cards: &[Card],
        depositor: GamerId,
    ) -> Result<&Meld, CommandError> {
        let meld = self
            .melds
            .get_mut(&meld_id)
            .ok_or(CommandError::MeldNotFound(meld_id))?;
        if !rules::can_extend(meld, cards) {
            return Err(CommandError::InvalidMeld);
        }
        meld.cards.extend_from_slice(cards);
        if meld.kind == MeldKind::Run {
            meld.cards.sort_by_key(|c| c.rank());
        }
        meld.includes_speto |= cards.iter().any(|c| c.is_speto());
        meld.contributors.insert(depositor);
        Ok(meld)
    }

    #[must_use]
    pub fn get(&self, meld_id: MeldId) -> Option<&Meld> {
        self.melds.get(&meld_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Meld> {
        self.melds.values()
    }

    pub fn owned_by(&self, owner: GamerId) -> impl Iterator<Item = &Meld> {
        self.melds.values().filter(move |m| m.owner == owner)
    }

    pub fn contributed_by(&self, gamer: GamerId) -> impl Iterator<Item = &Meld> {
        self.melds
            .values()
            .filter(move |m| m.contributors.contains(&gamer))
    }

    /// Whether `card` could be laid off onto some meld on the table.
    #[must_use]
    pub fn accepts(&self, card: Card) -> bool {
        self.melds.values().any(|m| rules::can_extend(m, &[card]))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.melds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.melds.is_empty()
    }
}
