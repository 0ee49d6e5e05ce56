//! Meld validation and bonus classification.
//!
//! Everything here is a pure function of its inputs; re-validating the cards
//! of an accepted meld always gives the same answer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{
    cards::{Card, SPETO_POINTS, total_points},
    melds::{Meld, MeldKind},
};

pub const MIN_MELD_SIZE: usize = 3;
pub const HEAD_BONUS: i32 = 50;
pub const SPETO_HEAD_BONUS: i32 = 100;
pub const SPETO_MELD_BONUS: i32 = SPETO_POINTS;
pub const DEPOSIT_BONUS: i32 = 5;
pub const SPETO_DEPOSIT_BONUS: i32 = SPETO_POINTS;

/// At least three cards of one rank, no suit repeated.
#[must_use]
pub fn is_valid_set(cards: &[Card]) -> bool {
    let Some(first) = cards.first() else {
        return false;
    };
    let suits: BTreeSet<_> = cards.iter().map(|c| c.suit()).collect();
    cards.len() >= MIN_MELD_SIZE
        && suits.len() == cards.len()
        && cards.iter().all(|c| c.rank() == first.rank())
}

/// At least three cards of one suit with strictly consecutive ranks.
/// Ace is low only; K-A-2 doesn't wrap.
#[must_use]
pub fn is_valid_run(cards: &[Card]) -> bool {
    let Some(first) = cards.first() else {
        return false;
    };
    if cards.len() < MIN_MELD_SIZE || cards.iter().any(|c| c.suit() != first.suit()) {
        return false;
    }
    let mut ranks: Vec<_> = cards.iter().map(|c| c.rank()).collect();
    ranks.sort_unstable();
    ranks.windows(2).all(|w| w[1] == w[0] + 1)
}

#[must_use]
pub fn classify_meld(cards: &[Card]) -> Option<MeldKind> {
    if is_valid_set(cards) {
        Some(MeldKind::Set)
    } else if is_valid_run(cards) {
        Some(MeldKind::Run)
    } else {
        None
    }
}

/// Whether laying `cards` off onto `meld` keeps it a valid meld of its kind.
#[must_use]
pub fn can_extend(meld: &Meld, cards: &[Card]) -> bool {
    if cards.is_empty() {
        return false;
    }
    let combined: Vec<Card> = meld.cards.iter().chain(cards).copied().collect();
    match meld.kind {
        MeldKind::Set => is_valid_set(&combined),
        MeldKind::Run => is_valid_run(&combined),
    }
}

/// Points earned by forming a new meld.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct MeldBonus {
    /// Sum of card values, speto cards included at their own value.
    pub base: i32,
    /// +50 for melding the head card, +100 if that card is a speto.
    pub head: i32,
    /// +50 per speto card in the new meld.
    pub speto: i32,
}

impl MeldBonus {
    #[must_use]
    pub fn total(&self) -> i32 {
        self.base + self.head + self.speto
    }
}

#[must_use]
pub fn classify_meld_bonus(meld: &Meld, head_was_speto: bool) -> MeldBonus {
    let head = match (meld.created_from_head, head_was_speto) {
        (false, _) => 0,
        (true, false) => HEAD_BONUS,
        (true, true) => SPETO_HEAD_BONUS,
    };
    let spetos = meld.cards.iter().filter(|c| c.is_speto()).count() as i32;
    MeldBonus {
        base: meld.points(),
        head,
        speto: spetos * SPETO_MELD_BONUS,
    }
}

/// Points earned by laying cards off onto an existing meld.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct DepositBonus {
    pub base: i32,
    /// +5 per ordinary card.
    pub deposit: i32,
    /// +50 per speto card.
    pub speto: i32,
}

impl DepositBonus {
    #[must_use]
    pub fn total(&self) -> i32 {
        self.base + self.deposit + self.speto
    }
}

#[must_use]
pub fn classify_deposit_bonus(cards: &[Card]) -> DepositBonus {
    let (spetos, plain): (Vec<&Card>, Vec<&Card>) = cards.iter().partition(|c| c.is_speto());
    DepositBonus {
        base: total_points(cards),
        deposit: plain.len() as i32 * DEPOSIT_BONUS,
        speto: spetos.len() as i32 * SPETO_DEPOSIT_BONUS,
    }
}
