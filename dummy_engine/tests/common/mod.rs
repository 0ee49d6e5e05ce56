//! Shared helpers for the integration tests: rigged deals and move shortcuts.

#![allow(dead_code)]

use chrono::Utc;
use dummy_engine::game::{
    Action, Applied, Card, CardId, Command, CommandError, GameRules, GameSession, GamerId,
    ScoreEvent, ScoreEventKind, SessionStart,
    cards::DECK_SIZE,
};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Start record whose deal is fixed: `hands[seat]` go to players `1..=n`,
/// `head` seeds the discard pile and `draws` come off the deck in order.
/// Every other card sits below them.
pub fn rigged_start(hands: &[Vec<Card>], head: Card, draws: &[Card]) -> SessionStart {
    let per_player = hands[0].len();
    assert!(hands.iter().all(|h| h.len() == per_player));

    let mut sequence: Vec<Card> = Vec::new();
    for round in 0..per_player {
        sequence.extend(hands.iter().map(|hand| hand[round]));
    }
    sequence.push(head);
    sequence.extend_from_slice(draws);

    let used: BTreeSet<CardId> = sequence.iter().map(|c| c.id()).collect();
    assert_eq!(used.len(), sequence.len(), "rigged deal repeats a card");

    let mut deck_order: Vec<CardId> = (0..DECK_SIZE as CardId)
        .filter(|id| !used.contains(id))
        .collect();
    deck_order.extend(sequence.iter().rev().map(|c| c.id()));

    SessionStart {
        session_id: Uuid::new_v4(),
        room_id: "rigged".to_string(),
        players: (1..=hands.len() as GamerId).collect(),
        rules: GameRules {
            cards_per_player: per_player,
            ..GameRules::default()
        },
        deck_order,
        started_at: Utc::now(),
    }
}

pub fn ids(cards: &[Card]) -> Vec<CardId> {
    cards.iter().map(|c| c.id()).collect()
}

/// Executes against the session's current version.
pub fn play(session: &mut GameSession, gamer: GamerId, action: Action) -> Result<Applied, CommandError> {
    let command = Command {
        gamer_id: gamer,
        expected_version: session.version(),
        action,
    };
    session.execute(command, Utc::now())
}

pub fn draw(session: &mut GameSession, gamer: GamerId) -> Applied {
    play(session, gamer, Action::DrawFromDeck).unwrap()
}

pub fn discard(session: &mut GameSession, gamer: GamerId, card: Card) -> Applied {
    play(session, gamer, Action::Discard { card_id: card.id() }).unwrap()
}

/// Points of the given kind credited to `gamer` in `events`.
pub fn points(events: &[ScoreEvent], gamer: GamerId, kind: ScoreEventKind) -> Vec<i32> {
    events
        .iter()
        .filter(|e| e.gamer_id == gamer && e.event_type == kind)
        .map(|e| e.points)
        .collect()
}

/// Plays forced turns until the session settles.
pub fn run_out(session: &mut GameSession) {
    while session.is_active() {
        let applied = session.expire_turn(Utc::now());
        assert!(!applied.is_empty(), "forced turn made no progress");
    }
}
