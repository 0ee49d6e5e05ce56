//! Authoritative state of one Dummy match.
//!
//! Commands are applied to a scratch copy of the session, the copy is checked
//! for card conservation, and only then swapped in. A rejected command leaves
//! the session exactly as it was.

use chrono::{DateTime, Utc};
use rand::{CryptoRng, Rng};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};
use uuid::Uuid;

use super::{
    cards::{Card, CardId, DECK_SIZE, Deck, DiscardPile, GamerId, Location, MeldId},
    errors::CommandError,
    hand::{Hand, compute_deadwood},
    melds::MeldTable,
    rules::{classify_deposit_bonus, classify_meld_bonus},
    scoring::{
        DISCARD_PENALTY, EventStamp, GameResult, KnockKind, PlayerTotals, ScoreEvent,
        ScoreEventKind, Standing, WinningType, aggregate, deck_exhaustion_events,
        dummy_finish_winner, knock_events,
    },
    turn::{ActionClass, TurnCoordinator, TurnPhase},
};

pub type SessionId = Uuid;

pub const DEFAULT_CARDS_PER_PLAYER: usize = 7;
pub const DEFAULT_KNOCK_THRESHOLD: i32 = 0;
pub const MIN_PLAYERS: usize = 2;

/// Per-session rule knobs.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameRules {
    pub cards_per_player: usize,
    /// Highest deadwood a player may knock with. 0 means a full "out".
    pub knock_threshold: i32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            cards_per_player: DEFAULT_CARDS_PER_PLAYER,
            knock_threshold: DEFAULT_KNOCK_THRESHOLD,
        }
    }
}

/// How the head card is put to use in the command that picks it up.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "use", rename_all = "snake_case")]
pub enum HeadPlay {
    /// New meld from the head card plus these hand cards.
    Meld { card_ids: Vec<CardId> },
    /// Lay the head card, plus these hand cards, off onto a meld.
    Layoff { meld_id: MeldId, card_ids: Vec<CardId> },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    DrawFromDeck,
    DrawFromDiscard { play: HeadPlay },
    Meld { card_ids: Vec<CardId> },
    Layoff { meld_id: MeldId, card_ids: Vec<CardId> },
    Discard { card_id: CardId },
    /// Optionally discards one last card before settling.
    Knock { discard: Option<CardId> },
}

impl Action {
    #[must_use]
    pub fn class(&self) -> ActionClass {
        match self {
            Self::DrawFromDeck => ActionClass::DrawFromDeck,
            Self::DrawFromDiscard { .. } => ActionClass::DrawFromDiscard,
            Self::Meld { .. } => ActionClass::Meld,
            Self::Layoff { .. } => ActionClass::Layoff,
            Self::Discard { .. } => ActionClass::Discard,
            Self::Knock { .. } => ActionClass::Knock,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DrawFromDeck => write!(f, "draws from the deck"),
            Self::DrawFromDiscard { play } => match play {
                HeadPlay::Meld { card_ids } => {
                    write!(f, "takes the head and melds it with {card_ids:?}")
                }
                HeadPlay::Layoff { meld_id, .. } => {
                    write!(f, "takes the head and lays it off on meld {meld_id}")
                }
            },
            Self::Meld { card_ids } => write!(f, "melds {card_ids:?}"),
            Self::Layoff { meld_id, card_ids } => {
                write!(f, "lays {card_ids:?} off on meld {meld_id}")
            }
            Self::Discard { card_id } => write!(f, "discards card {card_id}"),
            Self::Knock { .. } => write!(f, "knocks"),
        }
    }
}

/// A player command. `expected_version` is the last version the caller saw.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Command {
    pub gamer_id: GamerId,
    pub expected_version: u64,
    pub action: Action,
}

/// One committed move, as appended to the move log.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct MoveRecord {
    pub move_number: u64,
    pub gamer_id: GamerId,
    pub action: Action,
    /// Issued by the turn timer rather than the player.
    pub forced: bool,
    pub at: DateTime<Utc>,
}

/// Outcome of a committed command.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Applied {
    pub version: u64,
    pub record: MoveRecord,
    pub events: Vec<ScoreEvent>,
    /// Set when this command settled the session.
    pub result: Option<GameResult>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    Finished,
    /// Invariant violated; needs manual reconciliation.
    Errored { reason: String },
}

/// Everything needed to recreate a session's initial deal.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SessionStart {
    pub session_id: SessionId,
    pub room_id: String,
    pub players: Vec<GamerId>,
    pub rules: GameRules,
    /// Shuffled deck, bottom first.
    pub deck_order: Vec<CardId>,
    pub started_at: DateTime<Utc>,
}

impl SessionStart {
    pub fn shuffled<R: Rng + CryptoRng + ?Sized>(
        room_id: &str,
        players: Vec<GamerId>,
        rules: GameRules,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            room_id: room_id.to_string(),
            players,
            rules,
            deck_order: Deck::shuffled(rng).order(),
            started_at: now,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct Seat {
    gamer_id: GamerId,
    hand: Hand,
    /// Turn number of the first meld or layoff by this player.
    first_placed_turn: Option<u64>,
}

/// The most recent discard, kept until the next player draws.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
struct DiscardMark {
    card: Card,
    by: GamerId,
    /// Whether the card could have been laid off when it was discarded.
    layable: bool,
}

#[derive(Clone, Debug)]
pub struct GameSession {
    id: SessionId,
    room_id: String,
    rules: GameRules,
    seats: Vec<Seat>,
    turns: TurnCoordinator,
    deck: Deck,
    discard: DiscardPile,
    melds: MeldTable,
    status: SessionStatus,
    winner_id: Option<GamerId>,
    winning_type: Option<WinningType>,
    version: u64,
    score_log: Vec<ScoreEvent>,
    last_discard: Option<DiscardMark>,
    /// Discarder whose card the current player picked up this turn.
    exploited: Option<(GamerId, Card)>,
    result: Option<GameResult>,
}

impl GameSession {
    /// Deals the recorded deck: `cards_per_player` round-robin in seat order,
    /// then one card face up to seed the discard pile.
    pub fn start(start: &SessionStart) -> Result<Self, CommandError> {
        validate_players(&start.players, &start.rules)?;
        let mut deck = Deck::from_order(&start.deck_order)?;
        if deck.len() != DECK_SIZE {
            return Err(CommandError::InvariantViolation(format!(
                "deck order has {} cards",
                deck.len()
            )));
        }

        let mut seats: Vec<Seat> = start
            .players
            .iter()
            .map(|&gamer_id| Seat {
                gamer_id,
                hand: Hand::default(),
                first_placed_turn: None,
            })
            .collect();
        for _ in 0..start.rules.cards_per_player {
            for seat in &mut seats {
                seat.hand.add_cards([deck.draw()?]);
            }
        }
        let mut discard = DiscardPile::default();
        discard.push(deck.draw()?);

        let session = Self {
            id: start.session_id,
            room_id: start.room_id.clone(),
            rules: start.rules.clone(),
            seats,
            turns: TurnCoordinator::new(start.players.clone(), start.started_at),
            deck,
            discard,
            melds: MeldTable::default(),
            status: SessionStatus::Active,
            winner_id: None,
            winning_type: None,
            version: 0,
            score_log: Vec::new(),
            last_discard: None,
            exploited: None,
            result: None,
        };
        session.check_invariants()?;
        Ok(session)
    }

    /// Applies a player command, or rejects it without touching the session.
    pub fn execute(&mut self, command: Command, now: DateTime<Utc>) -> Result<Applied, CommandError> {
        self.ensure_active()?;
        if command.expected_version != self.version {
            return Err(CommandError::StaleMoveVersion {
                expected: command.expected_version,
                current: self.version,
            });
        }
        self.commit(command.gamer_id, command.action, false, now)
    }

    /// Plays the timed-out player's turn out: draw from the deck if they
    /// haven't drawn, then discard their heaviest card. Each step is its own
    /// committed move flagged `forced`.
    pub fn expire_turn(&mut self, now: DateTime<Utc>) -> Vec<Applied> {
        let mut applied = Vec::new();
        if !self.is_active() {
            return applied;
        }
        let gamer = self.turns.current_gamer();
        while self.is_active() && self.turns.current_gamer() == gamer {
            let action = match self.turns.phase() {
                TurnPhase::AwaitingDraw(_) => Action::DrawFromDeck,
                TurnPhase::AwaitingMeldOrDiscard(_) => {
                    match self.hand(gamer).and_then(Hand::heaviest_card) {
                        Some(card) => Action::Discard { card_id: card.id() },
                        // Melded out without discarding; nothing left to hold.
                        None => Action::Knock { discard: None },
                    }
                }
                TurnPhase::TurnComplete(_) => break,
            };
            log::warn!("Session {}: gamer {} timed out, forcing: {}", self.id, gamer, action);
            match self.commit(gamer, action, true, now) {
                Ok(step) => applied.push(step),
                Err(e) => {
                    log::error!("Session {}: forced move rejected: {}", self.id, e);
                    break;
                }
            }
        }
        applied
    }

    /// Re-applies a move from the log with its original timestamp and
    /// `forced` flag. Version checks are the caller's job.
    pub fn apply_recorded(&mut self, record: &MoveRecord) -> Result<Applied, CommandError> {
        self.ensure_active()?;
        self.commit(record.gamer_id, record.action.clone(), record.forced, record.at)
    }

    fn commit(
        &mut self,
        gamer: GamerId,
        action: Action,
        forced: bool,
        now: DateTime<Utc>,
    ) -> Result<Applied, CommandError> {
        let mut next = self.clone();
        let outcome = next
            .apply(gamer, action, forced, now)
            .and_then(|applied| next.check_invariants().map(|()| applied));
        match outcome {
            Ok(applied) => {
                *self = next;
                log::debug!(
                    "Session {} move {}: gamer {} {} ({} events)",
                    self.id,
                    applied.version,
                    gamer,
                    applied.record.action,
                    applied.events.len()
                );
                Ok(applied)
            }
            Err(e) if e.is_fatal() => {
                log::error!("Session {} marked errored: {}", self.id, e);
                self.status = SessionStatus::Errored {
                    reason: e.to_string(),
                };
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    fn apply(
        &mut self,
        gamer: GamerId,
        action: Action,
        forced: bool,
        now: DateTime<Utc>,
    ) -> Result<Applied, CommandError> {
        self.turns.authorize(gamer, action.class())?;
        let stamp = EventStamp {
            move_number: self.version + 1,
            timestamp: now,
        };
        let mut events = Vec::new();

        match &action {
            Action::DrawFromDeck => match self.deck.draw() {
                Ok(card) => {
                    self.seat_mut(gamer)?.hand.add_cards([card]);
                    self.last_discard = None;
                    self.turns.record(ActionClass::DrawFromDeck);
                }
                Err(CommandError::DeckEmpty) => self.settle_deck_exhaustion(stamp, &mut events),
                Err(e) => return Err(e),
            },
            Action::DrawFromDiscard { play } => self.take_head(gamer, play, stamp, &mut events)?,
            Action::Meld { card_ids } => {
                let cards = self.seat_mut(gamer)?.hand.remove_cards(card_ids)?;
                self.place_meld(gamer, cards, None, stamp, &mut events)?;
                self.turns.record(ActionClass::Meld);
            }
            Action::Layoff { meld_id, card_ids } => {
                let cards = self.seat_mut(gamer)?.hand.remove_cards(card_ids)?;
                self.place_layoff(gamer, *meld_id, cards, stamp, &mut events)?;
                self.turns.record(ActionClass::Layoff);
            }
            Action::Discard { card_id } => {
                self.discard_card(gamer, *card_id)?;
                self.turns.record(ActionClass::Discard);
                if self.hand(gamer).is_some_and(Hand::is_empty) {
                    self.settle_knock(gamer, stamp, &mut events);
                } else {
                    self.exploited = None;
                    self.turns.advance(now)?;
                }
            }
            Action::Knock { discard } => {
                if let Some(card_id) = discard {
                    self.discard_card(gamer, *card_id)?;
                }
                let deadwood = self.deadwood_of(gamer)?;
                if deadwood > self.rules.knock_threshold {
                    return Err(CommandError::KnockDeadwoodExceedsThreshold {
                        deadwood,
                        threshold: self.rules.knock_threshold,
                    });
                }
                self.turns.record(ActionClass::Knock);
                self.settle_knock(gamer, stamp, &mut events);
            }
        }

        self.version = stamp.move_number;
        self.score_log.extend(events.iter().cloned());
        Ok(Applied {
            version: self.version,
            record: MoveRecord {
                move_number: stamp.move_number,
                gamer_id: gamer,
                action,
                forced,
                at: now,
            },
            events,
            result: self.result.clone(),
        })
    }

    /// Picks up the head card and melds or lays it off in the same step.
    fn take_head(
        &mut self,
        gamer: GamerId,
        play: &HeadPlay,
        stamp: EventStamp,
        events: &mut Vec<ScoreEvent>,
    ) -> Result<(), CommandError> {
        let head = self.discard.top().ok_or(CommandError::DiscardPileEmpty)?;
        let hand_ids = match play {
            HeadPlay::Meld { card_ids } | HeadPlay::Layoff { card_ids, .. } => card_ids,
        };
        let mut cards = self.seat_mut(gamer)?.hand.remove_cards(hand_ids)?;
        self.discard.take_top()?;
        cards.push(head);

        let meld_id = match play {
            HeadPlay::Meld { .. } => self.place_meld(gamer, cards, Some(head), stamp, events)?,
            HeadPlay::Layoff { meld_id, .. } => {
                self.place_layoff(gamer, *meld_id, cards, stamp, events)?;
                *meld_id
            }
        };

        if let Some(mark) = self.last_discard.take()
            && mark.card == head
            && mark.by != gamer
        {
            let kind = if head.is_speto() {
                ScoreEventKind::SpeToTarget
            } else {
                match play {
                    HeadPlay::Meld { .. } => ScoreEventKind::HeadDiscard,
                    HeadPlay::Layoff { .. } if mark.layable => ScoreEventKind::FoolishDiscard,
                    HeadPlay::Layoff { .. } => ScoreEventKind::FullDiscard,
                }
            };
            events.push(
                ScoreEvent::new(mark.by, kind, DISCARD_PENALTY, stamp)
                    .with_meld(meld_id)
                    .with_cards(&[head]),
            );
            self.exploited = Some((mark.by, head));
        }
        self.turns.record(ActionClass::DrawFromDiscard);
        Ok(())
    }

    fn place_meld(
        &mut self,
        gamer: GamerId,
        cards: Vec<Card>,
        head: Option<Card>,
        stamp: EventStamp,
        events: &mut Vec<ScoreEvent>,
    ) -> Result<MeldId, CommandError> {
        let meld_id = self.melds.add_meld(gamer, cards, head.is_some())?;
        let meld = self
            .melds
            .get(meld_id)
            .ok_or(CommandError::MeldNotFound(meld_id))?;
        let bonus = classify_meld_bonus(meld, head.is_some_and(Card::is_speto));

        events.push(
            ScoreEvent::new(gamer, ScoreEventKind::MeldPoints, bonus.base, stamp)
                .with_meld(meld_id)
                .with_cards(&meld.cards),
        );
        if let Some(head) = head {
            events.push(
                ScoreEvent::new(gamer, ScoreEventKind::HeadBonus, bonus.head, stamp)
                    .with_meld(meld_id)
                    .with_cards(&[head]),
            );
        }
        if bonus.speto > 0 {
            let spetos: Vec<Card> = meld.cards.iter().copied().filter(|c| c.is_speto()).collect();
            events.push(
                ScoreEvent::new(gamer, ScoreEventKind::SpetoMeldBonus, bonus.speto, stamp)
                    .with_meld(meld_id)
                    .with_cards(&spetos),
            );
        }
        self.mark_placed(gamer)?;
        Ok(meld_id)
    }

    fn place_layoff(
        &mut self,
        gamer: GamerId,
        meld_id: MeldId,
        cards: Vec<Card>,
        stamp: EventStamp,
        events: &mut Vec<ScoreEvent>,
    ) -> Result<(), CommandError> {
        self.melds.deposit_cards(meld_id, &cards, gamer)?;
        let bonus = classify_deposit_bonus(&cards);
        let (spetos, plain): (Vec<Card>, Vec<Card>) =
            cards.iter().copied().partition(|c| c.is_speto());

        events.push(
            ScoreEvent::new(gamer, ScoreEventKind::MeldPoints, bonus.base, stamp)
                .with_meld(meld_id)
                .with_cards(&cards),
        );
        if bonus.deposit > 0 {
            events.push(
                ScoreEvent::new(gamer, ScoreEventKind::DepositBonus, bonus.deposit, stamp)
                    .with_meld(meld_id)
                    .with_cards(&plain),
            );
        }
        if bonus.speto > 0 {
            events.push(
                ScoreEvent::new(gamer, ScoreEventKind::SpetoDepositBonus, bonus.speto, stamp)
                    .with_meld(meld_id)
                    .with_cards(&spetos),
            );
        }
        self.mark_placed(gamer)
    }

    fn discard_card(&mut self, gamer: GamerId, card_id: CardId) -> Result<(), CommandError> {
        let card = self
            .seat_mut(gamer)?
            .hand
            .remove_cards(&[card_id])?
            .into_iter()
            .next()
            .ok_or(CommandError::CardNotInHand(card_id))?;
        self.last_discard = Some(DiscardMark {
            card,
            by: gamer,
            layable: self.melds.accepts(card),
        });
        self.discard.push(card);
        Ok(())
    }

    fn mark_placed(&mut self, gamer: GamerId) -> Result<(), CommandError> {
        let turn = self.turns.turn_number();
        self.seat_mut(gamer)?.first_placed_turn.get_or_insert(turn);
        Ok(())
    }

    fn settle_knock(&mut self, knocker: GamerId, stamp: EventStamp, events: &mut Vec<ScoreEvent>) {
        let turn = self.turns.turn_number();
        let dark = self
            .seat(knocker)
            .is_some_and(|s| s.first_placed_turn.is_none_or(|t| t == turn));
        let kind = KnockKind::classify(dark, self.is_color_knock(knocker));

        if let Some((discarder, card)) = self.exploited.take() {
            events.push(
                ScoreEvent::new(discarder, ScoreEventKind::DummyDiscard, DISCARD_PENALTY, stamp)
                    .with_cards(&[card]),
            );
        }
        events.extend(knock_events(knocker, kind, &self.standings(), stamp));
        log::info!(
            "Session {}: gamer {} knocked ({:?}, x{})",
            self.id,
            knocker,
            kind,
            kind.multiplier()
        );
        self.finish(Some(knocker), kind.winning_type(), stamp, events);
    }

    fn settle_deck_exhaustion(&mut self, stamp: EventStamp, events: &mut Vec<ScoreEvent>) {
        let standings = self.standings();
        let accrued = aggregate(self.score_log.iter().chain(events.iter()));
        let winner = dummy_finish_winner(&standings, &accrued);
        events.extend(deck_exhaustion_events(&standings, stamp));
        log::info!("Session {}: deck exhausted, winner {:?}", self.id, winner);
        self.finish(winner, WinningType::DummyFinish, stamp, events);
    }

    fn finish(
        &mut self,
        winner: Option<GamerId>,
        winning_type: WinningType,
        stamp: EventStamp,
        events: &[ScoreEvent],
    ) {
        let all_events: Vec<ScoreEvent> = self.score_log.iter().chain(events).cloned().collect();
        let remaining: Vec<(GamerId, Vec<Card>)> = self
            .seats
            .iter()
            .map(|s| (s.gamer_id, s.hand.to_vec()))
            .collect();
        self.result = Some(GameResult::summarize(
            self.id,
            &self.room_id,
            winner,
            winning_type,
            stamp,
            &remaining,
            &all_events,
        ));
        self.status = SessionStatus::Finished;
        self.winner_id = winner;
        self.winning_type = Some(winning_type);
    }

    /// Every meld the gamer contributed to is single-suit, all in one suit.
    fn is_color_knock(&self, gamer: GamerId) -> bool {
        let suits: BTreeSet<_> = self
            .melds
            .contributed_by(gamer)
            .map(|m| m.single_suit())
            .collect();
        suits.len() == 1 && suits.iter().all(Option::is_some)
    }

    fn standings(&self) -> Vec<Standing> {
        self.seats
            .iter()
            .map(|s| Standing {
                gamer_id: s.gamer_id,
                deadwood: compute_deadwood(&s.hand, &self.melds, s.gamer_id),
                never_melded: s.first_placed_turn.is_none(),
            })
            .collect()
    }

    /// Card conservation, single actor and settlement conservation.
    pub fn check_invariants(&self) -> Result<(), CommandError> {
        let mut seen = [false; DECK_SIZE];
        let mut mark = |card: &Card, at: Location| {
            if std::mem::replace(&mut seen[usize::from(card.id())], true) {
                return Err(CommandError::InvariantViolation(format!(
                    "card {card} found twice (again at {at:?})"
                )));
            }
            Ok(())
        };
        for card in self.deck.cards() {
            mark(card, Location::Deck)?;
        }
        for card in self.discard.cards() {
            mark(card, Location::Discard)?;
        }
        for seat in &self.seats {
            for card in seat.hand.cards() {
                mark(card, Location::Hand { owner: seat.gamer_id })?;
            }
        }
        for meld in self.melds.iter() {
            for card in &meld.cards {
                mark(card, Location::Meld { meld_id: meld.id })?;
            }
        }
        if let Some(missing) = seen.iter().position(|s| !s) {
            return Err(CommandError::InvariantViolation(format!(
                "card id {missing} has no location"
            )));
        }

        if self.turns.seat_of(self.turns.current_gamer()).is_none() {
            return Err(CommandError::InvariantViolation(
                "current actor is not seated".to_string(),
            ));
        }

        if let Some(result) = &self.result {
            let totals = self.totals();
            for summary in &result.players {
                let expected = totals.get(&summary.gamer_id).map_or(0, PlayerTotals::total);
                if summary.total_points != expected {
                    return Err(CommandError::InvariantViolation(format!(
                        "gamer {} settled at {} but events sum to {}",
                        summary.gamer_id, summary.total_points, expected
                    )));
                }
            }
        }
        Ok(())
    }

    /// Where a card currently is.
    #[must_use]
    pub fn locate(&self, card_id: CardId) -> Option<Location> {
        if self.deck.cards().any(|c| c.id() == card_id) {
            return Some(Location::Deck);
        }
        if self.discard.cards().any(|c| c.id() == card_id) {
            return Some(Location::Discard);
        }
        if let Some(seat) = self.seats.iter().find(|s| s.hand.contains(card_id)) {
            return Some(Location::Hand {
                owner: seat.gamer_id,
            });
        }
        self.melds
            .iter()
            .find(|m| m.cards.iter().any(|c| c.id() == card_id))
            .map(|m| Location::Meld { meld_id: m.id })
    }

    fn ensure_active(&self) -> Result<(), CommandError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(CommandError::SessionNotActive)
        }
    }

    fn seat(&self, gamer: GamerId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.gamer_id == gamer)
    }

    fn seat_mut(&mut self, gamer: GamerId) -> Result<&mut Seat, CommandError> {
        self.seats
            .iter_mut()
            .find(|s| s.gamer_id == gamer)
            .ok_or(CommandError::UnknownGamer(gamer))
    }

    pub fn deadwood_of(&self, gamer: GamerId) -> Result<i32, CommandError> {
        let seat = self.seat(gamer).ok_or(CommandError::UnknownGamer(gamer))?;
        Ok(compute_deadwood(&seat.hand, &self.melds, gamer))
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Flag the session for reconciliation. Commands are refused from here on.
    pub fn mark_errored(&mut self, reason: impl Into<String>) {
        let reason = reason.into();
        log::error!("Session {} marked errored: {}", self.id, reason);
        self.status = SessionStatus::Errored { reason };
    }

    #[must_use]
    pub fn players(&self) -> &[GamerId] {
        self.turns.seats()
    }

    #[must_use]
    pub fn turns(&self) -> &TurnCoordinator {
        &self.turns
    }

    #[must_use]
    pub fn current_turn_gamer_id(&self) -> GamerId {
        self.turns.current_gamer()
    }

    #[must_use]
    pub fn hand(&self, gamer: GamerId) -> Option<&Hand> {
        self.seat(gamer).map(|s| &s.hand)
    }

    #[must_use]
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub fn discard_pile(&self) -> &DiscardPile {
        &self.discard
    }

    #[must_use]
    pub fn melds(&self) -> &MeldTable {
        &self.melds
    }

    #[must_use]
    pub fn winner_id(&self) -> Option<GamerId> {
        self.winner_id
    }

    #[must_use]
    pub fn winning_type(&self) -> Option<WinningType> {
        self.winning_type
    }

    #[must_use]
    pub fn score_events(&self) -> &[ScoreEvent] {
        &self.score_log
    }

    #[must_use]
    pub fn totals(&self) -> std::collections::BTreeMap<GamerId, PlayerTotals> {
        aggregate(&self.score_log)
    }

    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.result.as_ref()
    }
}

fn validate_players(players: &[GamerId], rules: &GameRules) -> Result<(), CommandError> {
    if players.len() < MIN_PLAYERS {
        return Err(CommandError::InvalidPlayers(format!(
            "need {MIN_PLAYERS}+ players, got {}",
            players.len()
        )));
    }
    let distinct: BTreeSet<_> = players.iter().collect();
    if distinct.len() != players.len() {
        return Err(CommandError::InvalidPlayers("duplicate gamer id".to_string()));
    }
    if rules.cards_per_player == 0 || players.len() * rules.cards_per_player + 1 > DECK_SIZE {
        return Err(CommandError::InvalidPlayers(format!(
            "can't deal {} cards to {} players",
            rules.cards_per_player,
            players.len()
        )));
    }
    Ok(())
}
