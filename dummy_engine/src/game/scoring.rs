//! Scoring engine.
//!
//! Scores are an append-only log of [`ScoreEvent`]s. Totals are always derived
//! from the log by [`aggregate`] and never stored on their own.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use uuid::Uuid;

use super::cards::{Card, CardId, GamerId, MeldId};

pub const KNOCK_BONUS: i32 = 50;
pub const DISCARD_PENALTY: i32 = -50;

/// Display bucket a score event is totalled under.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreCategory {
    Meld,
    Bonus,
    Penalty,
    Hand,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreEventKind {
    /// Base card value of cards placed on the table.
    MeldPoints,
    HeadBonus,
    SpetoMeldBonus,
    SpetoDepositBonus,
    DepositBonus,
    KnockBonus,
    DarkKnockBonus,
    ColorKnockBonus,
    DarkColorKnockBonus,
    HandPenalty,
    DarkLosePenalty,
    DummyDiscard,
    HeadDiscard,
    FullDiscard,
    SpeToTarget,
    FoolishDiscard,
}

impl ScoreEventKind {
    #[must_use]
    pub fn category(self) -> ScoreCategory {
        match self {
            Self::MeldPoints => ScoreCategory::Meld,
            Self::HeadBonus
            | Self::SpetoMeldBonus
            | Self::SpetoDepositBonus
            | Self::DepositBonus
            | Self::KnockBonus
            | Self::DarkKnockBonus
            | Self::ColorKnockBonus
            | Self::DarkColorKnockBonus => ScoreCategory::Bonus,
            Self::DummyDiscard
            | Self::HeadDiscard
            | Self::FullDiscard
            | Self::SpeToTarget
            | Self::FoolishDiscard => ScoreCategory::Penalty,
            Self::HandPenalty | Self::DarkLosePenalty => ScoreCategory::Hand,
        }
    }
}

impl fmt::Display for ScoreEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::MeldPoints => "meld_points",
            Self::HeadBonus => "head_bonus",
            Self::SpetoMeldBonus => "speto_meld_bonus",
            Self::SpetoDepositBonus => "speto_deposit_bonus",
            Self::DepositBonus => "deposit_bonus",
            Self::KnockBonus => "knock_bonus",
            Self::DarkKnockBonus => "dark_knock_bonus",
            Self::ColorKnockBonus => "color_knock_bonus",
            Self::DarkColorKnockBonus => "dark_color_knock_bonus",
            Self::HandPenalty => "hand_penalty",
            Self::DarkLosePenalty => "dark_lose_penalty",
            Self::DummyDiscard => "dummy_discard",
            Self::HeadDiscard => "head_discard",
            Self::FullDiscard => "full_discard",
            Self::SpeToTarget => "spe_to_target",
            Self::FoolishDiscard => "foolish_discard",
        };
        write!(f, "{repr}")
    }
}

/// Move number and time shared by every event a command produces.
#[derive(Clone, Copy, Debug)]
pub struct EventStamp {
    pub move_number: u64,
    pub timestamp: DateTime<Utc>,
}

/// One signed point delta. Never mutated once appended.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ScoreEvent {
    pub gamer_id: GamerId,
    pub event_type: ScoreEventKind,
    pub points: i32,
    pub related_meld_id: Option<MeldId>,
    pub related_card_ids: Vec<CardId>,
    pub move_number: u64,
    pub timestamp: DateTime<Utc>,
}

impl ScoreEvent {
    #[must_use]
    pub fn new(gamer_id: GamerId, event_type: ScoreEventKind, points: i32, stamp: EventStamp) -> Self {
        Self {
            gamer_id,
            event_type,
            points,
            related_meld_id: None,
            related_card_ids: Vec::new(),
            move_number: stamp.move_number,
            timestamp: stamp.timestamp,
        }
    }

    #[must_use]
    pub fn with_meld(mut self, meld_id: MeldId) -> Self {
        self.related_meld_id = Some(meld_id);
        self
    }

    #[must_use]
    pub fn with_cards(mut self, cards: &[Card]) -> Self {
        self.related_card_ids = cards.iter().map(|c| c.id()).collect();
        self
    }
}

/// Knock variants and their bonus multipliers.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KnockKind {
    Plain,
    /// No cards placed before the knocking turn.
    Dark,
    /// Every meld the knocker contributed to is one suit.
    Color,
    DarkColor,
}

impl KnockKind {
    #[must_use]
    pub fn classify(dark: bool, color: bool) -> Self {
        match (dark, color) {
            (false, false) => Self::Plain,
            (true, false) => Self::Dark,
            (false, true) => Self::Color,
            (true, true) => Self::DarkColor,
        }
    }

    #[must_use]
    pub fn multiplier(self) -> i32 {
        match self {
            Self::Plain => 1,
            Self::Dark | Self::Color => 2,
            Self::DarkColor => 4,
        }
    }

    #[must_use]
    pub fn bonus(self) -> i32 {
        KNOCK_BONUS * self.multiplier()
    }

    #[must_use]
    pub fn event_kind(self) -> ScoreEventKind {
        match self {
            Self::Plain => ScoreEventKind::KnockBonus,
            Self::Dark => ScoreEventKind::DarkKnockBonus,
            Self::Color => ScoreEventKind::ColorKnockBonus,
            Self::DarkColor => ScoreEventKind::DarkColorKnockBonus,
        }
    }

    #[must_use]
    pub fn winning_type(self) -> WinningType {
        match self {
            Self::Plain => WinningType::Knock,
            Self::Dark => WinningType::DarkKnock,
            Self::Color => WinningType::ColorKnock,
            Self::DarkColor => WinningType::DarkColorKnock,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WinningType {
    Knock,
    DarkKnock,
    ColorKnock,
    DarkColorKnock,
    DummyFinish,
}

impl fmt::Display for WinningType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Knock => "knock",
            Self::DarkKnock => "dark_knock",
            Self::ColorKnock => "color_knock",
            Self::DarkColorKnock => "dark_color_knock",
            Self::DummyFinish => "dummy_finish",
        };
        write!(f, "{repr}")
    }
}

/// Per-player sums by category.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerTotals {
    pub meld_points: i32,
    pub bonus_points: i32,
    pub penalty_points: i32,
    pub hand_points: i32,
}

impl PlayerTotals {
    #[must_use]
    pub fn total(&self) -> i32 {
        self.meld_points + self.bonus_points + self.penalty_points + self.hand_points
    }

    fn add(&mut self, event: &ScoreEvent) {
        let bucket = match event.event_type.category() {
            ScoreCategory::Meld => &mut self.meld_points,
            ScoreCategory::Bonus => &mut self.bonus_points,
            ScoreCategory::Penalty => &mut self.penalty_points,
            ScoreCategory::Hand => &mut self.hand_points,
        };
        *bucket += event.points;
    }
}

/// Folds the event log into per-player totals. Players with no events are
/// absent from the map.
#[must_use]
pub fn aggregate<'a>(events: impl IntoIterator<Item = &'a ScoreEvent>) -> BTreeMap<GamerId, PlayerTotals> {
    events
        .into_iter()
        .fold(BTreeMap::new(), |mut totals, event| {
            totals
                .entry(event.gamer_id)
                .or_insert_with(PlayerTotals::default)
                .add(event);
            totals
        })
}

/// What settlement needs to know about one seated player.
#[derive(Clone, Debug)]
pub struct Standing {
    pub gamer_id: GamerId,
    pub deadwood: i32,
    /// Never placed a card on the table this game.
    pub never_melded: bool,
}

/// Knock bonus for the knocker, hand penalties for everyone holding cards.
/// Opponents who never melded pay double as `dark_lose_penalty`.
#[must_use]
pub fn knock_events(
    knocker: GamerId,
    kind: KnockKind,
    standings: &[Standing],
    stamp: EventStamp,
) -> Vec<ScoreEvent> {
    let mut events = vec![ScoreEvent::new(knocker, kind.event_kind(), kind.bonus(), stamp)];
    for standing in standings.iter().filter(|s| s.deadwood > 0) {
        let event = if standing.gamer_id != knocker && standing.never_melded {
            ScoreEvent::new(
                standing.gamer_id,
                ScoreEventKind::DarkLosePenalty,
                -2 * standing.deadwood,
                stamp,
            )
        } else {
            ScoreEvent::new(
                standing.gamer_id,
                ScoreEventKind::HandPenalty,
                -standing.deadwood,
                stamp,
            )
        };
        events.push(event);
    }
    events
}

/// Hand penalties when the deck runs out. No knock bonus is awarded.
#[must_use]
pub fn deck_exhaustion_events(standings: &[Standing], stamp: EventStamp) -> Vec<ScoreEvent> {
    standings
        .iter()
        .filter(|s| s.deadwood > 0)
        .map(|s| ScoreEvent::new(s.gamer_id, ScoreEventKind::HandPenalty, -s.deadwood, stamp))
        .collect()
}

/// Winner on deck exhaustion: most points accrued during play, then lower
/// deadwood, then earlier seat.
#[must_use]
pub fn dummy_finish_winner(
    standings: &[Standing],
    accrued: &BTreeMap<GamerId, PlayerTotals>,
) -> Option<GamerId> {
    standings
        .iter()
        .enumerate()
        .max_by_key(|(seat, s)| {
            let points = accrued.get(&s.gamer_id).map_or(0, PlayerTotals::total);
            (points, -s.deadwood, std::cmp::Reverse(*seat))
        })
        .map(|(_, s)| s.gamer_id)
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameResultPlayerSummary {
    pub gamer_id: GamerId,
    pub meld_points: i32,
    pub bonus_points: i32,
    pub penalty_points: i32,
    pub hand_points: i32,
    pub total_points: i32,
    pub is_winner: bool,
    pub remaining_cards: Vec<Card>,
}

/// Final outcome of a settled session, handed to leaderboard consumers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameResult {
    pub session_id: Uuid,
    pub room_id: String,
    pub winner_id: Option<GamerId>,
    pub winning_type: WinningType,
    pub move_count: u64,
    pub finished_at: DateTime<Utc>,
    pub players: Vec<GameResultPlayerSummary>,
}

impl GameResult {
    /// Builds per-player summaries from the complete event log.
    #[must_use]
    pub fn summarize(
        session_id: Uuid,
        room_id: &str,
        winner_id: Option<GamerId>,
        winning_type: WinningType,
        stamp: EventStamp,
        seats: &[(GamerId, Vec<Card>)],
        events: &[ScoreEvent],
    ) -> Self {
        let totals = aggregate(events);
        let players = seats
            .iter()
            .map(|(gamer_id, remaining)| {
                let t = totals.get(gamer_id).copied().unwrap_or_default();
                GameResultPlayerSummary {
                    gamer_id: *gamer_id,
                    meld_points: t.meld_points,
                    bonus_points: t.bonus_points,
                    penalty_points: t.penalty_points,
                    hand_points: t.hand_points,
                    total_points: t.total(),
                    is_winner: winner_id == Some(*gamer_id),
                    remaining_cards: remaining.clone(),
                }
            })
            .collect();
        Self {
            session_id,
            room_id: room_id.to_string(),
            winner_id,
            winning_type,
            move_count: stamp.move_number,
            finished_at: stamp.timestamp,
            players,
        }
    }

    #[must_use]
    pub fn summary_for(&self, gamer_id: GamerId) -> Option<&GameResultPlayerSummary> {
        self.players.iter().find(|p| p.gamer_id == gamer_id)
    }
}
