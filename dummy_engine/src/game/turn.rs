//! Turn coordinator.
//!
//! Exactly one seated player may act at a time, and only with the action
//! classes their current phase permits:
//!
//! ```text
//! AwaitingDraw --draw (deck | discard+meld)--> AwaitingMeldOrDiscard
//! AwaitingMeldOrDiscard --meld | layoff--> AwaitingMeldOrDiscard
//! AwaitingMeldOrDiscard --discard--> TurnComplete --advance--> AwaitingDraw (next seat)
//! AwaitingMeldOrDiscard --knock--> session terminal
//! ```

use chrono::{DateTime, Utc};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{cards::GamerId, errors::CommandError};

/// Classes of player action the coordinator gates on.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionClass {
    DrawFromDeck,
    DrawFromDiscard,
    Meld,
    Layoff,
    Discard,
    Knock,
}

impl fmt::Display for ActionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::DrawFromDeck => "draw from the deck",
            Self::DrawFromDiscard => "draw from the discard pile",
            Self::Meld => "meld",
            Self::Layoff => "lay off",
            Self::Discard => "discard",
            Self::Knock => "knock",
        };
        write!(f, "{repr}")
    }
}

#[enum_dispatch]
pub trait PhaseRules {
    fn permits(&self, action: ActionClass) -> bool;

    fn name(&self) -> &'static str;
}

/// Waiting for the current player to draw.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AwaitingDraw;

impl PhaseRules for AwaitingDraw {
    fn permits(&self, action: ActionClass) -> bool {
        matches!(action, ActionClass::DrawFromDeck | ActionClass::DrawFromDiscard)
    }

    fn name(&self) -> &'static str {
        "awaiting draw"
    }
}

/// The current player has drawn and may meld, lay off, discard or knock.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct AwaitingMeldOrDiscard;

impl PhaseRules for AwaitingMeldOrDiscard {
    fn permits(&self, action: ActionClass) -> bool {
        matches!(
            action,
            ActionClass::Meld | ActionClass::Layoff | ActionClass::Discard | ActionClass::Knock
        )
    }

    fn name(&self) -> &'static str {
        "awaiting meld or discard"
    }
}

/// The current player discarded; the turn passes on the next advance.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct TurnComplete;

impl PhaseRules for TurnComplete {
    fn permits(&self, _action: ActionClass) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "turn complete"
    }
}

#[enum_dispatch(PhaseRules)]
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingDraw,
    AwaitingMeldOrDiscard,
    TurnComplete,
}

impl Default for TurnPhase {
    fn default() -> Self {
        AwaitingDraw.into()
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Seat order, current actor, phase and turn clock for one session.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct TurnCoordinator {
    seats: Vec<GamerId>,
    current: usize,
    phase: TurnPhase,
    turn_started_at: DateTime<Utc>,
    /// Starts at 1 and increments every time play returns to the first seat.
    round_number: u32,
    /// Monotonic count of turns started, starting at 1.
    turn_number: u64,
}

impl TurnCoordinator {
    #[must_use]
    pub fn new(seats: Vec<GamerId>, now: DateTime<Utc>) -> Self {
        Self {
            seats,
            current: 0,
            phase: TurnPhase::default(),
            turn_started_at: now,
            round_number: 1,
            turn_number: 1,
        }
    }

    /// Rejects the action unless `gamer` is the current actor and the phase
    /// permits it. Never mutates.
    pub fn authorize(&self, gamer: GamerId, action: ActionClass) -> Result<(), CommandError> {
        if !self.seats.contains(&gamer) {
            return Err(CommandError::UnknownGamer(gamer));
        }
        if self.current_gamer() != gamer {
            return Err(CommandError::NotYourTurn);
        }
        if !self.phase.permits(action) {
            return Err(CommandError::IllegalActionForState {
                phase: self.phase.to_string(),
                action: action.to_string(),
            });
        }
        Ok(())
    }

    /// Moves the phase forward after an authorized action was applied.
    pub fn record(&mut self, action: ActionClass) {
        self.phase = match action {
            ActionClass::DrawFromDeck
            | ActionClass::DrawFromDiscard
            | ActionClass::Meld
            | ActionClass::Layoff => AwaitingMeldOrDiscard.into(),
            ActionClass::Discard | ActionClass::Knock => TurnComplete.into(),
        };
    }

    /// Hands the turn to the next seat. Only legal from `TurnComplete`.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<(), CommandError> {
        if !matches!(self.phase, TurnPhase::TurnComplete(_)) {
            return Err(CommandError::InvariantViolation(format!(
                "turn advanced while {}",
                self.phase
            )));
        }
        self.current = (self.current + 1) % self.seats.len();
        if self.current == 0 {
            self.round_number += 1;
        }
        self.turn_number += 1;
        self.turn_started_at = now;
        self.phase = AwaitingDraw.into();
        Ok(())
    }

    #[must_use]
    pub fn current_gamer(&self) -> GamerId {
        self.seats[self.current]
    }

    #[must_use]
    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }

    #[must_use]
    pub fn seats(&self) -> &[GamerId] {
        &self.seats
    }

    #[must_use]
    pub fn seat_of(&self, gamer: GamerId) -> Option<usize> {
        self.seats.iter().position(|&g| g == gamer)
    }

    #[must_use]
    pub fn turn_started_at(&self) -> DateTime<Utc> {
        self.turn_started_at
    }

    #[must_use]
    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    #[must_use]
    pub fn turn_number(&self) -> u64 {
        self.turn_number
    }
}
