use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::cards::{CardId, GamerId, MeldId};

/// Rejections surfaced verbatim to the client that issued the command.
///
/// A rejected command never mutates the session. `InvariantViolation` is the
/// one fatal kind: the session is marked errored and refuses further commands.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum CommandError {
    #[error("not your turn")]
    NotYourTurn,
    #[error("can't {action} while {phase}")]
    IllegalActionForState { phase: String, action: String },
    #[error("card {0} is not in your hand")]
    CardNotInHand(CardId),
    #[error("cards don't form a valid meld")]
    InvalidMeld,
    #[error("meld {0} not found")]
    MeldNotFound(MeldId),
    #[error("deck is empty")]
    DeckEmpty,
    #[error("discard pile is empty")]
    DiscardPileEmpty,
    #[error("deadwood {deadwood} exceeds knock threshold {threshold}")]
    KnockDeadwoodExceedsThreshold { deadwood: i32, threshold: i32 },
    #[error("session is not active")]
    SessionNotActive,
    #[error("stale move version: sent {expected}, session is at {current}")]
    StaleMoveVersion { expected: u64, current: u64 },
    #[error("gamer {0} is not seated in this session")]
    UnknownGamer(GamerId),
    #[error("invalid players: {0}")]
    InvalidPlayers(String),
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl CommandError {
    /// Whether the error marks the session as errored.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvariantViolation(_))
    }
}
