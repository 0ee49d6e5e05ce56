//! Persisted shapes of a session's history.

use serde::{Deserialize, Serialize};

use crate::game::{
    scoring::{GameResult, ScoreEvent},
    session::{Applied, MoveRecord, SessionStart, SessionStatus},
};

/// Everything one committed command produced. Written atomically.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CommitBatch {
    pub record: MoveRecord,
    pub events: Vec<ScoreEvent>,
    /// Present on the settling move only.
    pub result: Option<GameResult>,
}

impl From<&Applied> for CommitBatch {
    fn from(applied: &Applied) -> Self {
        Self {
            record: applied.record.clone(),
            events: applied.events.clone(),
            result: applied.result.clone(),
        }
    }
}

/// A session's start record and its committed moves in order.
///
/// This is also the JSON format `dm_replay` reads.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameRecord {
    pub start: SessionStart,
    pub moves: Vec<CommitBatch>,
    #[serde(default = "active")]
    pub status: SessionStatus,
}

fn active() -> SessionStatus {
    SessionStatus::Active
}

impl GameRecord {
    #[must_use]
    pub fn new(start: SessionStart) -> Self {
        Self {
            start,
            moves: Vec::new(),
            status: SessionStatus::Active,
        }
    }

    #[must_use]
    pub fn last_move_number(&self) -> u64 {
        self.moves.last().map_or(0, |m| m.record.move_number)
    }

    /// Every score event in commit order.
    pub fn events(&self) -> impl Iterator<Item = &ScoreEvent> {
        self.moves.iter().flat_map(|m| m.events.iter())
    }

    #[must_use]
    pub fn result(&self) -> Option<&GameResult> {
        self.moves.iter().rev().find_map(|m| m.result.as_ref())
    }
}
