//! Rebuilds a session from its start record and committed move log.
//!
//! Every move is re-applied through the normal command path and its score
//! events are checked against what was recorded. Used for crash recovery
//! and by `dm_replay` for audits.

use thiserror::Error;

use crate::{
    game::{
        errors::CommandError,
        scoring::{GameResult, ScoreEvent},
        session::GameSession,
    },
    store::GameRecord,
};

#[derive(Debug, Error, PartialEq)]
pub enum ReplayError {
    #[error("Start record rejected: {0}")]
    InvalidStart(CommandError),

    #[error("Expected move {expected}, log has move {found}")]
    VersionGap { expected: u64, found: u64 },

    #[error("Move {move_number} rejected during replay: {source}")]
    Rejected {
        move_number: u64,
        source: CommandError,
    },

    #[error("Move {move_number} produced different score events than recorded")]
    DivergentEvents { move_number: u64 },

    #[error("Move {move_number} settled differently than recorded")]
    DivergentResult { move_number: u64 },
}

/// Replays `record` and returns the session at its last committed version.
pub fn rebuild(record: &GameRecord) -> Result<GameSession, ReplayError> {
    let mut session = GameSession::start(&record.start).map_err(ReplayError::InvalidStart)?;

    for batch in &record.moves {
        let expected = session.version() + 1;
        let move_number = batch.record.move_number;
        if move_number != expected {
            return Err(ReplayError::VersionGap {
                expected,
                found: move_number,
            });
        }

        let applied = session
            .apply_recorded(&batch.record)
            .map_err(|source| ReplayError::Rejected {
                move_number,
                source,
            })?;
        if !same_events(&applied.events, &batch.events) {
            return Err(ReplayError::DivergentEvents { move_number });
        }
        if !same_result(applied.result.as_ref(), batch.result.as_ref()) {
            return Err(ReplayError::DivergentResult { move_number });
        }
    }

    log::debug!(
        "Replayed session {} to version {} ({} moves)",
        session.id(),
        session.version(),
        record.moves.len()
    );
    Ok(session)
}

// Timestamps are left out: the database stores them at microsecond precision.
fn same_events(replayed: &[ScoreEvent], recorded: &[ScoreEvent]) -> bool {
    replayed.len() == recorded.len()
        && replayed.iter().zip(recorded).all(|(a, b)| {
            a.gamer_id == b.gamer_id
                && a.event_type == b.event_type
                && a.points == b.points
                && a.related_meld_id == b.related_meld_id
                && a.related_card_ids == b.related_card_ids
                && a.move_number == b.move_number
        })
}

fn same_result(replayed: Option<&GameResult>, recorded: Option<&GameResult>) -> bool {
    match (replayed, recorded) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            a.winner_id == b.winner_id
                && a.winning_type == b.winning_type
                && a.move_count == b.move_count
                && a.players.len() == b.players.len()
                && a.players.iter().zip(&b.players).all(|(p, q)| {
                    p.gamer_id == q.gamer_id
                        && p.total_points == q.total_points
                        && p.is_winner == q.is_winner
                        && p.remaining_cards == q.remaining_cards
                })
        }
        _ => false,
    }
}
