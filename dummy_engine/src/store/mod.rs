//! Durable, append-only session history.
//!
//! The session actor hands every committed batch to an [`EventLog`]. Two
//! implementations ship: [`InMemoryEventLog`] for tests and tools, and
//! [`PgEventLog`] backed by PostgreSQL.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::game::session::{SessionId, SessionStart, SessionStatus};

pub mod config;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod timeouts;

pub use config::DatabaseConfig;
pub use memory::InMemoryEventLog;
pub use models::{CommitBatch, GameRecord};
pub use postgres::PgEventLog;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Store operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Move {move_number} already recorded for session {session_id}")]
    DuplicateMove {
        session_id: SessionId,
        move_number: u64,
    },

    #[error("Session {session_id} expected move {expected}, got {found}")]
    MoveGap {
        session_id: SessionId,
        expected: u64,
        found: u64,
    },

    #[error("Session {0} not found")]
    SessionNotFound(SessionId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Append-only log of session starts and committed moves.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Record a new session's start record (deck order included).
    async fn append_start(&self, start: &SessionStart) -> StoreResult<()>;

    /// Append one committed move with its score events and, on settlement,
    /// its result. All or nothing. The move number must be exactly one past
    /// the last recorded move.
    async fn append(&self, session_id: SessionId, batch: &CommitBatch) -> StoreResult<()>;

    /// Record a status change that didn't come with a move (errored).
    async fn set_status(&self, session_id: SessionId, status: &SessionStatus) -> StoreResult<()>;

    /// Full history of one session.
    async fn load(&self, session_id: SessionId) -> StoreResult<GameRecord>;

    /// Sessions not yet finished or errored.
    async fn active_sessions(&self) -> StoreResult<Vec<SessionId>>;
}
