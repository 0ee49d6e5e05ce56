use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

use super::{CommitBatch, EventLog, GameRecord, StoreError, StoreResult};
use crate::game::session::{SessionId, SessionStart, SessionStatus};

/// Event log kept in process memory. Used by tests and `dm_replay`.
#[derive(Debug, Default)]
pub struct InMemoryEventLog {
    sessions: Mutex<HashMap<SessionId, GameRecord>>,
}

impl InMemoryEventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the log with an existing record.
    pub async fn insert(&self, record: GameRecord) {
        let mut sessions = self.sessions.lock().await;
        sessions.insert(record.start.session_id, record);
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn append_start(&self, start: &SessionStart) -> StoreResult<()> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&start.session_id) {
            return Err(StoreError::DuplicateMove {
                session_id: start.session_id,
                move_number: 0,
            });
        }
        sessions.insert(start.session_id, GameRecord::new(start.clone()));
        Ok(())
    }

    async fn append(&self, session_id: SessionId, batch: &CommitBatch) -> StoreResult<()> {
        let mut sessions = self.sessions.lock().await;
        let record = sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;

        let move_number = batch.record.move_number;
        let expected = record.last_move_number() + 1;
        if move_number < expected {
            return Err(StoreError::DuplicateMove {
                session_id,
                move_number,
            });
        }
        if move_number > expected {
            return Err(StoreError::MoveGap {
                session_id,
                expected,
                found: move_number,
            });
        }
        record.moves.push(batch.clone());
        if batch.result.is_some() {
            record.status = SessionStatus::Finished;
        }
        Ok(())
    }

    async fn set_status(&self, session_id: SessionId, status: &SessionStatus) -> StoreResult<()> {
        let mut sessions = self.sessions.lock().await;
        let record = sessions
            .get_mut(&session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        record.status = status.clone();
        Ok(())
    }

    async fn load(&self, session_id: SessionId) -> StoreResult<GameRecord> {
        let sessions = self.sessions.lock().await;
        sessions
            .get(&session_id)
            .cloned()
            .ok_or(StoreError::SessionNotFound(session_id))
    }

    async fn active_sessions(&self) -> StoreResult<Vec<SessionId>> {
        let sessions = self.sessions.lock().await;
        Ok(sessions
            .values()
            .filter(|r| r.status == SessionStatus::Active)
            .map(|r| r.start.session_id)
            .collect())
    }
}
