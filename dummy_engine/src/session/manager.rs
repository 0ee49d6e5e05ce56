//! Session manager for spawning and addressing session actors.

use super::{
    actor::{SessionActor, SessionHandle},
    config::SessionConfig,
    messages::{SessionError, SessionNotification},
};
use crate::{
    game::{
        cards::{CardId, GamerId, MeldId},
        scoring::GameResult,
        session::{
            Action, Applied, Command, GameSession, HeadPlay, SessionId, SessionStart,
        },
        view::GameStatePayload,
    },
    replay,
    store::EventLog,
};
use chrono::Utc;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{RwLock, mpsc};

/// Session manager for managing many concurrent sessions
pub struct SessionManager {
    /// Defaults for new sessions
    config: SessionConfig,

    /// Durable history shared by every session
    log: Arc<dyn EventLog>,

    /// Live session handles
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(config: SessionConfig, log: Arc<dyn EventLog>) -> Result<Self, SessionError> {
        config.validate().map_err(SessionError::Config)?;
        Ok(Self {
            config,
            log,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shuffle with the OS-seeded CSPRNG, deal, record the start and spawn
    /// the session's actor.
    pub async fn start_session(
        &self,
        room_id: &str,
        players: Vec<GamerId>,
    ) -> Result<SessionId, SessionError> {
        self.config
            .validate_players(&players)
            .map_err(SessionError::Config)?;
        let start = SessionStart::shuffled(
            room_id,
            players,
            self.config.rules.clone(),
            &mut rand::rng(),
            Utc::now(),
        );
        self.start_recorded(start).await
    }

    /// Start a session from an existing start record (fixed deck order).
    pub async fn start_recorded(&self, start: SessionStart) -> Result<SessionId, SessionError> {
        self.config
            .validate_players(&start.players)
            .map_err(SessionError::Config)?;
        let session = GameSession::start(&start)?;
        self.log.append_start(&start).await?;

        let session_id = session.id();
        self.spawn(session).await;
        log::info!(
            "Started session {} in room '{}' with players {:?}",
            session_id,
            start.room_id,
            start.players
        );
        Ok(session_id)
    }

    async fn spawn(&self, session: GameSession) -> SessionHandle {
        let session_id = session.id();
        let (actor, handle) = SessionActor::new(session, self.config.clone(), Arc::clone(&self.log));
        tokio::spawn(actor.run());

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_id, handle.clone());
        handle
    }

    /// Get session handle
    pub async fn get_session(&self, session_id: SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(&session_id).cloned()
    }

    async fn handle(&self, session_id: SessionId) -> Result<SessionHandle, SessionError> {
        self.get_session(session_id)
            .await
            .ok_or(SessionError::NotFound(session_id))
    }

    /// Run any command against a session
    pub async fn execute(
        &self,
        session_id: SessionId,
        command: Command,
    ) -> Result<Applied, SessionError> {
        self.handle(session_id).await?.execute(command).await
    }

    /// Draw from the deck (`head: None`) or take the discard pile's head and
    /// meld or lay it off in the same step.
    pub async fn draw(
        &self,
        session_id: SessionId,
        gamer_id: GamerId,
        expected_version: u64,
        head: Option<HeadPlay>,
    ) -> Result<Applied, SessionError> {
        let action = match head {
            None => Action::DrawFromDeck,
            Some(play) => Action::DrawFromDiscard { play },
        };
        self.send_action(session_id, gamer_id, expected_version, action)
            .await
    }

    pub async fn discard(
        &self,
        session_id: SessionId,
        gamer_id: GamerId,
        expected_version: u64,
        card_id: CardId,
    ) -> Result<Applied, SessionError> {
        self.send_action(session_id, gamer_id, expected_version, Action::Discard { card_id })
            .await
    }

    pub async fn meld(
        &self,
        session_id: SessionId,
        gamer_id: GamerId,
        expected_version: u64,
        card_ids: Vec<CardId>,
    ) -> Result<Applied, SessionError> {
        self.send_action(session_id, gamer_id, expected_version, Action::Meld { card_ids })
            .await
    }

    pub async fn layoff(
        &self,
        session_id: SessionId,
        gamer_id: GamerId,
        expected_version: u64,
        meld_id: MeldId,
        card_ids: Vec<CardId>,
    ) -> Result<Applied, SessionError> {
        self.send_action(
            session_id,
            gamer_id,
            expected_version,
            Action::Layoff { meld_id, card_ids },
        )
        .await
    }

    pub async fn knock(
        &self,
        session_id: SessionId,
        gamer_id: GamerId,
        expected_version: u64,
        discard: Option<CardId>,
    ) -> Result<Applied, SessionError> {
        self.send_action(session_id, gamer_id, expected_version, Action::Knock { discard })
            .await
    }

    async fn send_action(
        &self,
        session_id: SessionId,
        gamer_id: GamerId,
        expected_version: u64,
        action: Action,
    ) -> Result<Applied, SessionError> {
        let command = Command {
            gamer_id,
            expected_version,
            action,
        };
        self.execute(session_id, command).await
    }

    /// Viewer's projection of the last committed state. Doesn't touch the
    /// actor's inbox.
    pub async fn get_snapshot(
        &self,
        session_id: SessionId,
        viewer: GamerId,
    ) -> Result<GameStatePayload, SessionError> {
        Ok(self.handle(session_id).await?.snapshot().view_for(viewer))
    }

    /// Subscribe to a session's post-commit notifications
    pub async fn subscribe(
        &self,
        session_id: SessionId,
        subscriber_id: GamerId,
        capacity: usize,
    ) -> Result<mpsc::Receiver<SessionNotification>, SessionError> {
        self.handle(session_id)
            .await?
            .subscribe(subscriber_id, capacity)
            .await
    }

    /// Wait until a session's commits are all in the event log
    pub async fn flush(&self, session_id: SessionId) -> Result<(), SessionError> {
        self.handle(session_id).await?.flush().await
    }

    /// Stop a finished or errored session's actor and drop it from the
    /// registry. Returns the result if it settled.
    pub async fn archive(&self, session_id: SessionId) -> Result<Option<GameResult>, SessionError> {
        let handle = self.handle(session_id).await?;
        if handle.snapshot().is_active() {
            return Err(SessionError::StillActive(session_id));
        }

        let result = handle.close().await?;

        let mut sessions = self.sessions.write().await;
        sessions.remove(&session_id);
        drop(sessions);

        log::info!("Archived session {}", session_id);
        Ok(result)
    }

    /// Rebuild a session from the event log and respawn its actor. A session
    /// that is already live is left alone.
    pub async fn recover(&self, session_id: SessionId) -> Result<SessionHandle, SessionError> {
        if let Some(handle) = self.get_session(session_id).await
            && !handle.is_closed()
        {
            return Ok(handle);
        }

        let record = self.log.load(session_id).await?;
        let session = replay::rebuild(&record)?;
        log::info!(
            "Recovered session {} at version {}",
            session_id,
            session.version()
        );
        Ok(self.spawn(session).await)
    }

    /// Recover every session the event log still has as active
    pub async fn recover_all(&self) -> Result<usize, SessionError> {
        let ids = self.log.active_sessions().await?;
        let mut recovered = 0;
        for session_id in ids {
            match self.recover(session_id).await {
                Ok(_) => recovered += 1,
                Err(e) => log::error!("Failed to recover session {}: {}", session_id, e),
            }
        }
        Ok(recovered)
    }

    /// Get live session count
    pub async fn active_session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
