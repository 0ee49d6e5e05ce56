//! Session actor message types.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::{
    game::{
        cards::GamerId,
        errors::CommandError,
        scoring::GameResult,
        session::{Applied, Command, SessionId},
    },
    replay::ReplayError,
    store::StoreError,
};

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
    /// Player command
    Execute {
        command: Command,
        response: oneshot::Sender<Result<Applied, CommandError>>,
    },

    /// Subscribe to post-commit notifications
    Subscribe {
        subscriber_id: GamerId,
        sender: mpsc::Sender<SessionNotification>,
    },

    /// Unsubscribe from notifications
    Unsubscribe { subscriber_id: GamerId },

    /// Resolves once every commit so far has reached the event log
    Flush { response: oneshot::Sender<()> },

    /// Stop the actor once pending writes are durable
    Close {
        response: oneshot::Sender<Option<GameResult>>,
    },
}

/// Published once per commit, after the snapshot is updated.
#[derive(Debug, Clone)]
pub enum SessionNotification {
    /// A move was committed (player or timeout)
    Committed(Box<Applied>),
    /// The session settled
    Settled(Box<GameResult>),
    /// An invariant broke; the session refuses further commands
    Errored { reason: String },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session {0} not found")]
    NotFound(SessionId),

    #[error("Session {0} is closed")]
    Closed(SessionId),

    #[error("Session {0} is still in play")]
    StillActive(SessionId),

    #[error("Invalid session config: {0}")]
    Config(String),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl SessionError {
    /// The rejection to surface to the player, if this was one.
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            SessionError::Command(e) => Some(e),
            _ => None,
        }
    }
}
