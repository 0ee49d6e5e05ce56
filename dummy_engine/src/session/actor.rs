//! Session actor: the single writer for one game session.

use super::{
    config::SessionConfig,
    messages::{SessionError, SessionMessage, SessionNotification},
};
use crate::{
    game::{
        cards::GamerId,
        errors::CommandError,
        scoring::GameResult,
        session::{Applied, Command, GameSession, SessionId, SessionStatus},
    },
    store::{CommitBatch, EventLog, StoreError},
};
use chrono::Utc;
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{
    sync::{mpsc, oneshot, watch},
    time::{Instant, sleep, sleep_until},
};

/// Attempts per event log write before giving up on it
const PERSIST_ATTEMPTS: u32 = 3;

/// Session actor handle for sending messages and reading snapshots
#[derive(Clone, Debug)]
pub struct SessionHandle {
    sender: mpsc::Sender<SessionMessage>,
    snapshot: watch::Receiver<Arc<GameSession>>,
    session_id: SessionId,
}

impl SessionHandle {
    /// Get session ID
    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Last committed state. Never waits on the actor.
    pub fn snapshot(&self) -> Arc<GameSession> {
        Arc::clone(&*self.snapshot.borrow())
    }

    /// Receiver that wakes on every commit
    pub fn watch(&self) -> watch::Receiver<Arc<GameSession>> {
        self.snapshot.clone()
    }

    /// Send a message to the session
    pub async fn send(&self, message: SessionMessage) -> Result<(), SessionError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| SessionError::Closed(self.session_id))
    }

    /// Run a player command and wait for the verdict
    pub async fn execute(&self, command: Command) -> Result<Applied, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Execute {
            command,
            response: tx,
        })
        .await?;
        let verdict = rx.await.map_err(|_| SessionError::Closed(self.session_id))?;
        Ok(verdict?)
    }

    /// Subscribe to post-commit notifications with a buffer of `capacity`
    pub async fn subscribe(
        &self,
        subscriber_id: GamerId,
        capacity: usize,
    ) -> Result<mpsc::Receiver<SessionNotification>, SessionError> {
        let (sender, receiver) = mpsc::channel(capacity);
        self.send(SessionMessage::Subscribe {
            subscriber_id,
            sender,
        })
        .await?;
        Ok(receiver)
    }

    pub async fn unsubscribe(&self, subscriber_id: GamerId) -> Result<(), SessionError> {
        self.send(SessionMessage::Unsubscribe { subscriber_id }).await
    }

    /// Wait until every commit so far has been handed to the event log
    pub async fn flush(&self) -> Result<(), SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Flush { response: tx }).await?;
        rx.await.map_err(|_| SessionError::Closed(self.session_id))
    }

    /// Stop the actor. Returns the result if the session had settled.
    pub async fn close(&self) -> Result<Option<GameResult>, SessionError> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Close { response: tx }).await?;
        rx.await.map_err(|_| SessionError::Closed(self.session_id))
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Work for the event log writer, in commit order
#[derive(Debug)]
enum WriteOp {
    Commit(Box<CommitBatch>),
    Status(SessionStatus),
    Flush(oneshot::Sender<()>),
}

/// Session actor owning one game session
pub struct SessionActor {
    /// Authoritative game state
    session: GameSession,

    /// Session configuration
    config: SessionConfig,

    /// Message inbox
    inbox: mpsc::Receiver<SessionMessage>,

    /// Published after every commit
    snapshot: watch::Sender<Arc<GameSession>>,

    /// Durable history
    log: Arc<dyn EventLog>,

    /// Queue feeding the writer task
    writes: mpsc::UnboundedSender<WriteOp>,

    /// Taken by `run` when the writer task starts
    pending_writes: Option<mpsc::UnboundedReceiver<WriteOp>>,

    /// Writer reports a move it could not persist; sender half goes to the writer
    write_failures: mpsc::UnboundedReceiver<String>,
    failure_reporter: Option<mpsc::UnboundedSender<String>>,

    /// Post-commit notification subscribers
    subscribers: HashMap<GamerId, mpsc::Sender<SessionNotification>>,

    /// When the current player's turn is played out for them
    turn_deadline: Instant,

    /// Set by a close request; answered once writes are drained
    close_reply: Option<oneshot::Sender<Option<GameResult>>>,
}

impl SessionActor {
    /// Create a new session actor and its handle
    pub fn new(
        session: GameSession,
        config: SessionConfig,
        log: Arc<dyn EventLog>,
    ) -> (Self, SessionHandle) {
        let (sender, inbox) = mpsc::channel(config.inbox_capacity);
        let (snapshot, snapshot_rx) = watch::channel(Arc::new(session.clone()));
        let (writes, pending_writes) = mpsc::unbounded_channel();
        let (failure_reporter, write_failures) = mpsc::unbounded_channel();
        let session_id = session.id();

        let actor = Self {
            turn_deadline: Instant::now() + config.turn_timeout(),
            session,
            config,
            inbox,
            snapshot,
            log,
            writes,
            pending_writes: Some(pending_writes),
            write_failures,
            failure_reporter: Some(failure_reporter),
            subscribers: HashMap::new(),
            close_reply: None,
        };

        let handle = SessionHandle {
            sender,
            snapshot: snapshot_rx,
            session_id,
        };

        (actor, handle)
    }

    /// Run the session actor event loop
    pub async fn run(mut self) {
        let session_id = self.session.id();
        log::info!(
            "Session {} in room '{}' starting",
            session_id,
            self.session.room_id()
        );

        let writer = self
            .pending_writes
            .take()
            .zip(self.failure_reporter.take())
            .map(|(writes, failures)| {
                tokio::spawn(persist(session_id, Arc::clone(&self.log), writes, failures))
            });

        loop {
            tokio::select! {
                message = self.inbox.recv() => match message {
                    Some(message) => self.handle_message(message),
                    None => break,
                },

                () = sleep_until(self.turn_deadline), if self.session.is_active() => {
                    self.expire_turn();
                }

                Some(reason) = self.write_failures.recv() => {
                    self.persistence_failed(reason);
                }
            }

            if self.close_reply.is_some() {
                break;
            }
        }

        let Self {
            session,
            writes,
            close_reply,
            ..
        } = self;
        drop(writes);
        if let Some(writer) = writer
            && let Err(e) = writer.await
        {
            log::error!("Session {}: event log writer failed: {}", session_id, e);
        }
        if let Some(reply) = close_reply {
            let _ = reply.send(session.result().cloned());
        }

        log::info!("Session {} closed", session_id);
    }

    /// Handle a session message
    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Execute { command, response } => {
                let verdict = self.execute(command);
                let _ = response.send(verdict);
            }

            SessionMessage::Subscribe {
                subscriber_id,
                sender,
            } => {
                self.subscribers.insert(subscriber_id, sender);
                log::debug!(
                    "Gamer {} subscribed to session {}",
                    subscriber_id,
                    self.session.id()
                );
            }

            SessionMessage::Unsubscribe { subscriber_id } => {
                self.subscribers.remove(&subscriber_id);
                log::debug!(
                    "Gamer {} unsubscribed from session {}",
                    subscriber_id,
                    self.session.id()
                );
            }

            SessionMessage::Flush { response } => {
                if let Err(mpsc::error::SendError(WriteOp::Flush(response))) =
                    self.writes.send(WriteOp::Flush(response))
                {
                    let _ = response.send(());
                }
            }

            SessionMessage::Close { response } => {
                self.close_reply = Some(response);
            }
        }
    }

    fn execute(&mut self, command: Command) -> Result<Applied, CommandError> {
        let turn = self.session.turns().turn_number();
        match self.session.execute(command, Utc::now()) {
            Ok(applied) => {
                self.committed(std::slice::from_ref(&applied), turn);
                Ok(applied)
            }
            Err(e) => {
                if e.is_fatal() {
                    self.errored();
                }
                Err(e)
            }
        }
    }

    /// Timer fired before the current player finished their turn
    fn expire_turn(&mut self) {
        let turn = self.session.turns().turn_number();
        let applied = self.session.expire_turn(Utc::now());
        if !applied.is_empty() {
            self.committed(&applied, turn);
        }
        if matches!(self.session.status(), SessionStatus::Errored { .. }) {
            self.errored();
        }
        self.turn_deadline = Instant::now() + self.config.turn_timeout();
    }

    /// Publish, persist, then notify, in that order
    fn committed(&mut self, applied: &[Applied], turn_before: u64) {
        let session_id = self.session.id();
        self.snapshot.send_replace(Arc::new(self.session.clone()));

        for a in applied {
            if self
                .writes
                .send(WriteOp::Commit(Box::new(CommitBatch::from(a))))
                .is_err()
            {
                log::error!(
                    "Session {}: event log writer gone, move {} not persisted",
                    session_id,
                    a.version
                );
            }
        }

        if self.session.turns().turn_number() != turn_before {
            self.turn_deadline = Instant::now() + self.config.turn_timeout();
        }

        for a in applied {
            self.notify(SessionNotification::Committed(Box::new(a.clone())));
            if let Some(result) = &a.result {
                log::info!(
                    "Session {} settled after {} moves: winner {:?} by {}",
                    session_id,
                    result.move_count,
                    result.winner_id,
                    result.winning_type
                );
                self.notify(SessionNotification::Settled(Box::new(result.clone())));
            }
        }
    }

    /// The log no longer matches the live session; stop taking moves
    fn persistence_failed(&mut self, reason: String) {
        if matches!(self.session.status(), SessionStatus::Errored { .. }) {
            return;
        }
        self.session.mark_errored(reason);
        self.errored();
    }

    fn errored(&mut self) {
        let status = self.session.status().clone();
        self.snapshot.send_replace(Arc::new(self.session.clone()));
        let _ = self.writes.send(WriteOp::Status(status.clone()));
        if let SessionStatus::Errored { reason } = status {
            self.notify(SessionNotification::Errored { reason });
        }
    }

    /// Broadcast a notification to all subscribers
    fn notify(&mut self, notification: SessionNotification) {
        let session_id = self.session.id();
        self.subscribers
            .retain(|subscriber_id, sender| match sender.try_send(notification.clone()) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!(
                        "Subscriber {} of session {} is lagging, dropping notification",
                        subscriber_id,
                        session_id
                    );
                    true
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    log::debug!(
                        "Subscriber {} of session {} disconnected",
                        subscriber_id,
                        session_id
                    );
                    false
                }
            });
    }
}

/// Drains the write queue into the event log, one batch per append.
///
/// Once a move can't be persisted the writer reports it and drops every later
/// move, so the log never skips a move number. Status changes and flushes are
/// still served.
async fn persist(
    session_id: SessionId,
    log: Arc<dyn EventLog>,
    mut writes: mpsc::UnboundedReceiver<WriteOp>,
    failures: mpsc::UnboundedSender<String>,
) {
    let mut broken = false;
    while let Some(op) = writes.recv().await {
        match op {
            WriteOp::Commit(batch) if broken => {
                log::warn!(
                    "Session {}: move {} dropped, event log is behind",
                    session_id,
                    batch.record.move_number
                );
            }

            WriteOp::Commit(batch) => {
                let move_number = batch.record.move_number;
                if let Err(e) = append_with_retry(session_id, log.as_ref(), &batch).await {
                    log::error!("Session {}: giving up on move {}: {}", session_id, move_number, e);
                    broken = true;
                    let _ = failures.send(format!("move {move_number} not persisted: {e}"));
                }
            }

            WriteOp::Status(status) => {
                if let Err(e) = log.set_status(session_id, &status).await {
                    log::error!("Session {}: failed to record status: {}", session_id, e);
                }
            }

            WriteOp::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

async fn append_with_retry(
    session_id: SessionId,
    log: &dyn EventLog,
    batch: &CommitBatch,
) -> Result<(), StoreError> {
    let move_number = batch.record.move_number;
    let mut attempt = 1;
    loop {
        match log.append(session_id, batch).await {
            Ok(()) => return Ok(()),
            // An earlier attempt landed before its reply was lost
            Err(e @ StoreError::DuplicateMove { .. }) => {
                log::warn!("Session {}: {}", session_id, e);
                return Ok(());
            }
            Err(e @ StoreError::MoveGap { .. }) => return Err(e),
            Err(e) if attempt < PERSIST_ATTEMPTS => {
                log::warn!(
                    "Session {}: persisting move {} failed (attempt {}): {}",
                    session_id,
                    move_number,
                    attempt,
                    e
                );
                sleep(Duration::from_millis(100 * u64::from(attempt))).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
