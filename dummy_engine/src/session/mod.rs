//! Live sessions: one tokio actor per game session.
//!
//! Each session runs in its own task with an mpsc inbox, so commands for a
//! session are applied one at a time while different sessions never wait on
//! each other. After every commit the actor:
//!
//! 1. publishes the new state on a `watch` channel (snapshot reads never go
//!    through the inbox),
//! 2. queues the commit batch for the event log writer,
//! 3. notifies subscribers.
//!
//! The actor also owns the turn timer; a late player command loses the race
//! through the ordinary turn check.
//!
//! ## Example
//!
//! ```no_run
//! use dummy_engine::session::{SessionConfig, SessionManager};
//! use dummy_engine::store::InMemoryEventLog;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = SessionManager::new(SessionConfig::default(), Arc::new(InMemoryEventLog::new()))?;
//! let session_id = manager.start_session("room-1", vec![1, 2]).await?;
//! let applied = manager.draw(session_id, 1, 0, None).await?;
//! let view = manager.get_snapshot(session_id, 1).await?;
//! assert_eq!(view.version, applied.version);
//! # Ok(())
//! # }
//! ```

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::{SessionActor, SessionHandle};
pub use config::{SessionConfig, TurnSpeed};
pub use manager::SessionManager;
pub use messages::{SessionError, SessionMessage, SessionNotification};
