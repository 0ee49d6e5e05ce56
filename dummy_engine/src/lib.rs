//! # Dummy Engine
//!
//! Server-authoritative engine for Thai Dummy, a rummy-family card game.
//!
//! A session owns the deck, hands, discard pile and meld table of one match.
//! Players change it only through typed commands; each command is either
//! committed whole, with the score events it produced, or rejected without
//! touching anything. Scores are an append-only event log and totals are
//! always derived from it, so a game can be replayed exactly from its start
//! record and move log.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, melds, turn state machine, scoring and the session
//!   command engine
//! - [`session`]: one tokio actor per live session and the manager that
//!   addresses them
//! - [`store`]: append-only event log (in-memory and PostgreSQL)
//! - [`replay`]: rebuild a session from its event log
//!
//! ## Example
//!
//! ```
//! use chrono::Utc;
//! use dummy_engine::game::{Action, Command, GameRules, GameSession, SessionStart};
//!
//! let start = SessionStart::shuffled("room", vec![1, 2], GameRules::default(), &mut rand::rng(), Utc::now());
//! let mut session = GameSession::start(&start).unwrap();
//! let command = Command { gamer_id: 1, expected_version: 0, action: Action::DrawFromDeck };
//! let applied = session.execute(command, Utc::now()).unwrap();
//! assert_eq!(applied.version, 1);
//! ```

/// Core game logic and the session command engine.
pub mod game;
pub use game::{
    Action, Applied, Command, CommandError, GameResult, GameRules, GameSession,
    GameStatePayload, HeadPlay, ScoreEvent, SessionId, SessionStart, SessionStatus,
};

pub mod replay;
pub mod session;
pub mod store;

pub use session::{SessionConfig, SessionError, SessionManager};
