//! Dummy game rules: cards, melds, turn flow, scoring and the session
//! command engine.

pub mod cards;
pub mod errors;
pub mod hand;
pub mod melds;
pub mod rules;
pub mod scoring;
pub mod session;
pub mod turn;
pub mod view;

pub use cards::{Card, CardId, GamerId, MeldId, Suit};
pub use errors::CommandError;
pub use scoring::{GameResult, ScoreEvent, ScoreEventKind, WinningType};
pub use session::{
    Action, Applied, Command, GameRules, GameSession, HeadPlay, MoveRecord, SessionId,
    SessionStart, SessionStatus,
};
pub use turn::{ActionClass, TurnPhase};
pub use view::GameStatePayload;
