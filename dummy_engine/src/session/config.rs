//! Session configuration models.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::game::{cards::DECK_SIZE, session::GameRules};

/// Turn clock presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnSpeed {
    #[default]
    Normal,
    Turbo,
    Hyper,
}

impl TurnSpeed {
    /// Seconds a player gets before their turn is played out for them.
    pub fn turn_timeout_secs(self) -> u64 {
        match self {
            TurnSpeed::Normal => 30,
            TurnSpeed::Turbo => 15,
            TurnSpeed::Hyper => 5,
        }
    }
}

impl std::fmt::Display for TurnSpeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnSpeed::Normal => write!(f, "normal"),
            TurnSpeed::Turbo => write!(f, "turbo"),
            TurnSpeed::Hyper => write!(f, "hyper"),
        }
    }
}

impl std::str::FromStr for TurnSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(TurnSpeed::Normal),
            "turbo" => Ok(TurnSpeed::Turbo),
            "hyper" => Ok(TurnSpeed::Hyper),
            other => Err(format!("unknown turn speed '{other}'")),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Deal size and knock threshold
    pub rules: GameRules,

    /// Turn clock preset
    pub speed: TurnSpeed,

    /// Overrides the preset turn timeout when set
    pub turn_timeout_override_secs: Option<u64>,

    /// Minimum number of players (default: 2)
    pub min_players: usize,

    /// Maximum number of players (default: 4)
    pub max_players: usize,

    /// Session actor inbox capacity
    pub inbox_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rules: GameRules::default(),
            speed: TurnSpeed::Normal,
            turn_timeout_override_secs: None,
            min_players: 2,
            max_players: 4,
            inbox_capacity: 100,
        }
    }
}

impl SessionConfig {
    /// Reads overrides from the environment:
    /// - `DUMMY_CARDS_PER_PLAYER` (default: 7)
    /// - `DUMMY_KNOCK_THRESHOLD` (default: 0)
    /// - `DUMMY_TURN_SPEED`: normal, turbo or hyper (default: normal)
    /// - `DUMMY_TURN_TIMEOUT_SECS`: overrides the speed preset
    ///
    /// Unset or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rules: GameRules {
                cards_per_player: parse_env_or(
                    "DUMMY_CARDS_PER_PLAYER",
                    defaults.rules.cards_per_player,
                ),
                knock_threshold: parse_env_or("DUMMY_KNOCK_THRESHOLD", defaults.rules.knock_threshold),
            },
            speed: parse_env_or("DUMMY_TURN_SPEED", defaults.speed),
            turn_timeout_override_secs: std::env::var("DUMMY_TURN_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok()),
            ..defaults
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.min_players < 2 {
            return Err("Min players must be at least 2".to_string());
        }

        if self.max_players < self.min_players {
            return Err("Max players must be at least min players".to_string());
        }

        if self.rules.cards_per_player == 0 {
            return Err("Cards per player must be positive".to_string());
        }

        if self.max_players * self.rules.cards_per_player + 1 > DECK_SIZE {
            return Err(format!(
                "{} players with {} cards each don't fit in a {}-card deck",
                self.max_players, self.rules.cards_per_player, DECK_SIZE
            ));
        }

        if self.rules.knock_threshold < 0 {
            return Err("Knock threshold can't be negative".to_string());
        }

        if self.turn_timeout_override_secs == Some(0) {
            return Err("Turn timeout must be positive".to_string());
        }

        if self.inbox_capacity == 0 {
            return Err("Inbox capacity must be positive".to_string());
        }

        Ok(())
    }

    /// Checks a seat list against the player bounds.
    pub fn validate_players(&self, players: &[i64]) -> Result<(), String> {
        if players.len() < self.min_players || players.len() > self.max_players {
            return Err(format!(
                "Sessions take {} to {} players, got {}",
                self.min_players,
                self.max_players,
                players.len()
            ));
        }
        let mut distinct = players.to_vec();
        distinct.sort_unstable();
        distinct.dedup();
        if distinct.len() != players.len() {
            return Err("Player ids must be distinct".to_string());
        }
        Ok(())
    }

    /// Get turn timeout based on speed or override
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(
            self.turn_timeout_override_secs
                .unwrap_or_else(|| self.speed.turn_timeout_secs()),
        )
    }
}

fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
