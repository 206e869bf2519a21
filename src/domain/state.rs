use serde::{Deserialize, Serialize};
use std::fmt;

/// Game state as reported by the feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameState {
    /// Scheduled, puck not dropped yet
    Preview,
    /// In progress (including intermissions)
    Live,
    /// Over, possibly still waiting on post-game data
    Final,
}

impl GameState {
    /// Maps the feed's abstract game state.
    ///
    /// Unknown values read as `Preview` so they can never regress a running game.
    pub fn from_feed(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "live" | "in progress" | "crit" => GameState::Live,
            "final" | "off" | "game over" => GameState::Final,
            _ => GameState::Preview,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Preview => "PREVIEW",
            GameState::Live => "LIVE",
            GameState::Final => "FINAL",
        }
    }

    /// States only move forward; skipping ahead is allowed
    pub fn can_transition_to(&self, target: GameState) -> bool {
        use GameState::*;

        match (self, target) {
            (Preview, Live) | (Preview, Final) => true,
            (Live, Final) => true,
            // All other transitions are regressions or no-ops
            _ => false,
        }
    }

    /// Get valid next states from current state
    pub fn valid_transitions(&self) -> Vec<GameState> {
        use GameState::*;

        match self {
            Preview => vec![Live, Final],
            Live => vec![Final],
            Final => vec![],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, GameState::Final)
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
