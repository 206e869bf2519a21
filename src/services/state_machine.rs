//! Poll loop state machine
//!
//! PREVIEW → LIVE → FINAL → DONE
//!
//! A game already under way (or over) when the bot starts enters at LIVE or
//! FINAL directly. Cancellation moves any state to DONE.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::GameState;
use crate::error::{BotError, Result};

/// Loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoopState {
    /// Before puck drop
    /// Allowed: pregame posts, wait for start
    Preview,

    /// Game in progress
    /// Allowed: reconcile every snapshot
    Live,

    /// Game over, end-of-game posts outstanding
    /// Allowed: reconcile, finalize
    Final,

    /// Nothing left to do
    Done,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Preview => write!(f, "PREVIEW"),
            Self::Live => write!(f, "LIVE"),
            Self::Final => write!(f, "FINAL"),
            Self::Done => write!(f, "DONE"),
        }
    }
}

impl From<GameState> for LoopState {
    fn from(state: GameState) -> Self {
        match state {
            GameState::Preview => Self::Preview,
            GameState::Live => Self::Live,
            GameState::Final => Self::Final,
        }
    }
}

/// State transition events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopEvent {
    // Preview → Live
    PuckDropped,

    // Live → Final, or Preview → Final for a game that ended before we looked
    FinalConfirmed,

    // Final → Done
    ChecklistSettled,

    // Any → Done
    Cancelled,
}

/// State transition record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopTransition {
    pub from: LoopState,
    pub to: LoopState,
    pub event: String,
    pub timestamp: i64,
}

pub struct LoopStateMachine {
    current_state: LoopState,
    transition_history: Vec<LoopTransition>,
}

impl LoopStateMachine {
    pub fn new(initial: LoopState) -> Self {
        Self {
            current_state: initial,
            transition_history: vec![],
        }
    }

    /// Attempt state transition
    pub fn transition(&mut self, event: LoopEvent) -> Result<LoopState> {
        let from = self.current_state;

        let to = match (from, &event) {
            (LoopState::Preview, LoopEvent::PuckDropped) => LoopState::Live,
            (LoopState::Preview | LoopState::Live, LoopEvent::FinalConfirmed) => LoopState::Final,
            (LoopState::Final, LoopEvent::ChecklistSettled) => LoopState::Done,
            (_, LoopEvent::Cancelled) => LoopState::Done,
            _ => {
                return Err(BotError::InvalidStateTransition {
                    from: from.to_string(),
                    to: format!("{:?}", event),
                });
            }
        };

        self.transition_history.push(LoopTransition {
            from,
            to,
            event: format!("{:?}", event),
            timestamp: chrono::Utc::now().timestamp_millis(),
        });

        self.current_state = to;
        Ok(to)
    }

    pub fn state(&self) -> LoopState {
        self.current_state
    }

    pub fn is_done(&self) -> bool {
        self.current_state == LoopState::Done
    }

    pub fn history(&self) -> &[LoopTransition] {
        &self.transition_history
    }
}

impl Default for LoopStateMachine {
    fn default() -> Self {
        Self::new(LoopState::Preview)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_flow() {
        let mut sm = LoopStateMachine::default();
        assert_eq!(sm.state(), LoopState::Preview);

        sm.transition(LoopEvent::PuckDropped).unwrap();
        assert_eq!(sm.state(), LoopState::Live);

        sm.transition(LoopEvent::FinalConfirmed).unwrap();
        assert_eq!(sm.state(), LoopState::Final);

        sm.transition(LoopEvent::ChecklistSettled).unwrap();
        assert!(sm.is_done());

        let history = sm.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].from, LoopState::Preview);
        assert_eq!(history[2].to, LoopState::Done);
    }

    #[test]
    fn test_no_regression() {
        let mut sm = LoopStateMachine::new(LoopState::Live);
        assert!(sm.transition(LoopEvent::PuckDropped).is_err());

        sm.transition(LoopEvent::FinalConfirmed).unwrap();
        let err = sm.transition(LoopEvent::FinalConfirmed).unwrap_err();
        assert!(matches!(err, BotError::InvalidStateTransition { .. }));
        assert_eq!(sm.state(), LoopState::Final);
    }

    #[test]
    fn test_cancel_from_anywhere() {
        for start in [LoopState::Preview, LoopState::Live, LoopState::Final] {
            let mut sm = LoopStateMachine::new(start);
            assert_eq!(sm.transition(LoopEvent::Cancelled).unwrap(), LoopState::Done);
        }
    }

    #[test]
    fn test_entry_from_feed_state() {
        assert_eq!(LoopState::from(GameState::Live), LoopState::Live);
        assert_eq!(LoopState::from(GameState::Final), LoopState::Final);
    }
}
