//! Game lifecycle services
//!
//! Startup resolution of the game and the poll loop that drives it.

pub mod poll_loop;
pub mod setup;
pub mod state_machine;

pub use poll_loop::{GameLoop, LoopOutcome, LoopSettings};
pub use setup::{load_lead_records, prepare_game, resolve_game_id};
pub use state_machine::{LoopEvent, LoopState, LoopStateMachine, LoopTransition};
