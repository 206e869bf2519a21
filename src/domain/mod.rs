pub mod game;
pub mod play;
pub mod roster;
pub mod shootout;
pub mod state;
pub mod team;

pub use game::{
    FinalChecklist, Game, GameType, LinescoreChanges, LinescoreState, Period, PregameChecklist,
    Strength, TeamLine,
};
pub use play::{
    EventIndex, EventKind, GoalDetails, GoalStrength, PenaltyDetails, PeriodType, Play, PlayerRef,
    ShootoutAttempt, ShotOutcome,
};
pub use roster::{Position, Roster, RosterEntry};
pub use shootout::{Shootout, Side};
pub use state::GameState;
pub use team::{detect_edge, GoalRecord, HomeAway, LeadRecord, Team, TeamIdentity};
