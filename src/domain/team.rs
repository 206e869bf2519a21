//! Team aggregate

use serde::{Deserialize, Serialize};
use std::fmt;

use super::play::{EventIndex, GoalDetails, PlayerRef};

/// Which side of the ice a team plays on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn opposite(self) -> Self {
        match self {
            HomeAway::Home => HomeAway::Away,
            HomeAway::Away => HomeAway::Home,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HomeAway::Home => "home",
            HomeAway::Away => "away",
        }
    }
}

impl fmt::Display for HomeAway {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamIdentity {
    pub id: u64,
    /// "New Jersey Devils"
    pub full_name: String,
    /// "Devils"
    pub short_name: String,
    /// "NJD"
    pub tri_code: String,
}

/// A goal credited to a team during this game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalRecord {
    pub index: EventIndex,
    pub scorer: PlayerRef,
    pub assists: Vec<PlayerRef>,
    pub period: u8,
    pub time_remaining: String,
    /// Consecutive polls this goal was absent from the feed
    pub missing_polls: u32,
}

impl GoalRecord {
    pub fn new(index: EventIndex, goal: &GoalDetails, period: u8, time_remaining: &str) -> Self {
        Self {
            index,
            scorer: goal.scorer.clone(),
            assists: goal.assists.clone(),
            period,
            time_remaining: time_remaining.to_string(),
            missing_polls: 0,
        }
    }
}

/// Season record in games where the team led after a given period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub wins: u32,
    pub losses: u32,
    pub ot_losses: u32,
}

impl LeadRecord {
    pub fn games(&self) -> u32 {
        self.wins + self.losses + self.ot_losses
    }

    /// Win percentage, `None` before the first game of the sample
    pub fn win_pct(&self) -> Option<f64> {
        match self.games() {
            0 => None,
            games => Some(self.wins as f64 / games as f64 * 100.0),
        }
    }
}

impl fmt::Display for LeadRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}-{}", self.wins, self.losses, self.ot_losses)
    }
}

/// One of the two teams in a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub identity: TeamIdentity,
    pub home_away: HomeAway,
    pub score: u32,
    pub shots: u32,
    pub skaters_on_ice: u8,
    pub power_play: bool,
    pub goalie_pulled: bool,
    /// Goals in the order they were recorded
    pub goals: Vec<GoalRecord>,
    /// Record when leading after the 1st and 2nd period
    pub lead_after: [Option<LeadRecord>; 2],
}

impl Team {
    pub fn new(identity: TeamIdentity, home_away: HomeAway) -> Self {
        Self {
            identity,
            home_away,
            score: 0,
            shots: 0,
            skaters_on_ice: 5,
            power_play: false,
            goalie_pulled: false,
            goals: Vec::new(),
            lead_after: [None, None],
        }
    }

    pub fn id(&self) -> u64 {
        self.identity.id
    }

    pub fn short_name(&self) -> &str {
        &self.identity.short_name
    }

    /// Whether a goal with this event index is already credited to the team
    pub fn has_goal(&self, index: EventIndex) -> bool {
        self.goals.iter().any(|g| g.index == index)
    }

    pub fn goal_mut(&mut self, index: EventIndex) -> Option<&mut GoalRecord> {
        self.goals.iter_mut().find(|g| g.index == index)
    }

    /// Goals this player has already scored in the game
    pub fn goals_by(&self, player_id: u64) -> usize {
        self.goals.iter().filter(|g| g.scorer.id == player_id).count()
    }

    pub fn remove_goal(&mut self, index: EventIndex) -> Option<GoalRecord> {
        let pos = self.goals.iter().position(|g| g.index == index)?;
        Some(self.goals.remove(pos))
    }

    pub fn lead_record_after(&self, period: u8) -> Option<LeadRecord> {
        match period {
            1 => self.lead_after[0],
            2 => self.lead_after[1],
            _ => None,
        }
    }
}

/// Rising-edge detector for boolean feed flags
pub fn detect_edge(old: bool, new: bool) -> bool {
    !old && new
}
