//! Typed plays
//!
//! A [`Play`] is one classified entry of the play-by-play feed. The feed owns
//! the `index`; this crate never renumbers plays.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable per-game ordinal assigned by the feed
pub type EventIndex = u32;

/// Kind of period a play happened in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodType {
    Regular,
    Overtime,
    Shootout,
}

impl PeriodType {
    pub fn from_feed(value: &str) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "OVERTIME" | "OT" => PeriodType::Overtime,
            "SHOOTOUT" | "SO" => PeriodType::Shootout,
            _ => PeriodType::Regular,
        }
    }
}

/// A player as referenced by a play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: u64,
    pub name: String,
    /// Season total for the stat this play credits (goals for a scorer, assists for an assister)
    pub season_total: Option<u32>,
}

impl PlayerRef {
    /// "Name (12)" when the season total is known, otherwise just the name
    pub fn with_total(&self) -> String {
        match self.season_total {
            Some(total) => format!("{} ({})", self.name, total),
            None => self.name.clone(),
        }
    }
}

/// Strength a goal was scored at, as reported by the feed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoalStrength {
    Even,
    PowerPlay,
    ShortHanded,
    Other(String),
}

impl GoalStrength {
    pub fn from_feed(name: &str) -> Self {
        match name.to_ascii_lowercase().replace(['-', ' '], "").as_str() {
            "even" | "ev" | "" => GoalStrength::Even,
            "powerplay" | "pp" | "ppg" => GoalStrength::PowerPlay,
            "shorthanded" | "sh" | "shg" => GoalStrength::ShortHanded,
            _ => GoalStrength::Other(name.to_string()),
        }
    }

    pub fn is_even(&self) -> bool {
        matches!(self, GoalStrength::Even)
    }
}

impl fmt::Display for GoalStrength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Even => write!(f, "Even"),
            Self::PowerPlay => write!(f, "Power Play"),
            Self::ShortHanded => write!(f, "Shorthanded"),
            Self::Other(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDetails {
    pub team_id: u64,
    pub scorer: PlayerRef,
    /// Primary assist first
    pub assists: Vec<PlayerRef>,
    pub goalie: Option<PlayerRef>,
    pub strength: GoalStrength,
    pub empty_net: bool,
    pub shot_type: Option<String>,
}

impl GoalDetails {
    pub fn assist_ids(&self) -> Vec<u64> {
        self.assists.iter().map(|a| a.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltyDetails {
    pub team_id: u64,
    pub committed_by: PlayerRef,
    pub drawn_by: Option<PlayerRef>,
    pub served_by: Option<PlayerRef>,
    pub infraction: String,
    pub severity: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    Scored,
    Saved,
    Missed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShootoutAttempt {
    pub team_id: u64,
    pub shooter: PlayerRef,
    pub goalie: Option<PlayerRef>,
    pub outcome: ShotOutcome,
    /// "crossbar" / "post" when the description says the shot rang iron
    pub hit_iron: Option<String>,
}

/// Typed event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Goal(GoalDetails),
    Penalty(PenaltyDetails),
    Faceoff,
    Hit,
    Shot,
    Stoppage,
    PeriodReady,
    PeriodStart,
    PeriodEnd,
    GameEnd,
    ShootoutAttempt(ShootoutAttempt),
    /// Any tag the classifier does not know
    Generic { tag: String },
}

impl EventKind {
    pub fn label(&self) -> &str {
        match self {
            Self::Goal(_) => "GOAL",
            Self::Penalty(_) => "PENALTY",
            Self::Faceoff => "FACEOFF",
            Self::Hit => "HIT",
            Self::Shot => "SHOT",
            Self::Stoppage => "STOPPAGE",
            Self::PeriodReady => "PERIOD_READY",
            Self::PeriodStart => "PERIOD_START",
            Self::PeriodEnd => "PERIOD_END",
            Self::GameEnd => "GAME_END",
            Self::ShootoutAttempt(_) => "SHOOTOUT_ATTEMPT",
            Self::Generic { tag } => tag.as_str(),
        }
    }
}

/// A single classified play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Play {
    pub index: EventIndex,
    pub kind: EventKind,
    pub period: u8,
    pub period_type: PeriodType,
    /// "1st", "OT", "2OT", "SO"
    pub period_ordinal: String,
    /// "12:34"
    pub time_remaining: String,
    pub wall_clock: Option<DateTime<Utc>>,
    pub home_score: u32,
    pub away_score: u32,
    pub description: String,
}

impl Play {
    pub fn goal(&self) -> Option<&GoalDetails> {
        match &self.kind {
            EventKind::Goal(goal) => Some(goal),
            _ => None,
        }
    }

    /// Whether the play happened within `window` of `now`.
    ///
    /// Plays without a timestamp count as recent.
    pub fn is_recent(&self, now: DateTime<Utc>, window: Duration) -> bool {
        match self.wall_clock {
            Some(at) => {
                let age = now.signed_duration_since(at);
                match age.to_std() {
                    Ok(age) => age < window,
                    // Timestamp ahead of our clock
                    Err(_) => true,
                }
            }
            None => true,
        }
    }
}
