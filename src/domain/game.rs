//! Game aggregate
//!
//! Owns both teams, the period and (eventually) the shootout. Mutated once
//! per poll cycle by the linescore and the reconciliation engine, read by the
//! formatters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

use super::play::{EventIndex, Play};
use super::shootout::{Shootout, Side};
use super::state::GameState;
use super::team::{detect_edge, HomeAway, Team};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameType {
    Preseason,
    Regular,
    Playoff,
}

impl GameType {
    pub fn from_feed(code: &str) -> Self {
        match code.to_ascii_uppercase().as_str() {
            "PR" | "1" => GameType::Preseason,
            "P" | "3" => GameType::Playoff,
            _ => GameType::Regular,
        }
    }

    /// Regular-season style games end in a shootout after one overtime
    pub fn has_shootout(&self) -> bool {
        !matches!(self, GameType::Playoff)
    }
}

/// Skater relationship from the preferred team's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Strength {
    Even,
    PowerPlay,
    PenaltyKill,
    FourOnFour,
    ThreeOnThree,
}

impl Strength {
    /// Derived from skater counts, never read from the feed
    pub fn derive(preferred_skaters: u8, other_skaters: u8) -> Self {
        match (preferred_skaters, other_skaters) {
            (p, o) if p == o && p == 4 => Strength::FourOnFour,
            (p, o) if p == o && p == 3 => Strength::ThreeOnThree,
            (p, o) if p == o => Strength::Even,
            (p, o) if p > o => Strength::PowerPlay,
            _ => Strength::PenaltyKill,
        }
    }

    /// Equal skaters on both sides
    pub fn is_even(&self) -> bool {
        matches!(
            self,
            Strength::Even | Strength::FourOnFour | Strength::ThreeOnThree
        )
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Even => write!(f, "Even"),
            Self::PowerPlay => write!(f, "PP"),
            Self::PenaltyKill => write!(f, "PK"),
            Self::FourOnFour => write!(f, "4v4"),
            Self::ThreeOnThree => write!(f, "3v3"),
        }
    }
}

/// Per-team slice of the linescore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLine {
    pub goals: u32,
    pub shots: u32,
    pub skaters: u8,
    pub power_play: bool,
    pub goalie_pulled: bool,
}

/// Linescore as parsed from one snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinescoreState {
    pub current_period: u8,
    pub period_ordinal: String,
    pub time_remaining: String,
    pub in_intermission: bool,
    pub intermission_remaining_seconds: u32,
    pub home: TeamLine,
    pub away: TeamLine,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub current: u8,
    pub ordinal: String,
    pub time_remaining: String,
    pub in_intermission: bool,
    pub intermission_remaining_seconds: u32,
    /// Periods whose starting lineup has been posted
    pub lineups_posted: BTreeSet<u8>,
}

/// What changed when a linescore was applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinescoreChanges {
    pub goalie_pulled: Vec<HomeAway>,
    pub penalty_killed: bool,
    /// (preferred, other) before the update
    pub skaters_before: (u8, u8),
    pub strength_before: Strength,
}

/// End-of-game posts, each sent once
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalChecklist {
    pub final_score_sent: bool,
    pub three_stars_sent: bool,
    pub stars_attempts: u32,
}

impl FinalChecklist {
    pub fn is_complete(&self) -> bool {
        self.final_score_sent && self.three_stars_sent
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PregameChecklist {
    pub preview_sent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub game_id: u64,
    pub game_type: GameType,
    pub start_time: DateTime<Utc>,
    pub venue: String,
    pub home: Team,
    pub away: Team,
    pub preferred: HomeAway,
    /// High-water mark; `None` until the first play is processed
    pub last_processed_event_index: Option<EventIndex>,
    pub game_state: GameState,
    pub power_play_strength: Strength,
    /// Assist re-checks spent on the goal currently being resolved
    pub assists_check_counter: u32,
    pub period: Period,
    pub shootout: Option<Shootout>,
    pub game_end_seen: bool,
    pub final_polls_without_game_end: u32,
    pub final_checklist: FinalChecklist,
    pub pregame_checklist: PregameChecklist,
}

impl Game {
    pub fn new(
        game_id: u64,
        game_type: GameType,
        start_time: DateTime<Utc>,
        venue: impl Into<String>,
        home: Team,
        away: Team,
        preferred: HomeAway,
    ) -> Self {
        Self {
            game_id,
            game_type,
            start_time,
            venue: venue.into(),
            home,
            away,
            preferred,
            last_processed_event_index: None,
            game_state: GameState::Preview,
            power_play_strength: Strength::Even,
            assists_check_counter: 0,
            period: Period::default(),
            shootout: None,
            game_end_seen: false,
            final_polls_without_game_end: 0,
            final_checklist: FinalChecklist::default(),
            pregame_checklist: PregameChecklist::default(),
        }
    }

    pub fn team(&self, side: HomeAway) -> &Team {
        match side {
            HomeAway::Home => &self.home,
            HomeAway::Away => &self.away,
        }
    }

    pub fn team_mut(&mut self, side: HomeAway) -> &mut Team {
        match side {
            HomeAway::Home => &mut self.home,
            HomeAway::Away => &mut self.away,
        }
    }

    pub fn preferred_team(&self) -> &Team {
        self.team(self.preferred)
    }

    pub fn other_team(&self) -> &Team {
        self.team(self.preferred.opposite())
    }

    pub fn preferred_team_mut(&mut self) -> &mut Team {
        self.team_mut(self.preferred)
    }

    /// Which side a feed team id belongs to
    pub fn side_of_team(&self, team_id: u64) -> Option<HomeAway> {
        if self.home.id() == team_id {
            Some(HomeAway::Home)
        } else if self.away.id() == team_id {
            Some(HomeAway::Away)
        } else {
            None
        }
    }

    pub fn side(&self, home_away: HomeAway) -> Side {
        Side::of(home_away, self.preferred)
    }

    /// "#NYRvsNJD"
    pub fn hashtag(&self) -> String {
        format!(
            "#{}vs{}",
            self.away.identity.tri_code, self.home.identity.tri_code
        )
    }

    /// (preferred, other) score as recorded on a play
    pub fn scores_on(&self, play: &Play) -> (u32, u32) {
        match self.preferred {
            HomeAway::Home => (play.home_score, play.away_score),
            HomeAway::Away => (play.away_score, play.home_score),
        }
    }

    /// Time until the scheduled start (negative once it has passed)
    pub fn countdown(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.start_time.signed_duration_since(now)
    }

    /// Moves the high-water mark forward, never back
    pub fn advance_high_water(&mut self, index: EventIndex) {
        match self.last_processed_event_index {
            Some(last) if last >= index => {}
            _ => self.last_processed_event_index = Some(index),
        }
    }

    /// Applies a feed state if it moves the game forward
    pub fn transition_state(&mut self, target: GameState) -> bool {
        if self.game_state.can_transition_to(target) {
            info!(game_id = self.game_id, "game state {} -> {}", self.game_state, target);
            self.game_state = target;
            true
        } else {
            false
        }
    }

    pub fn shootout_mut(&mut self) -> &mut Shootout {
        self.shootout.get_or_insert_with(Shootout::default)
    }

    /// Updates score, shots, skaters and flags from a snapshot's linescore.
    ///
    /// Edge detection runs against the values held before this call; the new
    /// values are assigned afterwards.
    pub fn apply_linescore(&mut self, linescore: &LinescoreState) -> LinescoreChanges {
        let skaters_before = (
            self.preferred_team().skaters_on_ice,
            self.other_team().skaters_on_ice,
        );
        let strength_before = self.power_play_strength;

        let mut goalie_pulled = Vec::new();
        for (side, line) in [
            (HomeAway::Home, &linescore.home),
            (HomeAway::Away, &linescore.away),
        ] {
            let team = self.team_mut(side);
            if detect_edge(team.goalie_pulled, line.goalie_pulled) {
                goalie_pulled.push(side);
            }
            team.goalie_pulled = line.goalie_pulled;
            team.score = line.goals;
            team.shots = line.shots;
            team.power_play = line.power_play;
            if line.skaters > 0 {
                team.skaters_on_ice = line.skaters;
            }
        }

        self.power_play_strength = Strength::derive(
            self.preferred_team().skaters_on_ice,
            self.other_team().skaters_on_ice,
        );
        let penalty_killed =
            strength_before == Strength::PenaltyKill && self.power_play_strength.is_even();
        if self.power_play_strength != strength_before {
            debug!(
                "strength {} -> {} (skaters {:?} -> {}v{})",
                strength_before,
                self.power_play_strength,
                skaters_before,
                self.preferred_team().skaters_on_ice,
                self.other_team().skaters_on_ice
            );
        }

        self.period.current = linescore.current_period;
        self.period.ordinal = linescore.period_ordinal.clone();
        self.period.time_remaining = linescore.time_remaining.clone();
        self.period.in_intermission = linescore.in_intermission;
        self.period.intermission_remaining_seconds = linescore.intermission_remaining_seconds;

        LinescoreChanges {
            goalie_pulled,
            penalty_killed,
            skaters_before,
            strength_before,
        }
    }

    /// Goals credited to a team match its score, allowing for the extra
    /// point a shootout winner receives.
    pub fn goal_count_consistent(&self, side: HomeAway) -> bool {
        let team = self.team(side);
        let recorded = team.goals.len() as u32;
        if recorded == team.score {
            return true;
        }
        match &self.shootout {
            Some(shootout) => {
                let ours = shootout.goals(self.side(side));
                let theirs = shootout.goals(self.side(side.opposite()));
                ours > theirs && recorded + 1 == team.score
            }
            None => false,
        }
    }
}
