//! Play-by-play feed
//!
//! [`SnapshotFetcher`] is the only I/O seam the engine sees. Every fetch
//! returns the whole document; the engine computes deltas itself.

pub mod classifier;
pub mod client;
pub mod retry;
pub mod schema;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Game, GameState, GameType, HomeAway, LinescoreState, PlayerRef, Position, Roster,
    RosterEntry, Team, TeamIdentity, TeamLine,
};
use crate::error::{BotError, Result};

pub use classifier::classify;
pub use client::{season_id, NhlApiClient};
pub use retry::{RetryConfig, RetryingFetcher};
pub use schema::RawPlay;

use schema::{LiveFeed, RawLineTeam, TeamInfo};

/// Fetches the full live document for a game
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch(&self, game_id: u64) -> Result<PlayByPlayDocument>;
}

/// Players on the ice for each side, from the boxscore
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnIce {
    pub home: Vec<u64>,
    pub away: Vec<u64>,
}

impl OnIce {
    pub fn side(&self, side: HomeAway) -> &[u64] {
        match side {
            HomeAway::Home => &self.home,
            HomeAway::Away => &self.away,
        }
    }
}

/// One parsed snapshot of the live feed
#[derive(Debug, Clone)]
pub struct PlayByPlayDocument {
    pub game_id: u64,
    pub game_state: GameState,
    pub detailed_state: String,
    pub game_type: GameType,
    pub start_time: DateTime<Utc>,
    pub venue: String,
    pub home: TeamIdentity,
    pub away: TeamIdentity,
    /// Ordered by event index
    pub plays: Vec<RawPlay>,
    pub linescore: LinescoreState,
    pub on_ice: OnIce,
    pub roster: Roster,
    /// First, second, third; `None` until all three are published
    pub three_stars: Option<[PlayerRef; 3]>,
}

fn identity(team: &TeamInfo) -> TeamIdentity {
    TeamIdentity {
        id: team.id,
        full_name: team.name.clone(),
        short_name: if team.team_name.is_empty() {
            team.name.clone()
        } else {
            team.team_name.clone()
        },
        tri_code: team.abbreviation.clone(),
    }
}

fn team_line(line: &RawLineTeam) -> TeamLine {
    TeamLine {
        goals: line.goals,
        shots: line.shots_on_goal,
        skaters: line.num_skaters,
        power_play: line.power_play,
        goalie_pulled: line.goalie_pulled,
    }
}

impl PlayByPlayDocument {
    pub fn from_json(body: &str) -> Result<Self> {
        let feed: LiveFeed = serde_json::from_str(body)?;
        Ok(Self::from_feed(feed))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let feed: LiveFeed = serde_json::from_value(value)?;
        Ok(Self::from_feed(feed))
    }

    fn from_feed(feed: LiveFeed) -> Self {
        let data = feed.game_data;
        let live = feed.live_data;

        let game_id = if feed.game_pk != 0 {
            feed.game_pk
        } else {
            data.game.pk
        };

        let venue = data
            .venue
            .as_ref()
            .or(data.teams.home.venue.as_ref())
            .map(|v| v.name.clone())
            .unwrap_or_default();

        let roster = Roster::new(data.players.values().map(|p| RosterEntry {
            id: p.id,
            full_name: p.full_name.clone(),
            last_name: p.last_name.clone(),
            position: p.primary_position.as_ref().and_then(|pos| {
                Position::from_feed(&pos.kind).or_else(|| Position::from_feed(&pos.code))
            }),
            team_tri_code: p.current_team.as_ref().and_then(|t| t.tri_code.clone()),
        }));

        let ls = &live.linescore;
        let linescore = LinescoreState {
            current_period: ls.current_period,
            period_ordinal: ls.current_period_ordinal.clone(),
            time_remaining: ls.current_period_time_remaining.clone(),
            in_intermission: ls.intermission_info.in_intermission,
            intermission_remaining_seconds: ls.intermission_info.intermission_time_remaining,
            home: team_line(&ls.teams.home),
            away: team_line(&ls.teams.away),
        };

        let star = |s: &Option<schema::PersonRef>| {
            s.as_ref().map(|p| PlayerRef {
                id: p.id,
                name: p.full_name.clone(),
                season_total: None,
            })
        };
        let d = &live.decisions;
        let three_stars = match (star(&d.first_star), star(&d.second_star), star(&d.third_star)) {
            (Some(a), Some(b), Some(c)) => Some([a, b, c]),
            _ => None,
        };

        let mut plays = live.plays.all_plays;
        plays.sort_by_key(|p| p.index());

        Self {
            game_id,
            game_state: GameState::from_feed(&data.status.abstract_game_state),
            detailed_state: data.status.detailed_state.clone(),
            game_type: GameType::from_feed(&data.game.game_type),
            start_time: data.datetime.date_time.unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            venue,
            home: identity(&data.teams.home),
            away: identity(&data.teams.away),
            plays,
            linescore,
            on_ice: OnIce {
                home: live.boxscore.teams.home.on_ice.clone(),
                away: live.boxscore.teams.away.on_ice.clone(),
            },
            roster,
            three_stars,
        }
    }

    /// Raw play at `index`, if the feed still carries it
    pub fn play(&self, index: u32) -> Option<&RawPlay> {
        self.plays
            .binary_search_by_key(&index, |p| p.index())
            .ok()
            .map(|pos| &self.plays[pos])
    }

    pub fn last_index(&self) -> Option<u32> {
        self.plays.last().map(|p| p.index())
    }
}

impl Game {
    /// Builds the game aggregate from its first snapshot
    pub fn from_document(doc: &PlayByPlayDocument, preferred_team_id: u64) -> Result<Self> {
        let preferred = if doc.home.id == preferred_team_id {
            HomeAway::Home
        } else if doc.away.id == preferred_team_id {
            HomeAway::Away
        } else {
            return Err(BotError::Schedule(format!(
                "team {} does not play in game {} ({} @ {})",
                preferred_team_id, doc.game_id, doc.away.full_name, doc.home.full_name
            )));
        };

        let mut game = Game::new(
            doc.game_id,
            doc.game_type,
            doc.start_time,
            doc.venue.clone(),
            Team::new(doc.home.clone(), HomeAway::Home),
            Team::new(doc.away.clone(), HomeAway::Away),
            preferred,
        );
        game.game_state = doc.game_state;
        // a pull already in effect at startup is not a new edge
        game.home.goalie_pulled = doc.linescore.home.goalie_pulled;
        game.away.goalie_pulled = doc.linescore.away.goalie_pulled;
        Ok(game)
    }
}
