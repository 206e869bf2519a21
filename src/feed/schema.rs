//! Live-feed JSON deserialization structs
//!
//! Mirrors the subset of `/api/v1/game/{id}/feed/live` the bot reads. Every
//! block the feed is known to omit early in a game carries `#[serde(default)]`.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HomeAwayOf<T> {
    pub home: T,
    pub away: T,
}

// ── gameData ────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveFeed {
    #[serde(default)]
    pub game_pk: u64,
    pub game_data: GameData,
    #[serde(default)]
    pub live_data: LiveData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameData {
    #[serde(default)]
    pub game: GameInfo,
    #[serde(default)]
    pub datetime: DateTimeInfo,
    pub status: StatusInfo,
    pub teams: HomeAwayOf<TeamInfo>,
    /// Keyed "ID8478401"
    #[serde(default)]
    pub players: HashMap<String, PlayerInfo>,
    #[serde(default)]
    pub venue: Option<VenueInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GameInfo {
    #[serde(default)]
    pub pk: u64,
    /// "PR", "R", "P"
    #[serde(rename = "type", default)]
    pub game_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateTimeInfo {
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    pub abstract_game_state: String,
    #[serde(default)]
    pub detailed_state: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamInfo {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub team_name: String,
    #[serde(default)]
    pub abbreviation: String,
    #[serde(default)]
    pub venue: Option<VenueInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VenueInfo {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: u64,
    pub full_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub primary_position: Option<PositionInfo>,
    #[serde(default)]
    pub current_team: Option<TeamRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PositionInfo {
    #[serde(default)]
    pub code: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tri_code: Option<String>,
}

// ── liveData ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveData {
    #[serde(default)]
    pub plays: PlaysBlock,
    #[serde(default)]
    pub linescore: RawLinescore,
    #[serde(default)]
    pub boxscore: RawBoxscore,
    #[serde(default)]
    pub decisions: RawDecisions,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaysBlock {
    #[serde(default)]
    pub all_plays: Vec<RawPlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLinescore {
    #[serde(default)]
    pub current_period: u8,
    #[serde(default)]
    pub current_period_ordinal: String,
    #[serde(default)]
    pub current_period_time_remaining: String,
    #[serde(default)]
    pub intermission_info: IntermissionInfo,
    #[serde(default)]
    pub power_play_strength: String,
    #[serde(default)]
    pub has_shootout: bool,
    #[serde(default)]
    pub teams: HomeAwayOf<RawLineTeam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermissionInfo {
    #[serde(default)]
    pub intermission_time_remaining: u32,
    #[serde(default)]
    pub in_intermission: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLineTeam {
    #[serde(default)]
    pub goals: u32,
    #[serde(default)]
    pub shots_on_goal: u32,
    #[serde(default)]
    pub goalie_pulled: bool,
    #[serde(default)]
    pub num_skaters: u8,
    #[serde(default)]
    pub power_play: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBoxscore {
    #[serde(default)]
    pub teams: HomeAwayOf<BoxscoreTeam>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxscoreTeam {
    #[serde(default)]
    pub on_ice: Vec<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDecisions {
    #[serde(default)]
    pub first_star: Option<PersonRef>,
    #[serde(default)]
    pub second_star: Option<PersonRef>,
    #[serde(default)]
    pub third_star: Option<PersonRef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonRef {
    pub id: u64,
    #[serde(default)]
    pub full_name: String,
}

// ── allPlays[] ──────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct RawPlay {
    #[serde(default)]
    pub players: Vec<RawPlayPlayer>,
    pub result: RawResult,
    pub about: RawAbout,
    #[serde(default)]
    pub team: Option<TeamRef>,
}

impl RawPlay {
    pub fn index(&self) -> u32 {
        self.about.event_idx
    }

    /// First player credited with the given role ("Scorer", "Goalie", ...)
    pub fn player(&self, role: &str) -> Option<&RawPlayPlayer> {
        self.players
            .iter()
            .find(|p| p.player_type.eq_ignore_ascii_case(role))
    }

    pub fn players_with(&self, role: &str) -> impl Iterator<Item = &RawPlayPlayer> + '_ {
        let role = role.to_string();
        self.players
            .iter()
            .filter(move |p| p.player_type.eq_ignore_ascii_case(&role))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPlayPlayer {
    pub player: PersonRef,
    pub player_type: String,
    #[serde(default)]
    pub season_total: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResult {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub event_code: String,
    #[serde(default)]
    pub event_type_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub secondary_type: Option<String>,
    #[serde(default)]
    pub penalty_severity: Option<String>,
    #[serde(default)]
    pub penalty_minutes: Option<u32>,
    #[serde(default)]
    pub strength: Option<RawStrength>,
    #[serde(default)]
    pub empty_net: Option<bool>,
    /// Numeric event code, only present on some feed revisions
    #[serde(default)]
    pub type_code: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStrength {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAbout {
    pub event_idx: u32,
    #[serde(default)]
    pub event_id: u64,
    #[serde(default)]
    pub period: u8,
    #[serde(default)]
    pub period_type: String,
    #[serde(default)]
    pub ordinal_num: String,
    #[serde(default)]
    pub period_time: String,
    #[serde(default)]
    pub period_time_remaining: String,
    #[serde(default)]
    pub date_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub goals: RawGoals,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGoals {
    #[serde(default)]
    pub away: u32,
    #[serde(default)]
    pub home: u32,
}
