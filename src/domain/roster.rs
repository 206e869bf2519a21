//! Player lookup built from the feed's player directory

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{BotError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Forward,
    Defense,
    Goalie,
}

impl Position {
    /// Maps the feed's position type ("Forward", "Defenseman", "Goalie") or code ("C", "D", "G")
    pub fn from_feed(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "FORWARD" | "C" | "L" | "R" | "LW" | "RW" => Some(Position::Forward),
            "DEFENSEMAN" | "DEFENSE" | "D" => Some(Position::Defense),
            "GOALIE" | "G" => Some(Position::Goalie),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: u64,
    pub full_name: String,
    pub last_name: String,
    pub position: Option<Position>,
    pub team_tri_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    players: HashMap<u64, RosterEntry>,
}

impl Roster {
    pub fn new(entries: impl IntoIterator<Item = RosterEntry>) -> Self {
        Self {
            players: entries.into_iter().map(|e| (e.id, e)).collect(),
        }
    }

    pub fn resolve(&self, player_id: u64) -> Result<&RosterEntry> {
        self.players
            .get(&player_id)
            .ok_or(BotError::MissingRosterEntry(player_id))
    }

    pub fn display_name(&self, player_id: u64) -> Result<&str> {
        self.resolve(player_id).map(|e| e.full_name.as_str())
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
