use serde::{Deserialize, Serialize};

use super::team::HomeAway;
use crate::adapters::DeliveryRef;

/// Running shootout tally, present once the game reaches a shootout
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shootout {
    /// true = scored, per attempt, in order
    pub preferred: Vec<bool>,
    pub other: Vec<bool>,
    pub attempts: u32,
    /// Last shootout post, so every attempt threads under the previous one
    pub last_reference: Option<DeliveryRef>,
}

impl Shootout {
    pub fn record(&mut self, side: Side, scored: bool) {
        match side {
            Side::Preferred => self.preferred.push(scored),
            Side::Other => self.other.push(scored),
        }
        self.attempts += 1;
    }

    pub fn goals(&self, side: Side) -> usize {
        let attempts = match side {
            Side::Preferred => &self.preferred,
            Side::Other => &self.other,
        };
        attempts.iter().filter(|s| **s).count()
    }

    /// "✅ - ❌ - ✅"
    pub fn markers(&self, side: Side) -> String {
        let attempts = match side {
            Side::Preferred => &self.preferred,
            Side::Other => &self.other,
        };
        attempts
            .iter()
            .map(|scored| if *scored { "✅" } else { "❌" })
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

/// A team seen from the bot's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Preferred,
    Other,
}

impl Side {
    pub fn of(team: HomeAway, preferred: HomeAway) -> Self {
        if team == preferred {
            Side::Preferred
        } else {
            Side::Other
        }
    }
}
