use serde::{Deserialize, Serialize};

/// Skater situation a penalty leaves the preferred team in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PenaltyStrength {
    FourOnFour,
    ThreeOnThree,
    PowerPlay,
    TwoManAdvantage,
    FourOnThreePowerPlay,
    PenaltyKill,
    TwoManDisadvantage,
    FourOnThreePenaltyKill,
}

impl PenaltyStrength {
    /// Reads the skater counts after the penalty is applied, from the
    /// preferred team's side. `None` for full strength or unusual counts.
    pub fn from_skaters(preferred: u8, other: u8) -> Option<Self> {
        let strength = match (preferred, other) {
            (4, 4) => PenaltyStrength::FourOnFour,
            (3, 3) => PenaltyStrength::ThreeOnThree,
            (5, 4) => PenaltyStrength::PowerPlay,
            (5, 3) => PenaltyStrength::TwoManAdvantage,
            (4, 3) => PenaltyStrength::FourOnThreePowerPlay,
            (4, 5) => PenaltyStrength::PenaltyKill,
            (3, 5) => PenaltyStrength::TwoManDisadvantage,
            (3, 4) => PenaltyStrength::FourOnThreePenaltyKill,
            _ => return None,
        };
        Some(strength)
    }

    pub fn phrase(&self, preferred_short_name: &str) -> String {
        let team = preferred_short_name;
        match self {
            Self::FourOnFour => "Teams will skate 4-on-4.".to_string(),
            Self::ThreeOnThree => "Teams will skate 3-on-3.".to_string(),
            Self::PowerPlay => format!("{team} are headed to the power play!"),
            Self::TwoManAdvantage => format!("{team} will have a two-man advantage!"),
            Self::FourOnThreePowerPlay => format!("{team} are headed to a 4-on-3 power play!"),
            Self::PenaltyKill => format!("{team} are headed to the penalty kill!"),
            Self::TwoManDisadvantage => {
                format!("{team} will have to kill off a two-man advantage!")
            }
            Self::FourOnThreePenaltyKill => {
                format!("{team} will have a 4-on-3 PK to contend with!")
            }
        }
    }
}
