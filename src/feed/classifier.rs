//! Raw play → typed [`Play`]
//!
//! Pure mapping, no cache or game state. Resolution order is the event-type
//! tag, then the numeric event code, then `Generic`. Unknown vocabulary never
//! fails; only a goal or penalty missing its principal player does.

use crate::domain::{
    EventKind, GameType, GoalDetails, GoalStrength, PenaltyDetails, PeriodType, Play, PlayerRef,
    ShootoutAttempt, ShotOutcome,
};
use crate::error::{BotError, Result};

use super::schema::{RawPlay, RawPlayPlayer};

/// Feed-level kind before payload extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawKind {
    Goal,
    Penalty,
    Faceoff,
    Hit,
    Shot,
    MissedShot,
    BlockedShot,
    Stoppage,
    PeriodReady,
    PeriodStart,
    PeriodEnd,
    GameEnd,
}

fn kind_from_tag(tag: &str) -> Option<RawKind> {
    let kind = match tag {
        "GOAL" | "gamecenterGoal" => RawKind::Goal,
        "PENALTY" | "gamecenterPenalty" => RawKind::Penalty,
        "FACEOFF" | "gamecenterFaceoff" => RawKind::Faceoff,
        "HIT" | "gamecenterHit" => RawKind::Hit,
        "SHOT" | "gamecenterShot" => RawKind::Shot,
        "MISSED_SHOT" | "gamecenterMissedShot" => RawKind::MissedShot,
        "BLOCKED_SHOT" | "gamecenterBlockedShot" => RawKind::BlockedShot,
        "STOP" | "gamecenterStop" => RawKind::Stoppage,
        // the feed has shipped both spellings
        "PERIOD_READY" | "gamecenterPeriodReady" | "gamecenterPeroidReady" => RawKind::PeriodReady,
        "PERIOD_START" | "gamecenterPeriodStart" => RawKind::PeriodStart,
        "PERIOD_END" | "gamecenterPeriodEnd" | "gamecenterPeroidEnd" => RawKind::PeriodEnd,
        "GAME_END" | "gamecenterGameEnd" => RawKind::GameEnd,
        _ => return None,
    };
    Some(kind)
}

fn kind_from_code(code: u32) -> Option<RawKind> {
    let kind = match code {
        502 => RawKind::Faceoff,
        503 => RawKind::Hit,
        505 => RawKind::Goal,
        506 | 537 => RawKind::Shot,
        507 => RawKind::MissedShot,
        508 => RawKind::BlockedShot,
        509 => RawKind::Penalty,
        516 => RawKind::Stoppage,
        520 => RawKind::PeriodStart,
        521 => RawKind::PeriodEnd,
        524 => RawKind::GameEnd,
        _ => return None,
    };
    Some(kind)
}

fn player_ref(p: &RawPlayPlayer) -> PlayerRef {
    PlayerRef {
        id: p.player.id,
        name: p.player.full_name.clone(),
        season_total: p.season_total,
    }
}

fn malformed(raw: &RawPlay, reason: &str) -> BotError {
    BotError::MalformedPlay {
        index: raw.index(),
        reason: reason.to_string(),
    }
}

/// Tag used for plays that fall through to `Generic`
fn generic_tag(raw: &RawPlay) -> String {
    [&raw.result.event_type_id, &raw.result.event]
        .into_iter()
        .find(|s| !s.is_empty())
        .cloned()
        .unwrap_or_else(|| "UNKNOWN".to_string())
}

fn raw_kind(raw: &RawPlay) -> Option<RawKind> {
    kind_from_tag(&raw.result.event_type_id)
        .or_else(|| raw.result.type_code.and_then(kind_from_code))
}

/// Whether the feed marks this play as a regulation or overtime goal,
/// regardless of whether its payload is complete yet
pub fn is_goal(raw: &RawPlay) -> bool {
    raw_kind(raw) == Some(RawKind::Goal)
        && PeriodType::from_feed(&raw.about.period_type) != PeriodType::Shootout
}

/// Classifies one raw play.
pub fn classify(raw: &RawPlay, game_type: GameType) -> Result<Play> {
    let period_type = PeriodType::from_feed(&raw.about.period_type);
    let raw_kind = raw_kind(raw);

    let in_shootout = period_type == PeriodType::Shootout && game_type.has_shootout();

    let kind = match raw_kind {
        Some(k @ (RawKind::Goal | RawKind::Shot | RawKind::MissedShot)) if in_shootout => {
            EventKind::ShootoutAttempt(shootout_attempt(raw, k)?)
        }
        Some(RawKind::Goal) => EventKind::Goal(goal(raw)?),
        Some(RawKind::Penalty) => EventKind::Penalty(penalty(raw)?),
        Some(RawKind::Faceoff) => EventKind::Faceoff,
        Some(RawKind::Hit) => EventKind::Hit,
        Some(RawKind::Shot | RawKind::MissedShot | RawKind::BlockedShot) => EventKind::Shot,
        Some(RawKind::Stoppage) => EventKind::Stoppage,
        Some(RawKind::PeriodReady) => EventKind::PeriodReady,
        Some(RawKind::PeriodStart) => EventKind::PeriodStart,
        Some(RawKind::PeriodEnd) => EventKind::PeriodEnd,
        Some(RawKind::GameEnd) => EventKind::GameEnd,
        None => EventKind::Generic {
            tag: generic_tag(raw),
        },
    };

    Ok(Play {
        index: raw.index(),
        kind,
        period: raw.about.period,
        period_type,
        period_ordinal: raw.about.ordinal_num.clone(),
        time_remaining: raw.about.period_time_remaining.clone(),
        wall_clock: raw.about.date_time,
        home_score: raw.about.goals.home,
        away_score: raw.about.goals.away,
        description: raw.result.description.clone(),
    })
}

fn goal(raw: &RawPlay) -> Result<GoalDetails> {
    let scorer = raw
        .player("Scorer")
        .map(player_ref)
        .ok_or_else(|| malformed(raw, "goal without a scorer"))?;
    let team_id = raw
        .team
        .as_ref()
        .map(|t| t.id)
        .ok_or_else(|| malformed(raw, "goal without a team"))?;

    let strength = raw
        .result
        .strength
        .as_ref()
        .map(|s| {
            if s.name.is_empty() {
                GoalStrength::from_feed(&s.code)
            } else {
                GoalStrength::from_feed(&s.name)
            }
        })
        .unwrap_or(GoalStrength::Even);

    Ok(GoalDetails {
        team_id,
        scorer,
        assists: raw.players_with("Assist").map(player_ref).collect(),
        goalie: raw.player("Goalie").map(player_ref),
        strength,
        empty_net: raw.result.empty_net.unwrap_or(false),
        shot_type: raw.result.secondary_type.clone(),
    })
}

fn penalty(raw: &RawPlay) -> Result<PenaltyDetails> {
    let committed_by = raw
        .player("PenaltyOn")
        .map(player_ref)
        .ok_or_else(|| malformed(raw, "penalty without a penalized player"))?;

    Ok(PenaltyDetails {
        team_id: raw.team.as_ref().map(|t| t.id).unwrap_or_default(),
        committed_by,
        drawn_by: raw.player("DrewBy").map(player_ref),
        served_by: raw.player("ServedBy").map(player_ref),
        infraction: raw
            .result
            .secondary_type
            .clone()
            .unwrap_or_else(|| "an infraction".to_string())
            .to_lowercase(),
        severity: raw
            .result
            .penalty_severity
            .clone()
            .unwrap_or_else(|| "Minor".to_string())
            .to_lowercase(),
        minutes: raw.result.penalty_minutes.unwrap_or(2),
    })
}

fn shootout_attempt(raw: &RawPlay, kind: RawKind) -> Result<ShootoutAttempt> {
    let (role, outcome) = match kind {
        RawKind::Goal => ("Scorer", ShotOutcome::Scored),
        RawKind::Shot => ("Shooter", ShotOutcome::Saved),
        _ => ("Shooter", ShotOutcome::Missed),
    };
    let shooter = raw
        .player(role)
        .or_else(|| raw.player("Shooter"))
        .map(player_ref)
        .ok_or_else(|| malformed(raw, "shootout attempt without a shooter"))?;

    let description = raw.result.description.to_lowercase();
    let hit_iron = if description.contains("crossbar") {
        Some("crossbar".to_string())
    } else if description.contains("goalpost") || description.contains(" post") {
        Some("post".to_string())
    } else {
        None
    };

    Ok(ShootoutAttempt {
        team_id: raw.team.as_ref().map(|t| t.id).unwrap_or_default(),
        shooter,
        goalie: raw.player("Goalie").map(player_ref),
        outcome,
        hit_iron,
    })
}
