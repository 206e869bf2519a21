//! Announcement text
//!
//! Pure functions from typed events plus game state to post text. Nothing in
//! here posts, sleeps or mutates the game.

use chrono::{DateTime, Local, Utc};

use crate::domain::{
    Game, GameType, GoalDetails, PenaltyDetails, PeriodType, Play, PlayerRef, Position, Roster,
    ShootoutAttempt, ShotOutcome, Side, Team,
};
use crate::engine::strength::PenaltyStrength;
use crate::error::Result;

/// 1 → "1st", 12 → "12th", 23 → "23rd"
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

fn period_ordinal(play: &Play) -> String {
    if play.period_ordinal.is_empty() {
        ordinal(play.period as u32)
    } else {
        play.period_ordinal.clone()
    }
}

fn score_lines(game: &Game, preferred: u32, other: u32) -> String {
    format!(
        "{}: {}\n{}: {}",
        game.preferred_team().short_name(),
        preferred,
        game.other_team().short_name(),
        other
    )
}

fn assist_line(assists: &[PlayerRef]) -> Option<String> {
    match assists {
        [] => None,
        [primary] => Some(format!("Give the assist to {}!", primary.with_total())),
        [primary, secondary, ..] => Some(format!(
            "The goal was assisted by {} & {}.",
            primary.with_total(),
            secondary.with_total()
        )),
    }
}

// ── Goals ───────────────────────────────────────────────────────

/// Full goal post. `scorer_goals` counts this goal.
pub fn goal_text(game: &Game, play: &Play, goal: &GoalDetails, scorer_goals: usize) -> String {
    let (pref_score, other_score) = game.scores_on(play);
    let preferred_id = game.preferred_team().id();
    let team = game
        .side_of_team(goal.team_id)
        .map(|side| game.team(side).identity.full_name.clone())
        .unwrap_or_default();

    let when = match play.period_type {
        PeriodType::Overtime => format!("with {} left in overtime!", play.time_remaining),
        _ => format!(
            "with {} left in the {} period!",
            play.time_remaining,
            period_ordinal(play)
        ),
    };
    let scorer_line = match &goal.shot_type {
        Some(shot) => format!(
            "{} scores on a {} {}",
            goal.scorer.with_total(),
            shot.to_lowercase(),
            when
        ),
        None => format!("{} scores {}", goal.scorer.with_total(), when),
    };

    let mut sections = Vec::new();
    if goal.team_id == preferred_id {
        let title = if play.period_type == PeriodType::Overtime {
            format!("{team} OVERTIME GOAL!!")
        } else if !goal.strength.is_even() {
            format!("{team} {} GOAL!", goal.strength)
        } else if goal.empty_net {
            format!("{team} Empty Net GOAL!")
        } else if pref_score == 7 {
            format!("{team} TOUCHDOWN!")
        } else {
            format!("{team} GOAL!")
        };
        sections.push(format!("{} {}", title, "🚨".repeat(pref_score as usize)));

        let scorer_line = match scorer_goals {
            2 => format!("With his 2nd goal of the game, {scorer_line}"),
            3 => format!("🎩🎩🎩 HAT TRICK! {scorer_line}"),
            n if n > 3 => format!("{n} GOALS!! {scorer_line}"),
            _ => scorer_line,
        };
        sections.push(scorer_line);
    } else {
        sections.push(format!("{} score. {}", team, "👎".repeat(other_score as usize)));
        sections.push(scorer_line);
    }

    if let Some(assists) = assist_line(&goal.assists) {
        sections.push(assists);
    }
    sections.push(score_lines(game, pref_score, other_score));
    sections.join("\n\n")
}

/// Correction for a previously announced goal, `None` when nothing material changed
pub fn scoring_change_text(
    game: &Game,
    old: &GoalDetails,
    new: &GoalDetails,
    original_url: Option<&str>,
) -> Option<String> {
    let names: Vec<String> = new.assists.iter().map(|a| a.with_total()).collect();

    let text = if old.scorer.id != new.scorer.id {
        let reads = match names.as_slice() {
            [] => format!("Now reads as an unassisted goal for {}.", new.scorer.name),
            [a] => format!("Now reads as {} from {}.", new.scorer.name, a),
            [a, b, ..] => format!("Now reads as {} from {} and {}.", new.scorer.name, a, b),
        };
        format!("Scoring change on the below goal. {reads}")
    } else if old.assist_ids() != new.assist_ids() {
        let change = match names.as_slice() {
            [] => "The goal is now unassisted.".to_string(),
            [a] => format!("Give the lone assist on {}'s goal to {}.", new.scorer.name, a),
            [a, b, ..] => format!("The goal is now assisted by {} and {}.", a, b),
        };
        if old.assists.is_empty() {
            change
        } else {
            format!("The assists on the below goal have changed. {change}")
        }
    } else {
        return None;
    };

    let mut text = format!("{} {}", text, game.hashtag());
    if let Some(url) = original_url {
        text.push('\n');
        text.push_str(url);
    }
    Some(text)
}

// ── Penalties & strength ────────────────────────────────────────

pub fn penalty_text(
    game: &Game,
    play: &Play,
    penalty: &PenaltyDetails,
    strength: Option<PenaltyStrength>,
) -> String {
    let main = format!(
        "{} takes a {}-minute {} penalty for {} and heads to the penalty box with {} remaining in the {} period.",
        penalty.committed_by.name,
        penalty.minutes,
        penalty.severity,
        penalty.infraction,
        play.time_remaining,
        period_ordinal(play)
    );
    match strength {
        Some(s) => format!("{} {}", main, s.phrase(game.preferred_team().short_name())),
        None => main,
    }
}

pub fn goalie_pulled_text(game: &Game, team: &Team, trailing_by: u32) -> String {
    format!(
        "The {} have pulled their goalie trailing by {} with {} left in the {} period.",
        team.short_name(),
        trailing_by,
        game.period.time_remaining,
        game.period.ordinal
    )
}

// ── Periods ─────────────────────────────────────────────────────

pub fn period_start_text(game: &Game, play: &Play) -> Option<String> {
    let venue = &game.venue;
    let text = match (play.period_type, play.period) {
        (PeriodType::Shootout, _) => format!("The shootout is underway at {venue}!"),
        (_, 1) => format!(
            "The puck has dropped between the {} & {} at {}!",
            game.preferred_team().short_name(),
            game.other_team().short_name(),
            venue
        ),
        (_, 2 | 3) => format!(
            "It's time for the {} period at {}.",
            period_ordinal(play),
            venue
        ),
        (_, p) if p > 3 && game.game_type == GameType::Playoff => format!(
            "Who will be the hero this time? OT{} starts now at {}!",
            p - 3,
            venue
        ),
        (_, 4) => format!("Who will be the hero this time? 3-on-3 OT starts now at {venue}!"),
        _ => return None,
    };
    Some(text)
}

/// Whether a starting lineup is posted for this period
pub fn lineup_eligible(game_type: GameType, period: u8) -> bool {
    match game_type {
        GameType::Playoff => period == 1 || period > 3,
        _ => period == 1 || period == 4,
    }
}

/// Starting skaters for the preferred team, forwards / defense / goalie
pub fn lineup_text(game: &Game, period: u8, on_ice: &[u64], roster: &Roster) -> Result<String> {
    let mut forwards = Vec::new();
    let mut defense = Vec::new();
    let mut goalies = Vec::new();
    for id in on_ice {
        let entry = roster.resolve(*id)?;
        let name = if entry.last_name.is_empty() {
            entry.full_name.clone()
        } else {
            entry.last_name.clone()
        };
        match entry.position {
            Some(Position::Defense) => defense.push(name),
            Some(Position::Goalie) => goalies.push(name),
            _ => forwards.push(name),
        }
    }

    let team = game.preferred_team().short_name();
    let header = match (game.game_type, period) {
        (_, 1..=3) => format!(
            "On the ice to start the {} period for your {} -",
            ordinal(period as u32),
            team
        ),
        (GameType::Playoff, p) => format!("On the ice to start OT{} for your {} -", p - 3, team),
        _ => format!("On the ice to start overtime for your {team} are:"),
    };

    let lines: Vec<String> = [forwards, defense, goalies]
        .into_iter()
        .filter(|group| !group.is_empty())
        .map(|group| group.join(" - "))
        .collect();
    Ok(format!("{}\n\n{}", header, lines.join("\n")))
}

pub fn period_end_text(game: &Game, play: &Play) -> Option<String> {
    let (pref, other) = game.scores_on(play);
    let pref_team = game.preferred_team();
    let other_team = game.other_team();
    let ord = period_ordinal(play);

    match play.period {
        1 | 2 => {
            let mut text = format!(
                "The {} period of {} comes to an end.\n\n{}: {} ({} shots)\n{}: {} ({} shots)",
                ord,
                game.hashtag(),
                pref_team.short_name(),
                pref,
                pref_team.shots,
                other_team.short_name(),
                other,
                other_team.shots
            );
            if pref > other {
                if let Some(record) = pref_team.lead_record_after(play.period) {
                    let pct = record
                        .win_pct()
                        .map(|p| format!(" ({p:.1}% win)"))
                        .unwrap_or_default();
                    text.push_str(&format!(
                        "\n\nWhen leading after the {} period, the {} are {}{}.",
                        ord,
                        pref_team.short_name(),
                        record,
                        pct
                    ));
                }
            }
            Some(text)
        }
        3 if pref == other => Some(format!(
            "60 minutes wasn't enough to decide this game. {} and {} are headed to overtime tied at {}!",
            pref_team.short_name(),
            other_team.short_name(),
            pref
        )),
        p if p > 3 && pref == other && game.game_type == GameType::Playoff => {
            let ot = p - 3;
            let wasnt = if ot == 1 {
                "overtime wasn't"
            } else {
                "overtimes weren't"
            };
            Some(format!(
                "{} {} enough to decide this game. {} and {} headed to OT{} tied at {}!",
                ot,
                wasnt,
                pref_team.short_name(),
                other_team.short_name(),
                ot + 1,
                pref
            ))
        }
        p if p > 3 && pref == other => Some(format!(
            "60 minutes and some overtime weren't enough to decide this game. {} and {} are headed to a shootout!",
            pref_team.short_name(),
            other_team.short_name()
        )),
        _ => None,
    }
}

// ── Shootout ────────────────────────────────────────────────────

/// Attempt text plus the running tally; call after recording the attempt
pub fn shootout_text(game: &Game, attempt: &ShootoutAttempt, side: Side) -> String {
    let shooter = &attempt.shooter.name;
    let goalie = attempt
        .goalie
        .as_ref()
        .map(|g| g.name.as_str())
        .unwrap_or("the goalie");

    let line = match (side, attempt.outcome, attempt.hit_iron.as_deref()) {
        (Side::Preferred, ShotOutcome::Scored, _) => format!("{shooter} shoots & scores! 🚨"),
        (Side::Preferred, ShotOutcome::Saved, _) => {
            format!("{shooter}'s shot saved by {goalie}. 😠")
        }
        (Side::Preferred, ShotOutcome::Missed, Some(iron)) => {
            format!("{shooter} rings the {iron}! 😠")
        }
        (Side::Preferred, ShotOutcome::Missed, None) => {
            format!("{shooter} shoots & misses the net. 😠")
        }
        (Side::Other, ShotOutcome::Scored, _) => format!("{shooter} shoots & scores. 👎"),
        (Side::Other, ShotOutcome::Saved, _) => format!("{shooter}'s shot saved by {goalie}! 🛑"),
        (Side::Other, ShotOutcome::Missed, Some(iron)) => format!("{shooter} hits the {iron}! 🛑"),
        (Side::Other, ShotOutcome::Missed, None) => {
            format!("{shooter} shoots & misses the net! 🛑")
        }
    };

    let (pref_markers, other_markers) = match &game.shootout {
        Some(so) => (so.markers(Side::Preferred), so.markers(Side::Other)),
        None => (String::new(), String::new()),
    };
    format!(
        "{}\n\n{}: {}\n{}: {}",
        line,
        game.preferred_team().short_name(),
        pref_markers,
        game.other_team().short_name(),
        other_markers
    )
}

// ── Pregame & final ─────────────────────────────────────────────

pub fn preview_text(game: &Game) -> String {
    preview_text_at(game, game.start_time)
}

fn preview_text_at(game: &Game, start: DateTime<Utc>) -> String {
    let local = start.with_timezone(&Local).format("%-I:%M %p");
    format!(
        "Tonight's game: {} @ {} at {}, puck drop at {}.",
        game.away.identity.full_name, game.home.identity.full_name, game.venue, local
    )
}

pub fn final_score_text(game: &Game) -> String {
    let pref = game.preferred_team();
    let other = game.other_team();
    let location = match pref.home_away {
        crate::domain::HomeAway::Home => "at home",
        crate::domain::HomeAway::Away => "on the road",
    };

    if pref.score > other.score {
        format!(
            "{} win {} over the {} by a score of {} to {}! 🚨🚨🚨",
            pref.short_name(),
            location,
            other.short_name(),
            pref.score,
            other.score
        )
    } else {
        format!(
            "{} lose {} to the {} by a score of {} to {}. 👎",
            pref.short_name(),
            location,
            other.short_name(),
            other.score,
            pref.score
        )
    }
}

pub fn three_stars_text(stars: &[PlayerRef; 3], roster: &Roster) -> String {
    let line = |marks: &str, star: &PlayerRef| {
        match roster
            .resolve(star.id)
            .ok()
            .and_then(|e| e.team_tri_code.as_deref())
        {
            Some(tri) => format!("{}: {} ({})", marks, star.name, tri),
            None => format!("{}: {}", marks, star.name),
        }
    };
    format!(
        "The three stars for the game are - \n{}\n{}\n{}",
        line("⭐️", &stars[0]),
        line("⭐️⭐️", &stars[1]),
        line("⭐️⭐️⭐️", &stars[2])
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        EventKind, GoalStrength, HomeAway, LeadRecord, RosterEntry, TeamIdentity,
    };

    fn game() -> Game {
        let home = Team::new(
            TeamIdentity {
                id: 1,
                full_name: "New Jersey Devils".into(),
                short_name: "Devils".into(),
                tri_code: "NJD".into(),
            },
            HomeAway::Home,
        );
        let away = Team::new(
            TeamIdentity {
                id: 3,
                full_name: "New York Rangers".into(),
                short_name: "Rangers".into(),
                tri_code: "NYR".into(),
            },
            HomeAway::Away,
        );
        Game::new(
            2023020001,
            GameType::Regular,
            Utc::now(),
            "Prudential Center",
            home,
            away,
            HomeAway::Home,
        )
    }

    fn player(id: u64, name: &str, total: u32) -> PlayerRef {
        PlayerRef {
            id,
            name: name.into(),
            season_total: Some(total),
        }
    }

    fn play(period: u8, home: u32, away: u32) -> Play {
        Play {
            index: 10,
            kind: EventKind::Faceoff,
            period,
            period_type: if period > 3 {
                PeriodType::Overtime
            } else {
                PeriodType::Regular
            },
            period_ordinal: if period > 3 { "OT".into() } else { ordinal(period as u32) },
            time_remaining: "11:39".into(),
            wall_clock: None,
            home_score: home,
            away_score: away,
            description: String::new(),
        }
    }

    fn goal(team_id: u64, assists: Vec<PlayerRef>) -> GoalDetails {
        GoalDetails {
            team_id,
            scorer: player(8481559, "Jack Hughes", 12),
            assists,
            goalie: None,
            strength: GoalStrength::Even,
            empty_net: false,
            shot_type: Some("Wrist Shot".into()),
        }
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal(1), "1st");
        assert_eq!(ordinal(2), "2nd");
        assert_eq!(ordinal(3), "3rd");
        assert_eq!(ordinal(4), "4th");
        assert_eq!(ordinal(11), "11th");
        assert_eq!(ordinal(22), "22nd");
    }

    #[test]
    fn test_preferred_goal_text() {
        let game = game();
        let text = goal_text(
            &game,
            &play(2, 2, 1),
            &goal(1, vec![player(8478401, "Nico Hischier", 20)]),
            1,
        );
        assert_eq!(
            text,
            "New Jersey Devils GOAL! 🚨🚨\n\n\
             Jack Hughes (12) scores on a wrist shot with 11:39 left in the 2nd period!\n\n\
             Give the assist to Nico Hischier (20)!\n\n\
             Devils: 2\nRangers: 1"
        );
    }

    #[test]
    fn test_goal_title_variants() {
        let game = game();
        let mut pp = goal(1, vec![]);
        pp.strength = GoalStrength::PowerPlay;
        assert!(goal_text(&game, &play(1, 1, 0), &pp, 1).starts_with("New Jersey Devils Power Play GOAL! 🚨"));

        let text = goal_text(&game, &play(3, 3, 1), &goal(1, vec![]), 3);
        assert!(text.contains("🎩🎩🎩 HAT TRICK! Jack Hughes (12)"));
        assert!(!text.contains("assist"));

        assert!(goal_text(&game, &play(3, 7, 1), &goal(1, vec![]), 1).starts_with("New Jersey Devils TOUCHDOWN!"));
        assert!(goal_text(&game, &play(4, 3, 2), &goal(1, vec![]), 1)
            .starts_with("New Jersey Devils OVERTIME GOAL!!"));

        let other = goal_text(&game, &play(1, 0, 2), &goal(3, vec![]), 1);
        assert!(other.starts_with("New York Rangers score. 👎👎"));
    }

    #[test]
    fn test_scoring_change_text() {
        let game = game();
        let old = goal(1, vec![]);
        let mut new = goal(1, vec![player(8478401, "Nico Hischier", 20)]);
        assert_eq!(
            scoring_change_text(&game, &old, &new, Some("https://m.test/1")).unwrap(),
            "Give the lone assist on Jack Hughes's goal to Nico Hischier (20). #NYRvsNJD\nhttps://m.test/1"
        );

        new.scorer = player(8480002, "Nico Daws", 1);
        let text = scoring_change_text(&game, &old, &new, None).unwrap();
        assert!(text.starts_with(
            "Scoring change on the below goal. Now reads as Nico Daws from Nico Hischier (20)."
        ));

        let changed_assists = goal(1, vec![player(1, "A", 1), player(2, "B", 2)]);
        let text = scoring_change_text(
            &game,
            &goal(1, vec![player(1, "A", 1)]),
            &changed_assists,
            None,
        )
        .unwrap();
        assert!(text.starts_with("The assists on the below goal have changed. The goal is now assisted by A (1) and B (2)."));

        // season totals moving is not a correction
        let mut same = old.clone();
        same.scorer.season_total = Some(13);
        assert!(scoring_change_text(&game, &old, &same, None).is_none());
    }

    #[test]
    fn test_period_texts() {
        let mut game = game();
        assert_eq!(
            period_start_text(&game, &play(1, 0, 0)).unwrap(),
            "The puck has dropped between the Devils & Rangers at Prudential Center!"
        );
        assert_eq!(
            period_start_text(&game, &play(4, 2, 2)).unwrap(),
            "Who will be the hero this time? 3-on-3 OT starts now at Prudential Center!"
        );

        game.home.shots = 12;
        game.away.shots = 8;
        game.home.lead_after[0] = Some(LeadRecord {
            wins: 3,
            losses: 1,
            ot_losses: 0,
        });
        let text = period_end_text(&game, &play(1, 1, 0)).unwrap();
        assert_eq!(
            text,
            "The 1st period of #NYRvsNJD comes to an end.\n\n\
             Devils: 1 (12 shots)\nRangers: 0 (8 shots)\n\n\
             When leading after the 1st period, the Devils are 3-1-0 (75.0% win)."
        );

        assert!(period_end_text(&game, &play(3, 2, 2))
            .unwrap()
            .starts_with("60 minutes wasn't enough"));
        assert!(period_end_text(&game, &play(3, 3, 2)).is_none());
        assert!(period_end_text(&game, &play(4, 2, 2))
            .unwrap()
            .ends_with("are headed to a shootout!"));

        game.game_type = GameType::Playoff;
        assert!(period_end_text(&game, &play(5, 2, 2))
            .unwrap()
            .starts_with("2 overtimes weren't enough to decide this game. Devils and Rangers headed to OT3 tied at 2!"));
    }

    #[test]
    fn test_lineup_text() {
        let game = game();
        let entry = |id, last: &str, pos| RosterEntry {
            id,
            full_name: format!("X {last}"),
            last_name: last.into(),
            position: Some(pos),
            team_tri_code: Some("NJD".into()),
        };
        let roster = Roster::new([
            entry(1, "Hughes", Position::Forward),
            entry(2, "Bratt", Position::Forward),
            entry(3, "Hamilton", Position::Defense),
            entry(4, "Markstrom", Position::Goalie),
        ]);

        assert_eq!(
            lineup_text(&game, 4, &[1, 2, 3, 4], &roster).unwrap(),
            "On the ice to start overtime for your Devils are:\n\nHughes - Bratt\nHamilton\nMarkstrom"
        );
        assert!(lineup_text(&game, 1, &[1, 99], &roster).is_err());
        assert!(lineup_eligible(GameType::Regular, 4));
        assert!(!lineup_eligible(GameType::Regular, 5));
        assert!(lineup_eligible(GameType::Playoff, 6));
    }

    #[test]
    fn test_final_texts() {
        let mut game = game();
        game.home.score = 4;
        game.away.score = 2;
        assert_eq!(
            final_score_text(&game),
            "Devils win at home over the Rangers by a score of 4 to 2! 🚨🚨🚨"
        );
        game.preferred = HomeAway::Away;
        assert_eq!(
            final_score_text(&game),
            "Rangers lose on the road to the Devils by a score of 4 to 2. 👎"
        );

        let roster = Roster::new([RosterEntry {
            id: 1,
            full_name: "Jack Hughes".into(),
            last_name: "Hughes".into(),
            position: Some(Position::Forward),
            team_tri_code: Some("NJD".into()),
        }]);
        let stars = [
            player(1, "Jack Hughes", 0),
            player(2, "Igor Shesterkin", 0),
            player(3, "Nico Hischier", 0),
        ];
        assert_eq!(
            three_stars_text(&stars, &roster),
            "The three stars for the game are - \n⭐️: Jack Hughes (NJD)\n⭐️⭐️: Igor Shesterkin\n⭐️⭐️⭐️: Nico Hischier"
        );
    }
}
