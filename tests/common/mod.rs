//! Shared fixtures: a live-feed JSON builder, a scripted fetcher and a
//! recording sink.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use hockeygamebot::adapters::{DeliveryRef, DeliverySink, Post};
use hockeygamebot::coordination::{ShutdownHandle, ShutdownSignal};
use hockeygamebot::engine::{EngineConfig, ReconciliationEngine};
use hockeygamebot::error::{BotError, DeliveryError, Result};
use hockeygamebot::feed::{PlayByPlayDocument, SnapshotFetcher};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEVILS: u64 = 1;
pub const RANGERS: u64 = 3;
pub const GAME_ID: u64 = 2023020204;

// ── Players ─────────────────────────────────────────────────────

pub const HUGHES: u64 = 8481559;
pub const HISCHIER: u64 = 8478401;
pub const BRATT: u64 = 8479407;
pub const HAMILTON: u64 = 8476462;
pub const SIEGENTHALER: u64 = 8478399;
pub const VANECEK: u64 = 8477970;
pub const PANARIN: u64 = 8478550;
pub const ZIBANEJAD: u64 = 8476459;
pub const SHESTERKIN: u64 = 8478048;

/// (id, full name, last name, position code, position type, team tri code)
const PLAYERS: &[(u64, &str, &str, &str, &str, &str)] = &[
    (HUGHES, "Jack Hughes", "Hughes", "C", "Forward", "NJD"),
    (HISCHIER, "Nico Hischier", "Hischier", "C", "Forward", "NJD"),
    (BRATT, "Jesper Bratt", "Bratt", "L", "Forward", "NJD"),
    (HAMILTON, "Dougie Hamilton", "Hamilton", "D", "Defenseman", "NJD"),
    (SIEGENTHALER, "Jonas Siegenthaler", "Siegenthaler", "D", "Defenseman", "NJD"),
    (VANECEK, "Vitek Vanecek", "Vanecek", "G", "Goalie", "NJD"),
    (PANARIN, "Artemi Panarin", "Panarin", "L", "Forward", "NYR"),
    (ZIBANEJAD, "Mika Zibanejad", "Zibanejad", "C", "Forward", "NYR"),
    (SHESTERKIN, "Igor Shesterkin", "Shesterkin", "G", "Goalie", "NYR"),
];

pub fn name_of(id: u64) -> &'static str {
    PLAYERS
        .iter()
        .find(|p| p.0 == id)
        .map(|p| p.1)
        .unwrap_or("Unknown Player")
}

fn team_json(id: u64) -> Value {
    if id == DEVILS {
        json!({"id": DEVILS, "name": "New Jersey Devils", "triCode": "NJD"})
    } else {
        json!({"id": RANGERS, "name": "New York Rangers", "triCode": "NYR"})
    }
}

fn person(id: u64, role: &str, season_total: Option<u32>) -> Value {
    let mut p = json!({
        "player": {"id": id, "fullName": name_of(id)},
        "playerType": role
    });
    if let Some(total) = season_total {
        p["seasonTotal"] = json!(total);
    }
    p
}

pub fn ago(seconds: i64) -> DateTime<Utc> {
    Utc::now() - ChronoDuration::seconds(seconds)
}

// ── Plays ───────────────────────────────────────────────────────

/// Bare play of `tag` in `period`, score (home, away) after it
pub fn play(index: u32, tag: &str, period: u8, at: DateTime<Utc>, score: (u32, u32)) -> Value {
    let (period_type, ordinal) = match period {
        1 => ("REGULAR", "1st".to_string()),
        2 => ("REGULAR", "2nd".to_string()),
        3 => ("REGULAR", "3rd".to_string()),
        4 => ("OVERTIME", "OT".to_string()),
        n => ("OVERTIME", format!("{}OT", n - 3)),
    };
    json!({
        "players": [],
        "result": {"event": tag, "eventTypeId": tag, "description": ""},
        "about": {
            "eventIdx": index,
            "period": period,
            "periodType": period_type,
            "ordinalNum": ordinal,
            "periodTime": "10:00",
            "periodTimeRemaining": "10:00",
            "dateTime": at.to_rfc3339(),
            "goals": {"home": score.0, "away": score.1}
        }
    })
}

pub fn goal(
    index: u32,
    team: u64,
    scorer: u64,
    assists: &[u64],
    at: DateTime<Utc>,
    score: (u32, u32),
) -> Value {
    let mut p = play(index, "GOAL", 1, at, score);
    let mut players = vec![person(scorer, "Scorer", Some(10))];
    players.extend(assists.iter().map(|id| person(*id, "Assist", Some(20))));
    let goalie = if team == DEVILS { SHESTERKIN } else { VANECEK };
    players.push(person(goalie, "Goalie", None));
    p["players"] = json!(players);
    p["result"]["secondaryType"] = json!("Wrist Shot");
    p["result"]["strength"] = json!({"code": "EVEN", "name": "Even"});
    p["result"]["emptyNet"] = json!(false);
    p["team"] = team_json(team);
    p
}

pub fn penalty(index: u32, team: u64, player: u64, at: DateTime<Utc>) -> Value {
    let mut p = play(index, "PENALTY", 1, at, (0, 0));
    p["players"] = json!([person(player, "PenaltyOn", None)]);
    p["result"]["secondaryType"] = json!("Tripping");
    p["result"]["penaltySeverity"] = json!("Minor");
    p["result"]["penaltyMinutes"] = json!(2);
    p["team"] = team_json(team);
    p
}

pub fn shootout_attempt(
    index: u32,
    team: u64,
    shooter: u64,
    scored: bool,
    at: DateTime<Utc>,
) -> Value {
    let tag = if scored { "GOAL" } else { "SHOT" };
    let mut p = play(index, tag, 5, at, (0, 0));
    p["about"]["periodType"] = json!("SHOOTOUT");
    p["about"]["ordinalNum"] = json!("SO");
    let role = if scored { "Scorer" } else { "Shooter" };
    let goalie = if team == DEVILS { SHESTERKIN } else { VANECEK };
    p["players"] = json!([person(shooter, role, None), person(goalie, "Goalie", None)]);
    p["team"] = team_json(team);
    p
}

pub fn with_period(mut play: Value, period: u8) -> Value {
    play["about"]["period"] = json!(period);
    play["about"]["ordinalNum"] = json!(match period {
        1 => "1st",
        2 => "2nd",
        3 => "3rd",
        _ => "OT",
    });
    if period > 3 {
        play["about"]["periodType"] = json!("OVERTIME");
    }
    play
}

// ── Feed document ───────────────────────────────────────────────

/// Devils (home) vs Rangers (away) live-feed builder
#[derive(Clone)]
pub struct Feed {
    value: Value,
}

impl Feed {
    pub fn new(state: &str) -> Self {
        let players: serde_json::Map<String, Value> = PLAYERS
            .iter()
            .map(|(id, full, last, code, kind, tri)| {
                let team_id = if *tri == "NJD" { DEVILS } else { RANGERS };
                (
                    format!("ID{id}"),
                    json!({
                        "id": id,
                        "fullName": full,
                        "lastName": last,
                        "primaryPosition": {"code": code, "type": kind},
                        "currentTeam": {"id": team_id, "triCode": tri}
                    }),
                )
            })
            .collect();

        let value = json!({
            "gamePk": GAME_ID,
            "gameData": {
                "game": {"pk": GAME_ID, "type": "R"},
                "datetime": {"dateTime": ago(3600).to_rfc3339()},
                "status": {"abstractGameState": state, "detailedState": state},
                "teams": {
                    "home": {"id": DEVILS, "name": "New Jersey Devils", "teamName": "Devils",
                             "abbreviation": "NJD", "venue": {"name": "Prudential Center"}},
                    "away": {"id": RANGERS, "name": "New York Rangers", "teamName": "Rangers",
                             "abbreviation": "NYR"}
                },
                "players": players
            },
            "liveData": {
                "plays": {"allPlays": []},
                "linescore": {
                    "currentPeriod": 1,
                    "currentPeriodOrdinal": "1st",
                    "currentPeriodTimeRemaining": "10:00",
                    "intermissionInfo": {"intermissionTimeRemaining": 0, "inIntermission": false},
                    "teams": {
                        "home": {"goals": 0, "shotsOnGoal": 0, "goaliePulled": false, "numSkaters": 5, "powerPlay": false},
                        "away": {"goals": 0, "shotsOnGoal": 0, "goaliePulled": false, "numSkaters": 5, "powerPlay": false}
                    }
                },
                "boxscore": {"teams": {"home": {"onIce": []}, "away": {"onIce": []}}},
                "decisions": {}
            }
        });
        Self { value }
    }

    pub fn game_type(mut self, code: &str) -> Self {
        self.value["gameData"]["game"]["type"] = json!(code);
        self
    }

    pub fn start_time(mut self, at: DateTime<Utc>) -> Self {
        self.value["gameData"]["datetime"]["dateTime"] = json!(at.to_rfc3339());
        self
    }

    pub fn plays(mut self, plays: Vec<Value>) -> Self {
        self.value["liveData"]["plays"]["allPlays"] = json!(plays);
        self
    }

    pub fn score(mut self, home: u32, away: u32) -> Self {
        let teams = &mut self.value["liveData"]["linescore"]["teams"];
        teams["home"]["goals"] = json!(home);
        teams["away"]["goals"] = json!(away);
        self
    }

    pub fn skaters(mut self, home: u8, away: u8) -> Self {
        let teams = &mut self.value["liveData"]["linescore"]["teams"];
        teams["home"]["numSkaters"] = json!(home);
        teams["away"]["numSkaters"] = json!(away);
        self
    }

    pub fn goalie_pulled(mut self, home: bool, away: bool) -> Self {
        let teams = &mut self.value["liveData"]["linescore"]["teams"];
        teams["home"]["goaliePulled"] = json!(home);
        teams["away"]["goaliePulled"] = json!(away);
        self
    }

    pub fn period(mut self, period: u8) -> Self {
        self.value["liveData"]["linescore"]["currentPeriod"] = json!(period);
        self
    }

    pub fn intermission(mut self, remaining_seconds: u32) -> Self {
        self.value["liveData"]["linescore"]["intermissionInfo"] = json!({
            "intermissionTimeRemaining": remaining_seconds,
            "inIntermission": true
        });
        self
    }

    pub fn on_ice(mut self, home: &[u64]) -> Self {
        self.value["liveData"]["boxscore"]["teams"]["home"]["onIce"] = json!(home);
        self
    }

    pub fn stars(mut self, first: u64, second: u64, third: u64) -> Self {
        let star = |id: u64| json!({"id": id, "fullName": name_of(id)});
        self.value["liveData"]["decisions"] = json!({
            "firstStar": star(first),
            "secondStar": star(second),
            "thirdStar": star(third)
        });
        self
    }

    pub fn build(self) -> PlayByPlayDocument {
        PlayByPlayDocument::from_value(self.value).expect("fixture feed must parse")
    }
}

// ── Fetcher ─────────────────────────────────────────────────────

/// Serves snapshots in order; `None` entries fail. The last snapshot repeats.
#[derive(Default)]
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Option<PlayByPlayDocument>>>,
    last: Mutex<Option<PlayByPlayDocument>>,
    fetches: AtomicUsize,
    cancel_after: Mutex<Option<(usize, ShutdownHandle)>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Option<PlayByPlayDocument>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            ..Self::default()
        })
    }

    pub fn repeating(doc: PlayByPlayDocument) -> Arc<Self> {
        Self::new(vec![Some(doc)])
    }

    /// Requests shutdown once `n` fetches have been served
    pub fn cancel_after(&self, n: usize, shutdown: ShutdownHandle) {
        *self.cancel_after.lock().unwrap() = Some((n, shutdown));
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotFetcher for ScriptedFetcher {
    async fn fetch(&self, _game_id: u64) -> Result<PlayByPlayDocument> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((limit, shutdown)) = self.cancel_after.lock().unwrap().as_ref() {
            if n >= *limit {
                shutdown.request_shutdown(ShutdownSignal::Graceful);
            }
        }

        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        match next {
            Some(Some(doc)) => {
                *last = Some(doc.clone());
                Ok(doc)
            }
            Some(None) => Err(BotError::FeedUnavailable("scripted failure".into())),
            None => last
                .clone()
                .ok_or_else(|| BotError::FeedUnavailable("script exhausted".into())),
        }
    }
}

// ── Sink ────────────────────────────────────────────────────────

/// Records every post and hands back numbered references
#[derive(Default)]
pub struct RecordingSink {
    posts: Mutex<Vec<Post>>,
    failing: bool,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            failing: true,
            ..Self::default()
        })
    }

    pub fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.posts().into_iter().map(|p| p.text).collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.texts().iter().filter(|t| t.contains(needle)).count()
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn post(&self, post: &Post) -> Result<DeliveryRef> {
        let mut posts = self.posts.lock().unwrap();
        posts.push(post.clone());
        if self.failing {
            return Err(DeliveryError::Transport {
                sink: "recording".into(),
                reason: "connection reset".into(),
            }
            .into());
        }
        let n = posts.len();
        Ok(DeliveryRef {
            id: format!("post-{n}"),
            url: Some(format!("https://social.test/@bot/{n}")),
        })
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

// ── Engine ──────────────────────────────────────────────────────

pub fn fast_config() -> EngineConfig {
    EngineConfig {
        assist_retry_delay: Duration::from_millis(1),
        ..EngineConfig::default()
    }
}

pub fn engine(
    fetcher: Arc<ScriptedFetcher>,
    sink: Arc<RecordingSink>,
    config: EngineConfig,
) -> ReconciliationEngine {
    ReconciliationEngine::new(fetcher, sink, ShutdownHandle::new(), config)
}
