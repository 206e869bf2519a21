//! Reconciliation engine
//!
//! Turns repeated full snapshots of the feed into at-most-once posts. Each
//! [`ReconciliationEngine::reconcile`] call:
//!
//! 1. applies the snapshot's linescore to the game,
//! 2. ages out recorded goals the feed no longer carries,
//! 3. processes plays past the high-water mark in index order, or, when
//!    there are none, re-checks announced goals for scoring changes,
//! 4. announces goalie-pull edges seen in the linescore,
//! 5. asks for an intermission sleep while the linescore reports one.
//!
//! A goal still waiting on assist data stops the batch without advancing the
//! high-water mark, so the next cycle resumes at that exact index.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::cache::{CachedEventRecord, EventCache};
use super::strength::PenaltyStrength;
use crate::adapters::{DeliveryRef, DeliverySink, Post};
use crate::announce;
use crate::config::ScriptConfig;
use crate::coordination::ShutdownHandle;
use crate::domain::{
    EventIndex, EventKind, Game, GameState, GoalRecord, HomeAway, LinescoreChanges,
    PenaltyDetails, PeriodType, Play, ShootoutAttempt, ShotOutcome,
};
use crate::error::{BotError, Result};
use crate::feed::{classifier, classify, PlayByPlayDocument, RawPlay, SnapshotFetcher};

/// Engine knobs, fixed for the life of a game
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub recency_window: Duration,
    pub intermission_safety_margin: Duration,
    pub assist_retry_count: u32,
    pub assist_retry_delay: Duration,
    pub goal_removal_checks: u32,
    /// Historical replay: every play is announced, nothing sleeps
    pub backfill: bool,
}

impl EngineConfig {
    pub fn from_script(script: &ScriptConfig, backfill: bool) -> Self {
        Self {
            recency_window: script.recency_window(),
            intermission_safety_margin: script.intermission_safety_margin(),
            assist_retry_count: script.assist_retry_count,
            assist_retry_delay: script.assist_retry_delay(),
            goal_removal_checks: script.goal_removal_checks,
            backfill,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from_script(&ScriptConfig::default(), false)
    }
}

/// What one reconcile call did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// Plays the high-water mark moved past
    pub processed: usize,
    /// New-event posts that reached a sink
    pub announced: usize,
    /// Scoring changes applied to already-recorded goals
    pub corrections: usize,
    /// Goals dropped after disappearing from the feed
    pub removed_goals: usize,
    /// Goal left unresolved for the next cycle
    pub deferred_goal: Option<EventIndex>,
    /// Requested sleep before the next poll
    pub intermission_sleep: Option<Duration>,
    /// Missed goal recovered instead of running correction checks
    pub recovered_goal: Option<EventIndex>,
}

enum PlayOutcome {
    Done(Option<DeliveryRef>),
    /// Goal needs another look next cycle
    Deferred,
}

pub struct ReconciliationEngine {
    pub(super) cache: EventCache,
    fetcher: Arc<dyn SnapshotFetcher>,
    pub(super) sink: Arc<dyn DeliverySink>,
    shutdown: ShutdownHandle,
    config: EngineConfig,
}

impl ReconciliationEngine {
    pub fn new(
        fetcher: Arc<dyn SnapshotFetcher>,
        sink: Arc<dyn DeliverySink>,
        shutdown: ShutdownHandle,
        config: EngineConfig,
    ) -> Self {
        Self {
            cache: EventCache::new(),
            fetcher,
            sink,
            shutdown,
            config,
        }
    }

    pub fn cache(&self) -> &EventCache {
        &self.cache
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Posts once; failures are logged, never retried
    pub async fn deliver(&self, post: Post) -> Option<DeliveryRef> {
        match self.sink.post(&post).await {
            Ok(reference) => {
                info!(sink = self.sink.name(), reference = %reference, "posted");
                Some(reference)
            }
            Err(e) => {
                error!(sink = self.sink.name(), "delivery failed: {}", e);
                None
            }
        }
    }

    fn is_recent(&self, play: &Play, now: DateTime<Utc>) -> bool {
        self.config.backfill || play.is_recent(now, self.config.recency_window)
    }

    /// Runs one reconciliation pass over a fresh snapshot
    pub async fn reconcile(
        &mut self,
        game: &mut Game,
        doc: &PlayByPlayDocument,
        now: DateTime<Utc>,
    ) -> CycleReport {
        let mut report = CycleReport::default();

        let changes = game.apply_linescore(&doc.linescore);
        report.removed_goals = self.age_out_goals(game, doc);

        let new_plays: Vec<&RawPlay> = doc
            .plays
            .iter()
            .filter(|p| match game.last_processed_event_index {
                Some(last) => p.index() > last,
                None => true,
            })
            .collect();

        if new_plays.is_empty() {
            self.check_scoring_changes(game, doc, now, &mut report).await;
        } else {
            debug!(
                game_id = game.game_id,
                count = new_plays.len(),
                from = new_plays[0].index(),
                "processing new plays"
            );
            for raw in new_plays {
                let index = raw.index();
                let play = match classify(raw, game.game_type) {
                    Ok(play) => play,
                    Err(e) if classifier::is_goal(raw) => {
                        // scorer not published yet, same budget as missing assists
                        game.assists_check_counter += 1;
                        if game.assists_check_counter > self.config.assist_retry_count {
                            error!(index, "giving up on malformed goal: {}", e);
                            game.assists_check_counter = 0;
                            game.advance_high_water(index);
                            report.processed += 1;
                            continue;
                        }
                        warn!(index, "goal not ready ({}), retrying next cycle", e);
                        report.deferred_goal = Some(index);
                        break;
                    }
                    Err(e) => {
                        warn!(index, "skipping unclassifiable play: {}", e);
                        game.advance_high_water(index);
                        report.processed += 1;
                        continue;
                    }
                };

                let recent = self.is_recent(&play, now);
                match self.process_play(game, &play, doc, recent).await {
                    Ok(PlayOutcome::Done(reference)) => {
                        if reference.is_some() {
                            report.announced += 1;
                        }
                        if !self.cache.contains(index) {
                            self.cache.put(index, CachedEventRecord::new(play, reference));
                        }
                        game.advance_high_water(index);
                        report.processed += 1;
                    }
                    Ok(PlayOutcome::Deferred) => {
                        report.deferred_goal = Some(index);
                        break;
                    }
                    Err(e) => {
                        warn!(index, kind = play.kind.label(), "play failed: {}", e);
                        game.advance_high_water(index);
                        report.processed += 1;
                    }
                }
            }
        }

        self.announce_linescore_edges(game, &changes, &mut report).await;
        report.intermission_sleep = self.intermission_sleep(game);
        report
    }

    /// Sleep through the rest of an intermission, read fresh from every
    /// snapshot since the linescore can trail the period-end play.
    fn intermission_sleep(&self, game: &Game) -> Option<Duration> {
        if self.config.backfill || !game.period.in_intermission {
            return None;
        }
        let remaining = Duration::from_secs(u64::from(game.period.intermission_remaining_seconds));
        let margin = self.config.intermission_safety_margin;
        let sleep = remaining.saturating_sub(margin);
        if sleep > margin {
            info!(period = game.period.current, ?sleep, "sleeping through intermission");
            Some(sleep)
        } else {
            None
        }
    }

    async fn process_play(
        &mut self,
        game: &mut Game,
        play: &Play,
        doc: &PlayByPlayDocument,
        recent: bool,
    ) -> Result<PlayOutcome> {
        match &play.kind {
            EventKind::Goal(_) => self.handle_goal(game, play.clone(), recent).await,
            EventKind::Penalty(penalty) => Ok(self.handle_penalty(game, play, penalty, recent).await),
            EventKind::PeriodReady => self.handle_period_ready(game, play, doc, recent).await,
            EventKind::PeriodStart => Ok(self.handle_period_start(game, play, recent).await),
            EventKind::PeriodEnd => Ok(self.handle_period_end(game, play, recent).await),
            EventKind::ShootoutAttempt(attempt) => {
                Ok(self.handle_shootout_attempt(game, attempt, recent).await)
            }
            EventKind::GameEnd => {
                info!(game_id = game.game_id, index = play.index, "game end play");
                game.game_end_seen = true;
                Ok(PlayOutcome::Done(None))
            }
            other => {
                debug!(index = play.index, kind = other.label(), "no announcement");
                Ok(PlayOutcome::Done(None))
            }
        }
    }

    // ── Goals ───────────────────────────────────────────────────

    async fn handle_goal(
        &mut self,
        game: &mut Game,
        mut play: Play,
        recent: bool,
    ) -> Result<PlayOutcome> {
        let index = play.index;
        let Some(mut goal) = play.goal().cloned() else {
            return Ok(PlayOutcome::Done(None));
        };

        let Some(side) = game.side_of_team(goal.team_id) else {
            warn!(index, team_id = goal.team_id, "goal for a team not in this game");
            return Ok(PlayOutcome::Done(None));
        };
        if game.team(side).has_goal(index) {
            warn!(index, "duplicate goal, already recorded for the {}", side);
            return Ok(PlayOutcome::Done(None));
        }

        // Empty assists can mean the feed is lagging. Look again before
        // accepting an unassisted goal; the counter survives a deferral.
        let mut rechecks = 0;
        if recent && !self.config.backfill {
            while goal.assists.is_empty()
                && game.assists_check_counter < self.config.assist_retry_count
            {
                game.assists_check_counter += 1;
                debug!(
                    index,
                    attempt = game.assists_check_counter,
                    "no assists yet, re-checking"
                );
                if !self.shutdown.sleep(self.config.assist_retry_delay).await {
                    return Ok(PlayOutcome::Deferred);
                }
                let fresh = match self.fetcher.fetch(game.game_id).await {
                    Ok(doc) => doc,
                    Err(e) => {
                        warn!(index, "assist re-check fetch failed: {}", e);
                        return Ok(PlayOutcome::Deferred);
                    }
                };
                match fresh.play(index).map(|raw| classify(raw, game.game_type)) {
                    Some(Ok(updated)) => {
                        let Some(updated_goal) = updated.goal().cloned() else {
                            info!(index, "play is no longer a goal, dropping it");
                            game.assists_check_counter = 0;
                            return Ok(PlayOutcome::Done(None));
                        };
                        goal = updated_goal;
                        play = updated;
                    }
                    Some(Err(e)) => warn!(index, "re-checked goal unreadable: {}", e),
                    None => {
                        info!(index, "goal vanished from the feed, dropping it");
                        game.assists_check_counter = 0;
                        return Ok(PlayOutcome::Done(None));
                    }
                }
            }
            rechecks = game.assists_check_counter;
        }
        game.assists_check_counter = 0;

        // the re-fetch may have moved the goal to the other team
        let side = game.side_of_team(goal.team_id).unwrap_or(side);
        let team = game.team_mut(side);
        let scorer_goals = team.goals_by(goal.scorer.id) + 1;
        team.goals
            .push(GoalRecord::new(index, &goal, play.period, &play.time_remaining));
        info!(
            index,
            team = %side,
            scorer = %goal.scorer.name,
            assists = goal.assists.len(),
            rechecks,
            "goal recorded"
        );

        let reference = if recent {
            let text = announce::goal_text(game, &play, &goal, scorer_goals);
            self.deliver(Post::new(text)).await
        } else {
            None
        };

        let mut record = CachedEventRecord::new(play, reference.clone());
        record.pending_assist_recheck_count = rechecks;
        self.cache.put(index, record);
        Ok(PlayOutcome::Done(reference))
    }

    /// Drops recorded goals the feed has stopped reporting as goals
    fn age_out_goals(&mut self, game: &mut Game, doc: &PlayByPlayDocument) -> usize {
        let limit = self.config.goal_removal_checks;
        let mut removed = 0;
        for side in [HomeAway::Home, HomeAway::Away] {
            let team = game.team_mut(side);
            for record in team.goals.iter_mut() {
                let present = doc
                    .play(record.index)
                    .map(classifier::is_goal)
                    .unwrap_or(false);
                if present {
                    record.missing_polls = 0;
                } else {
                    record.missing_polls += 1;
                    debug!(index = record.index, polls = record.missing_polls, "recorded goal missing from feed");
                }
            }
            let gone: Vec<EventIndex> = team
                .goals
                .iter()
                .filter(|g| limit > 0 && g.missing_polls >= limit)
                .map(|g| g.index)
                .collect();
            for index in gone {
                if let Some(goal) = team.remove_goal(index) {
                    info!(index, team = %side, scorer = %goal.scorer.name, "goal removed from the feed, dropping it");
                    self.cache.remove(index);
                    removed += 1;
                }
            }
        }
        removed
    }

    /// Re-reads announced preferred-team goals for scorer or assist changes.
    ///
    /// A goal the feed has but the team never recorded takes priority: it is
    /// processed and the correction pass is skipped for this cycle.
    async fn check_scoring_changes(
        &mut self,
        game: &mut Game,
        doc: &PlayByPlayDocument,
        now: DateTime<Utc>,
        report: &mut CycleReport,
    ) {
        let Some(last) = game.last_processed_event_index else {
            return;
        };
        let preferred_id = game.preferred_team().id();

        // shootout attempts classify separately and never show up here
        let feed_goals: Vec<Play> = doc
            .plays
            .iter()
            .filter(|raw| raw.index() <= last && classifier::is_goal(raw))
            .filter_map(|raw| classify(raw, game.game_type).ok())
            .filter(|play| {
                play.goal()
                    .map(|g| g.team_id == preferred_id)
                    .unwrap_or(false)
            })
            .collect();

        if feed_goals.len() > game.preferred_team().goals.len() {
            let missing = feed_goals
                .iter()
                .rev()
                .find(|p| !game.preferred_team().has_goal(p.index))
                .cloned();
            if let Some(play) = missing {
                let index = play.index;
                warn!(
                    index,
                    feed = feed_goals.len(),
                    recorded = game.preferred_team().goals.len(),
                    "recovering missed goal"
                );
                self.cache.remove(index);
                let recent = self.is_recent(&play, now);
                match self.handle_goal(game, play, recent).await {
                    Ok(PlayOutcome::Done(reference)) => {
                        if reference.is_some() {
                            report.announced += 1;
                        }
                    }
                    Ok(PlayOutcome::Deferred) => report.deferred_goal = Some(index),
                    Err(e) => warn!(index, "missed goal recovery failed: {}", e),
                }
                report.recovered_goal = Some(index);
                return;
            }
        }

        for play in feed_goals {
            let index = play.index;
            let Some(new_goal) = play.goal() else {
                continue;
            };
            let Some(record) = self.cache.get(index) else {
                continue;
            };
            let Some(old_goal) = record.play.goal() else {
                continue;
            };
            let original = record.delivery_reference.clone();
            let Some(text) = announce::scoring_change_text(
                game,
                old_goal,
                new_goal,
                original.as_ref().and_then(|r| r.url.as_deref()),
            ) else {
                continue;
            };

            info!(index, scorer = %new_goal.scorer.name, "scoring change detected");
            let reference = match original {
                Some(original) => self
                    .deliver(Post::reply(text, Some(original.clone())))
                    .await
                    .or(Some(original)),
                None => {
                    debug!(index, "goal was never posted, correcting silently");
                    None
                }
            };

            if let Some(goal) = game.preferred_team_mut().goal_mut(index) {
                goal.scorer = new_goal.scorer.clone();
                goal.assists = new_goal.assists.clone();
            }
            if let Some(record) = self.cache.get_mut(index) {
                record.play = play.clone();
                record.delivery_reference = reference;
            }
            report.corrections += 1;
        }
    }

    // ── Penalties ───────────────────────────────────────────────

    async fn handle_penalty(
        &self,
        game: &Game,
        play: &Play,
        penalty: &PenaltyDetails,
        recent: bool,
    ) -> PlayOutcome {
        let strength = PenaltyStrength::from_skaters(
            game.preferred_team().skaters_on_ice,
            game.other_team().skaters_on_ice,
        );
        debug!(
            index = play.index,
            player = %penalty.committed_by.name,
            strength = %game.power_play_strength,
            ?strength,
            "penalty"
        );
        if !recent {
            return PlayOutcome::Done(None);
        }
        let text = announce::penalty_text(game, play, penalty, strength);
        PlayOutcome::Done(self.deliver(Post::new(text)).await)
    }

    // ── Periods ─────────────────────────────────────────────────

    async fn handle_period_ready(
        &self,
        game: &mut Game,
        play: &Play,
        doc: &PlayByPlayDocument,
        recent: bool,
    ) -> Result<PlayOutcome> {
        let period = play.period;
        if play.period_type == PeriodType::Shootout
            || !announce::lineup_eligible(game.game_type, period)
            || game.period.lineups_posted.contains(&period)
        {
            return Ok(PlayOutcome::Done(None));
        }
        game.period.lineups_posted.insert(period);
        if !recent {
            return Ok(PlayOutcome::Done(None));
        }

        let on_ice = doc.on_ice.side(game.preferred);
        if on_ice.is_empty() {
            return Err(BotError::Validation(format!(
                "no on-ice players for period {period}"
            )));
        }
        let text = announce::lineup_text(game, period, on_ice, &doc.roster)?;
        Ok(PlayOutcome::Done(self.deliver(Post::new(text)).await))
    }

    async fn handle_period_start(&self, game: &mut Game, play: &Play, recent: bool) -> PlayOutcome {
        let shootout = play.period_type == PeriodType::Shootout;
        if shootout {
            game.shootout_mut();
        }
        if !recent {
            return PlayOutcome::Done(None);
        }
        let Some(text) = announce::period_start_text(game, play) else {
            return PlayOutcome::Done(None);
        };
        let reference = self.deliver(Post::new(text)).await;
        if shootout {
            game.shootout_mut().last_reference = reference.clone();
        }
        PlayOutcome::Done(reference)
    }

    async fn handle_period_end(&self, game: &Game, play: &Play, recent: bool) -> PlayOutcome {
        if !recent {
            return PlayOutcome::Done(None);
        }
        let reference = match announce::period_end_text(game, play) {
            Some(text) => self.deliver(Post::new(text)).await,
            None => None,
        };
        PlayOutcome::Done(reference)
    }

    // ── Shootout ────────────────────────────────────────────────

    async fn handle_shootout_attempt(
        &self,
        game: &mut Game,
        attempt: &ShootoutAttempt,
        recent: bool,
    ) -> PlayOutcome {
        let Some(home_away) = game.side_of_team(attempt.team_id) else {
            warn!(team_id = attempt.team_id, "shootout attempt for unknown team");
            return PlayOutcome::Done(None);
        };
        let side = game.side(home_away);
        game.shootout_mut()
            .record(side, attempt.outcome == ShotOutcome::Scored);

        if !recent {
            return PlayOutcome::Done(None);
        }
        let text = announce::shootout_text(game, attempt, side);
        let reply_to = game.shootout.as_ref().and_then(|so| so.last_reference.clone());
        let reference = self.deliver(Post::reply(text, reply_to)).await;
        if reference.is_some() {
            game.shootout_mut().last_reference = reference.clone();
        }
        PlayOutcome::Done(reference)
    }

    // ── Linescore edges ─────────────────────────────────────────

    async fn announce_linescore_edges(
        &self,
        game: &Game,
        changes: &LinescoreChanges,
        report: &mut CycleReport,
    ) {
        if changes.penalty_killed {
            info!(
                game_id = game.game_id,
                "{} killed off the penalty",
                game.preferred_team().short_name()
            );
        }
        if game.game_state != GameState::Live || self.config.backfill {
            return;
        }
        for side in &changes.goalie_pulled {
            let team = game.team(*side);
            let opponent = game.team(side.opposite());
            if team.score >= opponent.score {
                debug!(team = team.short_name(), "goalie pulled while not trailing");
                continue;
            }
            let text = announce::goalie_pulled_text(game, team, opponent.score - team.score);
            if self.deliver(Post::new(text)).await.is_some() {
                report.announced += 1;
            }
        }
    }
}

/// Snapshot of the goal details currently recorded for an index
pub fn recorded_goal(game: &Game, index: EventIndex) -> Option<(HomeAway, &GoalRecord)> {
    [HomeAway::Home, HomeAway::Away]
        .into_iter()
        .find_map(|side| {
            game.team(side)
                .goals
                .iter()
                .find(|g| g.index == index)
                .map(|g| (side, g))
        })
}
