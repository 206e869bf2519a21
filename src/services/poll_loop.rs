//! Game poll loop
//!
//! Drives one game from preview to the end-of-game posts. Each state picks
//! its own cadence; every wait goes through the shutdown handle so a signal
//! ends the loop between cycles without another fetch or post.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::state_machine::{LoopEvent, LoopState, LoopStateMachine};
use crate::adapters::Post;
use crate::announce;
use crate::config::ScriptConfig;
use crate::coordination::ShutdownHandle;
use crate::domain::{Game, GameState};
use crate::engine::{FinalizeStatus, ReconciliationEngine};
use crate::error::Result;
use crate::feed::SnapshotFetcher;

/// Loop cadence, fixed for the life of a game
#[derive(Debug, Clone, PartialEq)]
pub struct LoopSettings {
    pub live_poll_interval: Duration,
    pub preview_recheck: Duration,
    pub pregame_poll_interval: Duration,
    pub final_poll_interval: Duration,
    pub final_retry_limit: u32,
    pub final_without_game_end_polls: u32,
}

impl LoopSettings {
    pub fn from_script(script: &ScriptConfig) -> Self {
        Self {
            live_poll_interval: script.live_poll_interval(),
            preview_recheck: script.preview_recheck(),
            pregame_poll_interval: script.pregame_poll_interval(),
            final_poll_interval: script.final_poll_interval(),
            final_retry_limit: script.final_retry_limit,
            final_without_game_end_polls: script.final_without_game_end_polls,
        }
    }
}

/// How the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// End-of-game checklist settled
    Done,
    /// Shutdown requested before the game was finished
    Cancelled,
}

/// Result of one state step
enum Step {
    Continue,
    Cancelled,
}

pub struct GameLoop {
    game: Game,
    engine: ReconciliationEngine,
    fetcher: Arc<dyn SnapshotFetcher>,
    shutdown: ShutdownHandle,
    settings: LoopSettings,
    machine: LoopStateMachine,
}

impl GameLoop {
    pub fn new(
        game: Game,
        engine: ReconciliationEngine,
        fetcher: Arc<dyn SnapshotFetcher>,
        shutdown: ShutdownHandle,
        settings: LoopSettings,
    ) -> Self {
        let machine = LoopStateMachine::new(LoopState::from(game.game_state));
        Self {
            game,
            engine,
            fetcher,
            shutdown,
            settings,
            machine,
        }
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn engine(&self) -> &ReconciliationEngine {
        &self.engine
    }

    pub fn state(&self) -> LoopState {
        self.machine.state()
    }

    /// Runs until the game is finished or shutdown is requested
    pub async fn run(&mut self) -> Result<LoopOutcome> {
        info!(
            game_id = self.game.game_id,
            state = %self.machine.state(),
            "{} @ {} poll loop starting",
            self.game.away.identity.full_name,
            self.game.home.identity.full_name
        );

        loop {
            if self.shutdown.is_shutdown_requested() {
                return self.cancel();
            }

            let step = match self.machine.state() {
                LoopState::Preview => self.preview_step().await?,
                LoopState::Live => self.live_step().await?,
                LoopState::Final => self.final_step().await?,
                LoopState::Done => {
                    info!(game_id = self.game.game_id, "poll loop done");
                    return Ok(LoopOutcome::Done);
                }
            };

            if let Step::Cancelled = step {
                return self.cancel();
            }
        }
    }

    fn cancel(&mut self) -> Result<LoopOutcome> {
        let from = self.machine.state();
        if !self.machine.is_done() {
            self.machine.transition(LoopEvent::Cancelled)?;
        }
        info!(game_id = self.game.game_id, "poll loop cancelled in {}", from);
        Ok(LoopOutcome::Cancelled)
    }

    async fn wait(&self, duration: Duration) -> Step {
        if self.shutdown.sleep(duration).await {
            Step::Continue
        } else {
            Step::Cancelled
        }
    }

    // ── Preview ─────────────────────────────────────────────────

    async fn preview_step(&mut self) -> Result<Step> {
        let countdown = self.game.countdown(Utc::now());

        if let Ok(until_start) = countdown.to_std() {
            if until_start > Duration::ZERO {
                if !self.game.pregame_checklist.preview_sent {
                    let text = announce::preview_text(&self.game);
                    self.engine.deliver(Post::new(text)).await;
                    self.game.pregame_checklist.preview_sent = true;
                }
                let wait = until_start.min(self.settings.preview_recheck);
                info!(game_id = self.game.game_id, ?until_start, ?wait, "waiting for puck drop");
                return Ok(self.wait(wait).await);
            }
        }

        // start time passed, poll until the feed flips
        match self.fetcher.fetch(self.game.game_id).await {
            Ok(doc) if doc.game_state != GameState::Preview => {
                self.game.transition_state(GameState::Live);
                self.machine.transition(LoopEvent::PuckDropped)?;
                return Ok(Step::Continue);
            }
            Ok(doc) => debug!(detailed = %doc.detailed_state, "game not started yet"),
            Err(e) => warn!(game_id = self.game.game_id, "preview fetch failed: {}", e),
        }
        Ok(self.wait(self.settings.pregame_poll_interval).await)
    }

    // ── Live ────────────────────────────────────────────────────

    async fn live_step(&mut self) -> Result<Step> {
        let doc = match self.fetcher.fetch(self.game.game_id).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(game_id = self.game.game_id, "live fetch failed: {}", e);
                return Ok(self.wait(self.settings.live_poll_interval).await);
            }
        };

        let report = self.engine.reconcile(&mut self.game, &doc, Utc::now()).await;
        debug!(?report, "cycle complete");

        if doc.game_state == GameState::Final {
            if !self.game.game_end_seen {
                self.game.final_polls_without_game_end += 1;
            }
            let polls = self.game.final_polls_without_game_end;
            if self.game.game_end_seen || polls >= self.settings.final_without_game_end_polls {
                self.game.transition_state(GameState::Final);
                self.machine.transition(LoopEvent::FinalConfirmed)?;
                return Ok(Step::Continue);
            }
            debug!(polls, "feed reads final without a game end play, waiting");
        }

        let wait = report
            .intermission_sleep
            .unwrap_or(self.settings.live_poll_interval);
        Ok(self.wait(wait).await)
    }

    // ── Final ───────────────────────────────────────────────────

    async fn final_step(&mut self) -> Result<Step> {
        let doc = match self.fetcher.fetch(self.game.game_id).await {
            Ok(doc) => doc,
            Err(e) => {
                warn!(game_id = self.game.game_id, "final fetch failed: {}", e);
                return Ok(self.wait(self.settings.final_poll_interval).await);
            }
        };

        // late scoring changes still land after the horn
        self.engine.reconcile(&mut self.game, &doc, Utc::now()).await;

        match self
            .engine
            .finalize(&mut self.game, &doc, self.settings.final_retry_limit)
            .await
        {
            FinalizeStatus::Complete | FinalizeStatus::GaveUp => {
                self.machine.transition(LoopEvent::ChecklistSettled)?;
                Ok(Step::Continue)
            }
            FinalizeStatus::Pending => Ok(self.wait(self.settings.final_poll_interval).await),
        }
    }
}
