mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::*;
use hockeygamebot::coordination::{ShutdownHandle, ShutdownSignal};
use hockeygamebot::domain::{Game, GameState};
use hockeygamebot::engine::ReconciliationEngine;
use hockeygamebot::feed::PlayByPlayDocument;
use hockeygamebot::services::{GameLoop, LoopOutcome, LoopSettings, LoopState};
use std::sync::Arc;
use std::time::Duration;

fn settings() -> LoopSettings {
    LoopSettings {
        live_poll_interval: Duration::from_millis(1),
        preview_recheck: Duration::from_secs(3600),
        pregame_poll_interval: Duration::from_millis(1),
        final_poll_interval: Duration::from_millis(1),
        final_retry_limit: 5,
        final_without_game_end_polls: 3,
    }
}

fn game_loop(
    first: &PlayByPlayDocument,
    fetcher: Arc<ScriptedFetcher>,
    sink: Arc<RecordingSink>,
    settings: LoopSettings,
) -> (GameLoop, ShutdownHandle) {
    let shutdown = ShutdownHandle::new();
    let game = Game::from_document(first, DEVILS).expect("devils play in the fixture game");
    let engine = ReconciliationEngine::new(fetcher.clone(), sink, shutdown.clone(), fast_config());
    let game_loop = GameLoop::new(game, engine, fetcher, shutdown.clone(), settings);
    (game_loop, shutdown)
}

fn live_doc() -> PlayByPlayDocument {
    Feed::new("Live")
        .plays(vec![play(1, "FACEOFF", 1, ago(600), (0, 0))])
        .build()
}

/// Final feed ending 2-1 for the Devils, with or without the game end play
fn final_doc(game_end: bool, stars: bool) -> PlayByPlayDocument {
    let mut plays = vec![play(1, "FACEOFF", 1, ago(600), (0, 0))];
    if game_end {
        plays.push(play(2, "GAME_END", 3, ago(5), (2, 1)));
    }
    let feed = Feed::new("Final").plays(plays).score(2, 1).period(3);
    let feed = if stars {
        feed.stars(HUGHES, SHESTERKIN, HISCHIER)
    } else {
        feed
    };
    feed.build()
}

async fn run(game_loop: &mut GameLoop) -> LoopOutcome {
    tokio::time::timeout(Duration::from_secs(10), game_loop.run())
        .await
        .expect("poll loop should finish")
        .expect("poll loop should not error")
}

#[tokio::test]
async fn live_game_finishes_on_game_end_play() {
    let fetcher = ScriptedFetcher::new(vec![Some(live_doc()), Some(final_doc(true, true))]);
    let sink = RecordingSink::new();
    let (mut game_loop, _shutdown) =
        game_loop(&live_doc(), fetcher.clone(), sink.clone(), settings());

    let outcome = run(&mut game_loop).await;

    assert_eq!(outcome, LoopOutcome::Done);
    assert_eq!(game_loop.state(), LoopState::Done);
    assert_eq!(game_loop.game().game_state, GameState::Final);
    assert!(game_loop.game().game_end_seen);
    // live poll, live poll that sees the end, one final poll
    assert_eq!(fetcher.fetches(), 3);

    let texts = sink.texts();
    assert_eq!(texts.len(), 2);
    assert_eq!(
        texts[0],
        "Devils win at home over the Rangers by a score of 2 to 1! 🚨🚨🚨"
    );
    assert!(texts[1].starts_with("The three stars for the game are"));
    assert!(texts[1].contains("Jack Hughes (NJD)"));
}

/// The feed may read final before the game end play lands
#[tokio::test]
async fn final_state_without_game_end_needs_consecutive_polls() {
    let fetcher = ScriptedFetcher::repeating(final_doc(false, true));
    let sink = RecordingSink::new();
    let (mut game_loop, _shutdown) =
        game_loop(&live_doc(), fetcher.clone(), sink.clone(), settings());

    let outcome = run(&mut game_loop).await;

    assert_eq!(outcome, LoopOutcome::Done);
    assert!(!game_loop.game().game_end_seen);
    assert_eq!(game_loop.game().final_polls_without_game_end, 3);
    // three live polls to confirm, one final poll
    assert_eq!(fetcher.fetches(), 4);
    assert_eq!(sink.posts().len(), 2);
}

#[tokio::test]
async fn three_stars_deferred_until_published() {
    let first = final_doc(true, false);
    let fetcher = ScriptedFetcher::new(vec![
        Some(first.clone()),
        Some(final_doc(true, false)),
        Some(final_doc(true, true)),
    ]);
    let sink = RecordingSink::new();
    let (mut game_loop, _shutdown) = game_loop(&first, fetcher.clone(), sink.clone(), settings());
    assert_eq!(game_loop.state(), LoopState::Final);

    let outcome = run(&mut game_loop).await;

    assert_eq!(outcome, LoopOutcome::Done);
    assert_eq!(fetcher.fetches(), 3);
    let checklist = game_loop.game().final_checklist;
    assert!(checklist.final_score_sent);
    assert!(checklist.three_stars_sent);
    assert_eq!(checklist.stars_attempts, 2);
    assert_eq!(sink.count_containing("by a score of"), 1);
    assert_eq!(sink.count_containing("three stars"), 1);
}

#[tokio::test]
async fn three_stars_given_up_at_retry_ceiling() {
    let first = final_doc(true, false);
    let fetcher = ScriptedFetcher::repeating(first.clone());
    let sink = RecordingSink::new();
    let settings = LoopSettings {
        final_retry_limit: 3,
        ..settings()
    };
    let (mut game_loop, _shutdown) = game_loop(&first, fetcher.clone(), sink.clone(), settings);

    let outcome = run(&mut game_loop).await;

    assert_eq!(outcome, LoopOutcome::Done);
    assert_eq!(fetcher.fetches(), 3);
    assert!(!game_loop.game().final_checklist.three_stars_sent);
    assert_eq!(sink.texts().len(), 1);
    assert!(sink.texts()[0].contains("by a score of 2 to 1"));
}

/// A failed fetch waits out the interval and polls again
#[tokio::test]
async fn fetch_failure_does_not_end_the_loop() {
    let fetcher = ScriptedFetcher::new(vec![None, None, Some(final_doc(true, true))]);
    let sink = RecordingSink::new();
    let (mut game_loop, _shutdown) =
        game_loop(&live_doc(), fetcher.clone(), sink.clone(), settings());

    let outcome = run(&mut game_loop).await;

    assert_eq!(outcome, LoopOutcome::Done);
    assert_eq!(fetcher.fetches(), 4);
    assert_eq!(sink.posts().len(), 2);
}

#[tokio::test]
async fn shutdown_stops_polling_between_cycles() {
    let fetcher = ScriptedFetcher::repeating(live_doc());
    let sink = RecordingSink::new();
    let (mut game_loop, shutdown) =
        game_loop(&live_doc(), fetcher.clone(), sink.clone(), settings());
    fetcher.cancel_after(2, shutdown);

    let outcome = run(&mut game_loop).await;

    assert_eq!(outcome, LoopOutcome::Cancelled);
    assert_eq!(game_loop.state(), LoopState::Done);
    assert_eq!(fetcher.fetches(), 2);
    assert!(sink.posts().is_empty());
}

#[tokio::test]
async fn intermission_sleep_is_cancellable() {
    let doc = Feed::new("Live")
        .plays(vec![
            play(1, "FACEOFF", 1, ago(1500), (0, 0)),
            play(2, "PERIOD_END", 1, ago(5), (0, 0)),
        ])
        .intermission(1020)
        .build();
    let fetcher = ScriptedFetcher::repeating(doc.clone());
    let sink = RecordingSink::new();
    let (mut game_loop, shutdown) = game_loop(&doc, fetcher.clone(), sink.clone(), settings());

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown.request_shutdown(ShutdownSignal::Graceful);
    });

    let outcome = run(&mut game_loop).await;
    canceller.await.expect("canceller task");

    assert_eq!(outcome, LoopOutcome::Cancelled);
    // one poll, then the sixteen-minute intermission wait was cut short
    assert_eq!(fetcher.fetches(), 1);
    assert_eq!(sink.count_containing("The 1st period of"), 1);
}

#[tokio::test]
async fn preview_posted_once_while_waiting_for_puck_drop() {
    let doc = Feed::new("Preview")
        .start_time(Utc::now() + ChronoDuration::hours(2))
        .build();
    let fetcher = ScriptedFetcher::repeating(doc.clone());
    let sink = RecordingSink::new();
    let settings = LoopSettings {
        preview_recheck: Duration::from_millis(5),
        ..settings()
    };
    let (mut game_loop, shutdown) = game_loop(&doc, fetcher.clone(), sink.clone(), settings);
    assert_eq!(game_loop.state(), LoopState::Preview);

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.request_shutdown(ShutdownSignal::Graceful);
    });

    let outcome = run(&mut game_loop).await;
    canceller.await.expect("canceller task");

    assert_eq!(outcome, LoopOutcome::Cancelled);
    assert_eq!(fetcher.fetches(), 0);
    let texts = sink.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].starts_with("Tonight's game: New York Rangers @ New Jersey Devils"));
    assert!(game_loop.game().pregame_checklist.preview_sent);
}

#[tokio::test]
async fn puck_drop_moves_preview_to_live() {
    let preview = Feed::new("Preview").start_time(ago(60)).build();
    let fetcher = ScriptedFetcher::new(vec![
        Some(preview.clone()),
        Some(live_doc()),
        Some(final_doc(true, true)),
    ]);
    let sink = RecordingSink::new();
    let (mut game_loop, _shutdown) = game_loop(&preview, fetcher.clone(), sink.clone(), settings());

    let outcome = run(&mut game_loop).await;

    assert_eq!(outcome, LoopOutcome::Done);
    // start time already passed, so no preview post
    assert_eq!(sink.count_containing("Tonight's game"), 0);
    assert_eq!(sink.count_containing("by a score of"), 1);
    // two preview polls, one live poll on the final feed, one final poll
    assert_eq!(fetcher.fetches(), 4);
}
