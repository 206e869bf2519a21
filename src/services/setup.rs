//! Startup: find today's game and build its aggregate

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::domain::Game;
use crate::error::{BotError, Result};
use crate::feed::{season_id, NhlApiClient, PlayByPlayDocument, SnapshotFetcher};

/// Game to follow: the configured override, else the team's game on `date`.
///
/// No game is fatal; there is nothing to reconcile without one.
pub async fn resolve_game_id(
    client: &NhlApiClient,
    team_id: u64,
    game_id: Option<u64>,
    date: NaiveDate,
) -> Result<u64> {
    if let Some(game_id) = game_id {
        info!(game_id, "using configured game id");
        return Ok(game_id);
    }

    match client.find_game(team_id, date).await? {
        Some(game_id) => {
            info!(team_id, %date, game_id, "found scheduled game");
            Ok(game_id)
        }
        None => Err(BotError::Schedule(format!(
            "team {} has no game scheduled on {}",
            team_id, date
        ))),
    }
}

/// Fetches the first snapshot and builds the game from it
pub async fn prepare_game(
    fetcher: &dyn SnapshotFetcher,
    game_id: u64,
    team_id: u64,
) -> Result<(Game, PlayByPlayDocument)> {
    let doc = fetcher.fetch(game_id).await?;
    let game = Game::from_document(&doc, team_id)?;
    info!(
        game_id,
        state = %game.game_state,
        venue = %game.venue,
        "{} @ {}",
        game.away.identity.short_name,
        game.home.identity.short_name
    );
    Ok((game, doc))
}

/// Loads the preferred team's leading-after-period records.
///
/// Only the period-end recap uses these, so a failure is logged and the game
/// goes ahead without them.
pub async fn load_lead_records(client: &NhlApiClient, game: &mut Game, date: NaiveDate) {
    let team_id = game.preferred_team().id();
    let season = season_id(date);
    match client.lead_records(team_id, &season).await {
        Ok(records) => {
            game.preferred_team_mut().lead_after = records;
        }
        Err(e) => warn!(team_id, %season, "lead records unavailable: {}", e),
    }
}
