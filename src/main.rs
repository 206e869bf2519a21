use clap::Parser;
use hockeygamebot::adapters::{
    ConsoleSink, DeliverySink, DiscordWebhook, FanoutSink, MastodonClient,
};
use hockeygamebot::cli::{describe_config, Cli, Commands};
use hockeygamebot::config::AppConfig;
use hockeygamebot::coordination::{install_signal_handlers, ShutdownHandle};
use hockeygamebot::engine::{EngineConfig, ReconciliationEngine};
use hockeygamebot::error::{BotError, Result};
use hockeygamebot::feed::{NhlApiClient, RetryConfig, RetryingFetcher, SnapshotFetcher};
use hockeygamebot::services::{
    load_lead_records, prepare_game, resolve_game_id, GameLoop, LoopOutcome, LoopSettings,
};
use std::sync::Arc;
use tracing::{error, info, warn};

mod main_runtime;
use main_runtime::{init_logging, init_logging_simple};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)?;
    cli.apply_overrides(&mut config);

    if let Some(Commands::CheckConfig) = cli.command {
        init_logging_simple();
        return check_config(&config);
    }

    init_logging(&config.logging);

    if let Err(errors) = config.validate() {
        for e in &errors {
            error!("config: {}", e);
        }
        return Err(BotError::Validation(errors.join("; ")));
    }

    let shutdown = ShutdownHandle::new();
    install_signal_handlers(shutdown.clone());

    let outcome = run_game(&cli, &config, shutdown).await?;
    info!(?outcome, "hockeygamebot finished");

    if outcome == LoopOutcome::Done && config.script.shutdown_on_done {
        shutdown_host();
    }
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            println!("\x1b[32m✓ configuration OK\x1b[0m");
            println!("{}", describe_config(config));
            Ok(())
        }
        Err(errors) => {
            for e in &errors {
                println!("\x1b[31m✗ {e}\x1b[0m");
            }
            Err(BotError::Validation(errors.join("; ")))
        }
    }
}

/// Mastodon first so its references thread replies, Discord mirrors
fn build_sink(config: &AppConfig) -> Arc<dyn DeliverySink> {
    let socials = &config.socials;
    if socials.dry_run {
        info!("dry run, posts go to the log only");
        return Arc::new(ConsoleSink::new());
    }

    let mut sinks: Vec<Arc<dyn DeliverySink>> = Vec::new();
    if let (Some(instance), Some(token)) = (&socials.mastodon_instance, &socials.mastodon_token) {
        info!(instance = %instance, "mastodon sink enabled");
        sinks.push(MastodonClient::new(instance, token));
    }
    let discord = socials
        .discord_webhook_url
        .clone()
        .map(DiscordWebhook::new)
        .or_else(DiscordWebhook::from_env);
    if let Some(discord) = discord {
        sinks.push(discord);
    }
    Arc::new(FanoutSink::new(sinks))
}

async fn run_game(cli: &Cli, config: &AppConfig, shutdown: ShutdownHandle) -> Result<LoopOutcome> {
    let client = Arc::new(NhlApiClient::new(&config.endpoints)?);
    let date = cli.date.unwrap_or_else(|| chrono::Local::now().date_naive());

    let game_id = resolve_game_id(&client, config.team.id, config.team.game_id, date).await?;

    let fetcher: Arc<dyn SnapshotFetcher> = Arc::new(RetryingFetcher::new(
        client.clone(),
        RetryConfig::with_max_retries(config.script.fetch_max_retries),
        shutdown.clone(),
    ));
    let (mut game, _) = prepare_game(fetcher.as_ref(), game_id, config.team.id).await?;
    load_lead_records(&client, &mut game, date).await;

    if cli.backfill {
        warn!(game_id, "backfill mode: every play will be announced");
    }

    let engine = ReconciliationEngine::new(
        fetcher.clone(),
        build_sink(config),
        shutdown.clone(),
        EngineConfig::from_script(&config.script, cli.backfill),
    );
    let mut game_loop = GameLoop::new(
        game,
        engine,
        fetcher,
        shutdown,
        LoopSettings::from_script(&config.script),
    );
    game_loop.run().await
}

fn shutdown_host() {
    info!("shutdown_on_done set, shutting the host down");
    match std::process::Command::new("shutdown").args(["-h", "now"]).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("host shutdown exited with {}", status),
        Err(e) => warn!("host shutdown failed: {}", e),
    }
}
