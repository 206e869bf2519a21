use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "hockeygamebot")]
#[command(version)]
#[command(about = "Posts live NHL game events for one team", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config directory (default.toml, {HGB_ENV}.toml)
    #[arg(short, long, env = "HGB_CONFIG_DIR", default_value = "config")]
    pub config: String,

    /// Schedule date to look up (default: today, local time)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    /// Follow this game id and skip the schedule lookup
    #[arg(short, long)]
    pub game_id: Option<u64>,

    /// Preferred team id, overrides team.id
    #[arg(short, long)]
    pub team: Option<u64>,

    /// Replay a finished game: every play is announced, nothing sleeps
    #[arg(long)]
    pub backfill: bool,

    /// Log posts instead of sending them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Load and validate configuration, then print the resolved options
    CheckConfig,
}

impl Cli {
    /// Folds command-line overrides into the loaded configuration
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(team) = self.team {
            config.team.id = team;
        }
        if let Some(game_id) = self.game_id {
            config.team.game_id = Some(game_id);
        }
        if self.dry_run {
            config.socials.dry_run = true;
        }
    }
}

/// Human-readable dump of the options the bot will run with
pub fn describe_config(config: &AppConfig) -> String {
    let script = &config.script;
    let sinks = if config.socials.dry_run {
        "console (dry run)".to_string()
    } else {
        let mut sinks = Vec::new();
        if config.socials.mastodon_instance.is_some() && config.socials.mastodon_token.is_some() {
            sinks.push("mastodon");
        }
        if config.socials.discord_webhook_url.is_some() {
            sinks.push("discord");
        }
        sinks.join(" + ")
    };

    let game = match config.team.game_id {
        Some(id) => id.to_string(),
        None => "schedule lookup".to_string(),
    };

    format!(
        "team:                          {}\n\
         game:                          {}\n\
         sinks:                         {}\n\
         event_recency_window_seconds:  {}\n\
         intermission_safety_margin:    {}s\n\
         live_poll_interval_seconds:    {}\n\
         assist_retry_count:            {}\n\
         assist_retry_delay_seconds:    {}\n\
         final_retry_limit:             {}",
        config.team.id,
        game,
        sinks,
        script.event_recency_window_seconds,
        script.intermission_safety_margin_seconds,
        script.live_poll_interval_seconds,
        script.assist_retry_count,
        script.assist_retry_delay_seconds,
        script.final_retry_limit,
    )
}
