use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub team: TeamConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub script: ScriptConfig,
    #[serde(default)]
    pub socials: SocialsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeamConfig {
    /// League team id of the preferred team (e.g., 1 = New Jersey Devils)
    pub id: u64,
    /// Skip the schedule lookup and follow this game directly
    #[serde(default)]
    pub game_id: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsConfig {
    /// Base URL of the live-feed / schedule API
    #[serde(default = "default_stats_api")]
    pub stats_api: String,
    /// Base URL of the stats reports API (leading / trailing records)
    #[serde(default = "default_reports_api")]
    pub reports_api: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
}

fn default_stats_api() -> String {
    "https://statsapi.web.nhl.com".to_string()
}

fn default_reports_api() -> String {
    "https://api.nhle.com/stats/rest/en".to_string()
}

fn default_http_timeout() -> u64 {
    10
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            stats_api: default_stats_api(),
            reports_api: default_reports_api(),
            http_timeout_seconds: default_http_timeout(),
        }
    }
}

/// Timing and retry knobs for the poll loop and the reconciliation engine.
///
/// All values are read once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptConfig {
    /// Maximum age of a play for it to still be announced
    #[serde(default = "default_recency_window")]
    pub event_recency_window_seconds: u64,
    /// Subtracted from the reported intermission time before sleeping through it
    #[serde(default = "default_intermission_margin")]
    pub intermission_safety_margin_seconds: u64,
    /// Sleep between polls while the game is live
    #[serde(default = "default_live_poll_interval")]
    pub live_poll_interval_seconds: u64,
    /// Re-checks of a goal with no assists before accepting it as unassisted
    #[serde(default = "default_assist_retry_count")]
    pub assist_retry_count: u32,
    /// Delay before each assist re-check
    #[serde(default = "default_assist_retry_delay")]
    pub assist_retry_delay_seconds: u64,
    /// Upper bound on a single pregame sleep
    #[serde(default = "default_preview_recheck")]
    pub preview_recheck_seconds: u64,
    /// Poll interval once start time has passed but the game is not live yet
    #[serde(default = "default_pregame_poll_interval")]
    pub pregame_poll_interval_seconds: u64,
    /// Poll interval while waiting for end-of-game data
    #[serde(default = "default_final_poll_interval")]
    pub final_poll_interval_seconds: u64,
    /// Final-state polls before giving up on the three stars
    #[serde(default = "default_final_retry_limit")]
    pub final_retry_limit: u32,
    /// Retries around a single snapshot fetch
    #[serde(default = "default_fetch_max_retries")]
    pub fetch_max_retries: u32,
    /// Consecutive polls a recorded goal may be missing before it is dropped
    #[serde(default = "default_goal_removal_checks")]
    pub goal_removal_checks: u32,
    /// Final-state polls accepted without a game-end play
    #[serde(default = "default_final_without_game_end")]
    pub final_without_game_end_polls: u32,
    /// Power the host off once the game is done
    #[serde(default)]
    pub shutdown_on_done: bool,
}

fn default_recency_window() -> u64 {
    120
}

fn default_intermission_margin() -> u64 {
    60
}

fn default_live_poll_interval() -> u64 {
    5
}

fn default_assist_retry_count() -> u32 {
    2
}

fn default_assist_retry_delay() -> u64 {
    4
}

fn default_preview_recheck() -> u64 {
    1800
}

fn default_pregame_poll_interval() -> u64 {
    30
}

fn default_final_poll_interval() -> u64 {
    10
}

fn default_final_retry_limit() -> u32 {
    30
}

fn default_fetch_max_retries() -> u32 {
    3
}

fn default_goal_removal_checks() -> u32 {
    5
}

fn default_final_without_game_end() -> u32 {
    3
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            event_recency_window_seconds: default_recency_window(),
            intermission_safety_margin_seconds: default_intermission_margin(),
            live_poll_interval_seconds: default_live_poll_interval(),
            assist_retry_count: default_assist_retry_count(),
            assist_retry_delay_seconds: default_assist_retry_delay(),
            preview_recheck_seconds: default_preview_recheck(),
            pregame_poll_interval_seconds: default_pregame_poll_interval(),
            final_poll_interval_seconds: default_final_poll_interval(),
            final_retry_limit: default_final_retry_limit(),
            fetch_max_retries: default_fetch_max_retries(),
            goal_removal_checks: default_goal_removal_checks(),
            final_without_game_end_polls: default_final_without_game_end(),
            shutdown_on_done: false,
        }
    }
}

impl ScriptConfig {
    pub fn recency_window(&self) -> Duration {
        Duration::from_secs(self.event_recency_window_seconds)
    }

    pub fn intermission_safety_margin(&self) -> Duration {
        Duration::from_secs(self.intermission_safety_margin_seconds)
    }

    pub fn live_poll_interval(&self) -> Duration {
        Duration::from_secs(self.live_poll_interval_seconds)
    }

    pub fn assist_retry_delay(&self) -> Duration {
        Duration::from_secs(self.assist_retry_delay_seconds)
    }

    pub fn preview_recheck(&self) -> Duration {
        Duration::from_secs(self.preview_recheck_seconds)
    }

    pub fn pregame_poll_interval(&self) -> Duration {
        Duration::from_secs(self.pregame_poll_interval_seconds)
    }

    pub fn final_poll_interval(&self) -> Duration {
        Duration::from_secs(self.final_poll_interval_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SocialsConfig {
    /// Mastodon-compatible instance (e.g., "https://mastodon.social")
    #[serde(default)]
    pub mastodon_instance: Option<String>,
    /// Access token for the instance
    #[serde(default)]
    pub mastodon_token: Option<String>,
    /// Discord webhook that mirrors every post
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    /// Log posts instead of sending them
    #[serde(default)]
    pub dry_run: bool,
}

impl SocialsConfig {
    pub fn has_live_sink(&self) -> bool {
        let mastodon = self.mastodon_instance.is_some() && self.mastodon_token.is_some();
        mastodon || self.discord_webhook_url.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("team.id", 1)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("script.live_poll_interval_seconds", 5)?
            .set_default("socials.dry_run", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("HGB_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (HGB_TEAM__ID, HGB_SOCIALS__DRY_RUN, etc.)
            .add_source(
                Environment::with_prefix("HGB")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration for CLI usage
    pub fn default_config(team_id: u64, dry_run: bool) -> Self {
        Self {
            team: TeamConfig {
                id: team_id,
                game_id: None,
            },
            endpoints: EndpointsConfig::default(),
            script: ScriptConfig::default(),
            socials: SocialsConfig {
                dry_run,
                ..SocialsConfig::default()
            },
            logging: LoggingConfig::default(),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        let script = &self.script;

        if self.team.id == 0 {
            errors.push("team.id must be a league team id".to_string());
        }

        if script.live_poll_interval_seconds == 0 {
            errors.push("live_poll_interval_seconds must be positive".to_string());
        }

        if script.final_poll_interval_seconds == 0 || script.pregame_poll_interval_seconds == 0 {
            errors.push("pregame and final poll intervals must be positive".to_string());
        }

        if script.intermission_safety_margin_seconds == 0 {
            errors.push("intermission_safety_margin_seconds must be positive".to_string());
        }

        if script.event_recency_window_seconds == 0 {
            errors.push("event_recency_window_seconds must be positive".to_string());
        }

        if self.endpoints.http_timeout_seconds == 0 {
            errors.push("http_timeout_seconds must be positive".to_string());
        }

        if !self.socials.dry_run && !self.socials.has_live_sink() {
            errors.push(
                "no delivery sink configured: set socials.mastodon_instance + mastodon_token, \
                 socials.discord_webhook_url, or socials.dry_run"
                    .to_string(),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
