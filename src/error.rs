use thiserror::Error;

/// Main error type for the game bot
#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed unavailable: {0}")]
    FeedUnavailable(String),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Feed content errors
    #[error("Malformed play {index}: {reason}")]
    MalformedPlay { index: u32, reason: String },

    #[error("Roster entry missing for player {0}")]
    MissingRosterEntry(u64),

    #[error("Schedule lookup failed: {0}")]
    Schedule(String),

    // Delivery errors
    #[error("Delivery failed: {0}")]
    Delivery(String),

    // State machine errors
    #[error("Invalid state transition: from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl BotError {
    /// Whether a fetch that failed with this error is worth retrying.
    ///
    /// Network hiccups, upstream 5xx responses and half-written JSON documents
    /// clear up on their own; configuration and content errors do not.
    pub fn is_transient(&self) -> bool {
        match self {
            BotError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.is_request()
                    || e.is_body()
                    || e.is_decode()
                    || e.status().map(|s| s.is_server_error() || s.as_u16() == 429).unwrap_or(false)
            }
            BotError::FeedUnavailable(_) | BotError::Json(_) | BotError::Other(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for BotError
pub type Result<T> = std::result::Result<T, BotError>;

/// Specific error types for the delivery sinks
#[derive(Error, Debug, Clone)]
pub enum DeliveryError {
    #[error("Post rejected by {sink}: HTTP {status} - {body}")]
    Rejected {
        sink: String,
        status: u16,
        body: String,
    },

    #[error("Rate limited by {sink}")]
    RateLimited { sink: String },

    #[error("Transport failure on {sink}: {reason}")]
    Transport { sink: String, reason: String },

    #[error("Primary sink {sink} did not accept the post")]
    PrimaryFailed { sink: String },

    #[error("No sink configured")]
    NoSinkConfigured,
}

impl From<DeliveryError> for BotError {
    fn from(err: DeliveryError) -> Self {
        BotError::Delivery(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(BotError::FeedUnavailable("503".into()).is_transient());
        assert!(BotError::Json(serde_json::from_str::<u32>("{").unwrap_err()).is_transient());
        assert!(!BotError::MissingRosterEntry(8471233).is_transient());
        assert!(!BotError::Cancelled.is_transient());
    }

    #[test]
    fn test_delivery_error_converts() {
        let err: BotError = DeliveryError::RateLimited {
            sink: "mastodon".into(),
        }
        .into();
        assert!(matches!(err, BotError::Delivery(ref msg) if msg.contains("mastodon")));
    }
}
