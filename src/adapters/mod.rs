//! Delivery sinks
//!
//! The engine only sees [`DeliverySink`]: hand it a [`Post`], get back a
//! [`DeliveryRef`] that later posts can reply to or quote.

pub mod console;
pub mod discord;
pub mod fanout;
pub mod mastodon;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;

pub use console::ConsoleSink;
pub use discord::DiscordWebhook;
pub use fanout::FanoutSink;
pub use mastodon::MastodonClient;

/// Durable reference to a delivered post
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeliveryRef {
    pub id: String,
    /// Public link, when the sink has one
    pub url: Option<String>,
}

impl DeliveryRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            url: None,
        }
    }
}

impl fmt::Display for DeliveryRef {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.url {
            Some(url) => write!(f, "{} ({})", self.id, url),
            None => write!(f, "{}", self.id),
        }
    }
}

/// One logical announcement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub text: String,
    pub reply_to: Option<DeliveryRef>,
}

impl Post {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            reply_to: None,
        }
    }

    pub fn reply(text: impl Into<String>, reply_to: Option<DeliveryRef>) -> Self {
        Self {
            text: text.into(),
            reply_to,
        }
    }
}

/// Publishes posts.
///
/// Callers invoke `post` at most once per logical announcement; sinks do not
/// dedupe and must not retry on their own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn post(&self, post: &Post) -> Result<DeliveryRef>;

    fn name(&self) -> &'static str;
}
