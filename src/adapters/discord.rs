//! Discord webhook mirror
//!
//! Posts every announcement to a channel webhook. Webhooks cannot thread, so
//! replies are sent as plain messages with a link back to the original.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

use super::{DeliveryRef, DeliverySink, Post};
use crate::error::{DeliveryError, Result};

/// Discord webhook client
#[derive(Clone)]
pub struct DiscordWebhook {
    client: Client,
    webhook_url: String,
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    content: &'a str,
}

#[derive(Deserialize)]
struct WebhookResponse {
    id: String,
    channel_id: Option<String>,
}

impl DiscordWebhook {
    /// Create a new webhook client from environment variable
    pub fn from_env() -> Option<Arc<Self>> {
        std::env::var("DISCORD_WEBHOOK_URL").ok().map(|url| {
            info!("Discord mirror enabled");
            Self::new(url)
        })
    }

    /// Create a new webhook client with explicit URL
    pub fn new(webhook_url: String) -> Arc<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Arc::new(Self {
            client,
            webhook_url,
        })
    }

    fn content_for(post: &Post) -> String {
        match post.reply_to.as_ref().and_then(|r| r.url.as_deref()) {
            Some(url) => format!("{}\n{}", post.text, url),
            None => post.text.clone(),
        }
    }

    /// Send a text message to the channel
    pub async fn send_message(&self, text: &str) -> std::result::Result<DeliveryRef, DeliveryError> {
        let message = WebhookMessage { content: text };

        // wait=true makes Discord return the created message
        let url = format!("{}?wait=true", self.webhook_url);
        match self.client.post(&url).json(&message).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status.as_u16() == 429 {
                    error!("Discord webhook rate limited");
                    return Err(DeliveryError::RateLimited {
                        sink: "discord".into(),
                    });
                }
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    error!("Discord webhook failed: {} - {}", status, body);
                    return Err(DeliveryError::Rejected {
                        sink: "discord".into(),
                        status: status.as_u16(),
                        body,
                    });
                }
                match resp.json::<WebhookResponse>().await {
                    Ok(created) => {
                        debug!(
                            "Discord message {} sent to channel {:?}",
                            created.id, created.channel_id
                        );
                        Ok(DeliveryRef::new(created.id))
                    }
                    Err(e) => Err(DeliveryError::Transport {
                        sink: "discord".into(),
                        reason: format!("unreadable response: {e}"),
                    }),
                }
            }
            Err(e) => {
                error!("Discord request failed: {}", e);
                Err(DeliveryError::Transport {
                    sink: "discord".into(),
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl DeliverySink for DiscordWebhook {
    async fn post(&self, post: &Post) -> Result<DeliveryRef> {
        let content = Self::content_for(post);
        Ok(self.send_message(&content).await?)
    }

    fn name(&self) -> &'static str {
        "discord"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_appends_original_link() {
        let original = DeliveryRef {
            id: "1".into(),
            url: Some("https://mastodon.social/@bot/1".into()),
        };
        let post = Post::reply("Scoring change on the below goal.", Some(original));
        assert_eq!(
            DiscordWebhook::content_for(&post),
            "Scoring change on the below goal.\nhttps://mastodon.social/@bot/1"
        );
        assert_eq!(
            DiscordWebhook::content_for(&Post::new("GOAL!")),
            "GOAL!"
        );
    }
}
