//! Mastodon-compatible status API
//!
//! Primary sink: it supports real reply threading, so goal corrections and
//! shootout attempts hang off the post they refer to.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

use super::{DeliveryRef, DeliverySink, Post};
use crate::error::{DeliveryError, Result};

#[derive(Clone)]
pub struct MastodonClient {
    client: Client,
    instance: String,
    token: String,
}

#[derive(Serialize)]
struct StatusRequest<'a> {
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    in_reply_to_id: Option<&'a str>,
    visibility: &'static str,
}

#[derive(Deserialize)]
struct StatusResponse {
    id: String,
    url: Option<String>,
}

impl MastodonClient {
    pub fn new(instance: &str, token: &str) -> Arc<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Arc::new(Self {
            client,
            instance: instance.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn status_for<'a>(post: &'a Post) -> StatusRequest<'a> {
        StatusRequest {
            status: &post.text,
            in_reply_to_id: post.reply_to.as_ref().map(|r| r.id.as_str()),
            visibility: "public",
        }
    }

    async fn publish(&self, post: &Post) -> std::result::Result<DeliveryRef, DeliveryError> {
        let url = format!("{}/api/v1/statuses", self.instance);
        let request = Self::status_for(post);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Mastodon request failed: {}", e);
                DeliveryError::Transport {
                    sink: "mastodon".into(),
                    reason: e.to_string(),
                }
            })?;

        let status = resp.status();
        if status.as_u16() == 429 {
            warn!("Mastodon rate limit hit");
            return Err(DeliveryError::RateLimited {
                sink: "mastodon".into(),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            error!("Mastodon status rejected: {} - {}", status, body);
            return Err(DeliveryError::Rejected {
                sink: "mastodon".into(),
                status: status.as_u16(),
                body,
            });
        }

        let created: StatusResponse = resp.json().await.map_err(|e| DeliveryError::Transport {
            sink: "mastodon".into(),
            reason: format!("unreadable response: {e}"),
        })?;
        debug!("Mastodon status {} published", created.id);

        Ok(DeliveryRef {
            id: created.id,
            url: created.url,
        })
    }
}

#[async_trait]
impl DeliverySink for MastodonClient {
    async fn post(&self, post: &Post) -> Result<DeliveryRef> {
        Ok(self.publish(post).await?)
    }

    fn name(&self) -> &'static str {
        "mastodon"
    }
}
