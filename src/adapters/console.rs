//! Dry-run sink: logs posts instead of publishing them

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;
use uuid::Uuid;

use super::{DeliveryRef, DeliverySink, Post};
use crate::error::Result;

#[derive(Debug, Default)]
pub struct ConsoleSink {
    posted: AtomicU64,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted(&self) -> u64 {
        self.posted.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DeliverySink for ConsoleSink {
    async fn post(&self, post: &Post) -> Result<DeliveryRef> {
        let n = self.posted.fetch_add(1, Ordering::Relaxed) + 1;
        let reference = DeliveryRef::new(format!("console-{}", Uuid::new_v4()));
        info!(
            target: "hockeygamebot::post",
            post = n,
            reply_to = post.reply_to.as_ref().map(|r| r.id.as_str()),
            "\n{}",
            post.text
        );
        Ok(reference)
    }

    fn name(&self) -> &'static str {
        "console"
    }
}
