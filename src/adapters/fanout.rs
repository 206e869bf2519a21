use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

use super::{DeliveryRef, DeliverySink, Post};
use crate::error::{DeliveryError, Result};

/// Sends each post to every sink.
///
/// The first sink is primary: its reference is the one returned, and reply
/// targets are only meaningful to it. A post the primary rejects fails as a
/// whole even when a mirror took it, so a mirror's id is never used as a
/// reply target. Mirror failures are logged and ignored.
pub struct FanoutSink {
    sinks: Vec<Arc<dyn DeliverySink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn DeliverySink>>) -> Self {
        Self { sinks }
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl DeliverySink for FanoutSink {
    async fn post(&self, post: &Post) -> Result<DeliveryRef> {
        let Some((primary, mirrors)) = self.sinks.split_first() else {
            return Err(DeliveryError::NoSinkConfigured.into());
        };

        let result = primary.post(post).await;
        for mirror in mirrors {
            if let Err(e) = mirror.post(post).await {
                warn!("mirror sink {} failed: {}", mirror.name(), e);
            }
        }

        result.map_err(|e| {
            error!("primary sink {} failed: {}", primary.name(), e);
            DeliveryError::PrimaryFailed {
                sink: primary.name().to_string(),
            }
            .into()
        })
    }

    fn name(&self) -> &'static str {
        "fanout"
    }
}
