//! Status notifications
//!
//! Every status transition is announced on `jobs:image:<image_id>` with the
//! payload `{"status": "<status>"}`. No other event field is ever sent.
//!
//! Delivery is retried with capped exponential backoff. Waits between
//! attempts end early when the caller's [`CancellationToken`] fires.

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::models::ImageStatus;

pub mod pubsub;

pub use pubsub::{connect, LocalPubSub, PubSub, PubSubError, RedisPubSub};

/// Channel prefix for per-image status updates
pub const CHANNEL_PREFIX: &str = "jobs:image:";

pub fn channel_for(image_id: &str) -> String {
    format!("{}{}", CHANNEL_PREFIX, image_id)
}

/// Retry schedule for publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
        }
    }

    /// `min(base * 2^(attempt-1), max)`; attempt 1 waits exactly `base`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(100), Duration::from_secs(2))
    }
}

/// A status change raised by a staging job
///
/// Only `status` is published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobUpdateEvent {
    pub job_id: String,
    pub image_id: String,
    pub status: ImageStatus,
    pub error: Option<String>,
    pub progress: Option<u8>,
}

impl JobUpdateEvent {
    pub fn new(job_id: impl Into<String>, image_id: impl Into<String>, status: ImageStatus) -> Self {
        Self {
            job_id: job_id.into(),
            image_id: image_id.into(),
            status,
            error: None,
            progress: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress.min(100));
        self
    }
}

#[derive(Serialize)]
struct StatusPayload {
    status: ImageStatus,
}

/// Wire payload for an event
pub fn encode_payload(event: &JobUpdateEvent) -> Result<String, serde_json::Error> {
    serde_json::to_string(&StatusPayload {
        status: event.status,
    })
}

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("failed to encode status payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("publish to {channel} failed after {attempts} attempts: {source}")]
    Exhausted {
        channel: String,
        attempts: u32,
        #[source]
        source: PubSubError,
    },

    #[error("publish cancelled")]
    Cancelled,
}

/// Retrying status publisher
#[derive(Clone)]
pub struct Publisher {
    pubsub: Arc<dyn PubSub>,
    policy: RetryPolicy,
}

impl Publisher {
    pub fn new(pubsub: Arc<dyn PubSub>, policy: RetryPolicy) -> Self {
        Self { pubsub, policy }
    }

    /// Publish `event`, retrying until success, exhaustion or cancellation
    #[tracing::instrument(skip(self, cancel, event), fields(image_id = %event.image_id, status = %event.status))]
    pub async fn publish(
        &self,
        cancel: &CancellationToken,
        event: &JobUpdateEvent,
    ) -> Result<(), PublishError> {
        if event.image_id.is_empty() {
            return Err(PublishError::InvalidArgument("image_id is required".to_string()));
        }

        let channel = channel_for(&event.image_id);
        let payload = encode_payload(event)?;

        let mut attempt: u32 = 0;
        loop {
            attempt += 1;

            let err = match self.pubsub.publish(&channel, &payload).await {
                Ok(receivers) => {
                    debug!(channel = %channel, receivers, attempt, "Status published");
                    return Ok(());
                },
                Err(e) => e,
            };

            warn!(channel = %channel, attempt, error = %err, "Status publish failed");

            if attempt >= self.policy.max_attempts {
                return Err(PublishError::Exhausted {
                    channel,
                    attempts: attempt,
                    source: err,
                });
            }

            let delay = self.policy.backoff_delay(attempt);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(PublishError::Cancelled),
                _ = tokio::time::sleep(delay) => {},
            }
        }
    }
}
