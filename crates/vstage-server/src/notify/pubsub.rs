//! Pub/sub transports
//!
//! Redis is used in deployments. The in-process hub backs single-node setups
//! and tests; it keeps one broadcast channel per name.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::config::NotifyConfig;

#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget publish to a named channel
#[async_trait]
pub trait PubSub: Send + Sync {
    /// Returns how many subscribers received the message
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, PubSubError>;
}

/// Redis `PUBLISH` over a reconnecting connection manager
#[derive(Clone)]
pub struct RedisPubSub {
    manager: ConnectionManager,
}

impl RedisPubSub {
    pub async fn connect(redis_url: &str) -> Result<Self, PubSubError> {
        let client = redis::Client::open(redis_url)?;
        let manager = client.get_connection_manager().await?;
        tracing::info!("Redis pub/sub connected");
        Ok(Self { manager })
    }
}

#[async_trait]
impl PubSub for RedisPubSub {
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, PubSubError> {
        let mut conn = self.manager.clone();
        let receivers: usize = conn.publish(channel, payload).await?;
        Ok(receivers)
    }
}

/// In-process hub
#[derive(Clone)]
pub struct LocalPubSub {
    channels: Arc<Mutex<HashMap<String, broadcast::Sender<String>>>>,
    capacity: usize,
}

impl LocalPubSub {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Arc::new(Mutex::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    pub async fn subscribe(&self, channel: &str) -> broadcast::Receiver<String> {
        let mut channels = self.channels.lock().await;
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }
}

#[async_trait]
impl PubSub for LocalPubSub {
    async fn publish(&self, channel: &str, payload: &str) -> Result<usize, PubSubError> {
        let mut channels = self.channels.lock().await;
        let Some(sender) = channels.get(channel) else {
            return Ok(0);
        };

        match sender.send(payload.to_string()) {
            Ok(receivers) => Ok(receivers),
            Err(_) => {
                // Every subscriber went away
                channels.remove(channel);
                Ok(0)
            },
        }
    }
}

/// Pick the transport from configuration
pub async fn connect(config: &NotifyConfig) -> Result<Arc<dyn PubSub>, PubSubError> {
    match config.redis_url.as_deref() {
        Some(url) => Ok(Arc::new(RedisPubSub::connect(url).await?)),
        None => {
            tracing::warn!("REDIS_URL not set, status notifications stay in-process");
            Ok(Arc::new(LocalPubSub::new(config.local_channel_capacity)))
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_delivers_to_subscribers() {
        let hub = LocalPubSub::new(8);
        let mut a = hub.subscribe("jobs:image:1").await;
        let mut b = hub.subscribe("jobs:image:1").await;
        let mut other = hub.subscribe("jobs:image:2").await;

        let receivers = hub.publish("jobs:image:1", "hello").await.unwrap();

        assert_eq!(receivers, 2);
        assert_eq!(a.recv().await.unwrap(), "hello");
        assert_eq!(b.recv().await.unwrap(), "hello");
        assert!(other.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_local_without_subscribers_is_not_an_error() {
        let hub = LocalPubSub::new(8);
        assert_eq!(hub.publish("jobs:image:nobody", "x").await.unwrap(), 0);

        let rx = hub.subscribe("jobs:image:gone").await;
        drop(rx);
        assert_eq!(hub.publish("jobs:image:gone", "x").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_connect_without_redis_uses_local_hub() {
        let config = crate::config::Config::default().notify;
        let pubsub = connect(&config).await.unwrap();
        assert_eq!(pubsub.publish("jobs:image:1", "x").await.unwrap(), 0);
    }
}
