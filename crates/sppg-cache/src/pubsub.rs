//! Pub/sub bridge for cross-instance cache invalidation.
//!
//! One instance invalidates, every instance (and the UI-facing realtime
//! channel) hears about it. Events are transport only: each one resolves to
//! a single invalidation primitive on [`CacheManager`].
//!
//! The listener holds a dedicated pub/sub connection (pooled connections
//! cannot SUBSCRIBE) and reconnects with exponential backoff when the
//! connection drops.

use std::sync::Arc;
use std::time::Duration;

use deadpool_redis::{Pool, redis::AsyncCommands};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::manager::CacheManager;

/// Channel carrying serialized [`InvalidationEvent`]s.
pub const INVALIDATION_CHANNEL: &str = "sppg:cache:invalidate";

/// A cache invalidation broadcast between instances.
///
/// Modeled as a tagged union so receivers dispatch on the event type instead
/// of sniffing an untyped blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvalidationEvent {
    /// One entry by logical key.
    Key { tenant: Option<String>, key: String },
    /// Everything indexed under a tag.
    Tag { tenant: Option<String>, tag: String },
    /// Every entry and tag index of a tenant.
    Tenant { tenant: String },
}

/// Errors from the pub/sub bridge.
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("Pub/sub pool error: {0}")]
    Pool(String),

    #[error("Pub/sub connection error: {0}")]
    Connection(String),

    #[error("Pub/sub subscribe error: {0}")]
    Subscribe(String),

    #[error("Pub/sub publish error: {0}")]
    Publish(String),

    #[error("Pub/sub message error: {0}")]
    Message(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Pub/sub stream ended")]
    StreamEnded,
}

/// Publish an invalidation event for other instances.
///
/// Called after the local invalidation has been applied; local state never
/// waits on the broadcast.
pub async fn publish_invalidation(pool: &Pool, event: &InvalidationEvent) -> Result<(), PubSubError> {
    let mut conn = pool
        .get()
        .await
        .map_err(|e| PubSubError::Pool(e.to_string()))?;

    let message =
        serde_json::to_string(event).map_err(|e| PubSubError::Serialization(e.to_string()))?;

    conn.publish::<_, _, ()>(INVALIDATION_CHANNEL, &message)
        .await
        .map_err(|e| PubSubError::Publish(e.to_string()))?;

    debug!(event = %message, "published cache invalidation");
    Ok(())
}

/// Subscribes to the invalidation channel and applies received events to the
/// local [`CacheManager`].
pub struct InvalidationListener {
    redis_url: String,
    cache: Arc<CacheManager>,
}

impl InvalidationListener {
    pub fn new(redis_url: impl Into<String>, cache: Arc<CacheManager>) -> Self {
        Self {
            redis_url: redis_url.into(),
            cache,
        }
    }

    /// Spawn the subscription loop.
    ///
    /// Reconnects with exponential backoff (1 s doubling, capped at 5 min);
    /// the backoff resets after a successful connection cycle.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            const MAX_BACKOFF: Duration = Duration::from_secs(300);
            let mut backoff = Duration::from_secs(1);

            loop {
                match self.run().await {
                    Ok(()) => {
                        backoff = Duration::from_secs(1);
                    }
                    Err(e) => {
                        error!(
                            error = %e,
                            backoff_secs = backoff.as_secs(),
                            "invalidation listener error, reconnecting"
                        );
                        sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_BACKOFF);
                    }
                }
            }
        })
    }

    async fn run(&self) -> Result<(), PubSubError> {
        // Dedicated client: pooled connections cannot SUBSCRIBE.
        let client = deadpool_redis::redis::Client::open(self.redis_url.as_str())
            .map_err(|e| PubSubError::Connection(e.to_string()))?;

        let mut pubsub = client
            .get_async_pubsub()
            .await
            .map_err(|e| PubSubError::Connection(e.to_string()))?;

        pubsub
            .subscribe(INVALIDATION_CHANNEL)
            .await
            .map_err(|e| PubSubError::Subscribe(e.to_string()))?;

        info!(channel = INVALIDATION_CHANNEL, "subscribed to invalidation channel");

        let mut stream = pubsub.on_message();
        loop {
            match stream.next().await {
                Some(msg) => {
                    let payload: String = match msg.get_payload() {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!(error = %e, "failed to read invalidation payload");
                            continue;
                        }
                    };
                    match serde_json::from_str::<InvalidationEvent>(&payload) {
                        Ok(event) => {
                            let removed = self.cache.apply(&event).await;
                            debug!(payload = %payload, removed, "applied invalidation event");
                        }
                        Err(e) => {
                            warn!(error = %e, payload = %payload, "undecodable invalidation event");
                        }
                    }
                }
                None => return Err(PubSubError::StreamEnded),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_wire_format() {
        let event = InvalidationEvent::Tag {
            tenant: Some("t1".into()),
            tag: "menus".into(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"tag\""));
        assert_eq!(serde_json::from_str::<InvalidationEvent>(&json).unwrap(), event);
    }

    #[test]
    fn test_event_roundtrip_all_variants() {
        for event in [
            InvalidationEvent::Key {
                tenant: None,
                key: "menus".into(),
            },
            InvalidationEvent::Tag {
                tenant: None,
                tag: "dashboard".into(),
            },
            InvalidationEvent::Tenant {
                tenant: "t1".into(),
            },
        ] {
            let json = serde_json::to_string(&event).unwrap();
            assert_eq!(serde_json::from_str::<InvalidationEvent>(&json).unwrap(), event);
        }
    }
}
