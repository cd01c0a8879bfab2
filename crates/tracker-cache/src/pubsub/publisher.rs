//! Redis Pub/Sub publisher.
//!
//! Publishes tracker domain events to Redis channels so other processes
//! (log-channel bots, dashboards) can follow attributions live.

use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use tracker_core::error::DomainError;
use tracker_core::events::DomainEvent;
use tracker_core::traits::EventSink;
use tracker_core::Snowflake;

use crate::pool::{RedisPool, RedisResult};
use crate::pubsub::PubSubChannel;

/// Event wrapper for Pub/Sub messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Event type name (e.g., "JOIN_ATTRIBUTED", "MEMBER_LEFT")
    pub event_type: String,
    pub community_id: Snowflake,
    /// Event payload
    pub data: serde_json::Value,
}

impl PubSubEvent {
    /// Create a new event
    #[must_use]
    pub fn new(
        event_type: impl Into<String>,
        community_id: Snowflake,
        data: serde_json::Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            community_id,
            data,
        }
    }

    /// Wrap a domain event
    pub fn from_domain(event: &DomainEvent) -> Result<Self, serde_json::Error> {
        Ok(Self::new(
            event.event_type(),
            event.community_id(),
            serde_json::to_value(event)?,
        ))
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel
    pub async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> RedisResult<u32> {
        let mut conn = self.pool.get().await?;
        let channel_name = channel.name();
        let payload = event.to_json()?;

        let receivers: u32 = conn.publish(&channel_name, &payload).await?;

        tracing::debug!(
            channel = %channel_name,
            event_type = %event.event_type,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }

    /// Publish to the community channel and the broadcast channel
    pub async fn publish_domain_event(&self, event: &DomainEvent) -> RedisResult<u32> {
        let wrapped = PubSubEvent::from_domain(event)?;
        let payload = wrapped.to_json()?;
        let mut conn = self.pool.get().await?;

        let mut total_receivers = 0;
        for channel in [PubSubChannel::community(event.community_id()), PubSubChannel::Broadcast] {
            let receivers: u32 = conn.publish(channel.name(), &payload).await?;
            total_receivers += receivers;
        }

        tracing::debug!(
            community_id = %event.community_id(),
            event_type = %wrapped.event_type,
            total_receivers = total_receivers,
            "Published domain event"
        );

        Ok(total_receivers)
    }
}

#[async_trait]
impl EventSink for Publisher {
    async fn emit(&self, event: DomainEvent) -> Result<(), DomainError> {
        self.publish_domain_event(&event)
            .await
            .map(|_| ())
            .map_err(|e| DomainError::CacheError(e.to_string()))
    }
}
