//! Redis Pub/Sub module.
//!
//! Publishes tracker domain events for out-of-process consumers.

mod channels;
mod publisher;

pub use channels::{PubSubChannel, BROADCAST_CHANNEL, COMMUNITY_CHANNEL_PREFIX};
pub use publisher::{PubSubEvent, Publisher};
