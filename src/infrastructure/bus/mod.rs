use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::errors::AppError;

pub mod memory;
pub mod redis_streams;

pub use memory::InMemoryEventBus;
pub use redis_streams::RedisEventBus;

/// Subscription callback. Invoked at least once per published event; must be
/// idempotent. Returning an error leaves the event unacknowledged and the
/// broker redelivers it.
pub type EventHandler =
    Arc<dyn Fn(String) -> BoxFuture<'static, Result<(), AppError>> + Send + Sync>;

/// Publish/subscribe against a durable log. Delivery is at-least-once per
/// topic and consumer group, ordered only within a partition key.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Returns once the broker has acknowledged durable receipt. A
    /// `TransientDependency` error leaves retry policy to the caller.
    async fn publish(&self, topic: &str, partition_key: &str, payload: &str)
        -> Result<(), AppError>;

    /// Registers `handler` for `topic` under `group_id` and starts the
    /// consumer workers. Each partition is drained by one worker, so a slow
    /// handler backs up its own partition only.
    async fn subscribe(&self, topic: &str, group_id: &str, handler: EventHandler)
        -> Result<(), AppError>;
}
