use std::time::Duration;

use async_trait::async_trait;
use redis::{
    streams::{StreamReadOptions, StreamReadReply},
    AsyncCommands, Client,
};

use crate::errors::AppError;

use super::{EventBus, EventHandler};

const READ_BLOCK_MS: usize = 5_000;
const READ_COUNT: usize = 16;
const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(5);

const KEY_FIELD: &str = "key";
const PAYLOAD_FIELD: &str = "payload";

/// Redis Streams event bus. One stream per topic, one consumer group per
/// subscribing service. Entries are acknowledged only after the handler
/// succeeds, so a crash or a failing handler leads to redelivery.
pub struct RedisEventBus {
    client: Client,
}

impl RedisEventBus {
    pub fn new(bus_url: &str) -> Result<Self, AppError> {
        let client = Client::open(bus_url)?;
        Ok(RedisEventBus { client })
    }
}

#[async_trait]
impl EventBus for RedisEventBus {
    async fn publish(
        &self,
        topic: &str,
        partition_key: &str,
        payload: &str,
    ) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _id: String = conn
            .xadd(
                topic,
                "*",
                &[(KEY_FIELD, partition_key), (PAYLOAD_FIELD, payload)],
            )
            .await?;
        Ok(())
    }

    async fn subscribe(
        &self,
        topic: &str,
        group_id: &str,
        handler: EventHandler,
    ) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        // Create the group at the start of the stream so a new service sees
        // history. An already-existing group is fine.
        let created: Result<(), redis::RedisError> =
            conn.xgroup_create_mkstream(topic, group_id, "0").await;
        if let Err(e) = created {
            if e.code() != Some("BUSYGROUP") {
                return Err(e.into());
            }
        }

        let consumer = consumer_name(group_id);
        tracing::info!("Subscribed consumer {} to {} as group {}", consumer, topic, group_id);

        tokio::spawn(run_consumer(
            self.client.clone(),
            topic.to_string(),
            group_id.to_string(),
            consumer,
            handler,
        ));
        Ok(())
    }
}

async fn run_consumer(
    client: Client,
    topic: String,
    group: String,
    consumer: String,
    handler: EventHandler,
) {
    let mut conn = loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => break conn,
            Err(e) => {
                tracing::error!("Bus connection failed for {}/{}: {}. Retrying...", topic, group, e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    };

    // First drain entries delivered to this consumer name but never
    // acknowledged (crash recovery), batch by batch until the pending list
    // is exhausted, then follow new entries.
    let mut cursor = "0";
    loop {
        match read_batch(&mut conn, &topic, &group, &consumer, cursor, &handler).await {
            Ok(entries) => {
                if cursor == "0" && entries < READ_COUNT {
                    cursor = ">";
                }
            }
            Err(e) => {
                tracing::error!("Bus read failed for {}/{}: {}. Retrying...", topic, group, e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Stable per-instance consumer name. Restarting the process must yield the
/// same name, otherwise entries left in the previous run's pending list are
/// never read again and the events they carry are lost.
fn consumer_name(group_id: &str) -> String {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "local".into());
    format!("{}-{}", group_id, host)
}

async fn read_batch(
    conn: &mut redis::aio::MultiplexedConnection,
    topic: &str,
    group: &str,
    consumer: &str,
    cursor: &str,
    handler: &EventHandler,
) -> Result<usize, AppError> {
    let options = StreamReadOptions::default()
        .group(group, consumer)
        .count(READ_COUNT)
        .block(READ_BLOCK_MS);

    let reply: StreamReadReply = conn.xread_options(&[topic], &[cursor], &options).await?;

    let mut entries = 0;
    for key in reply.keys {
        for entry in key.ids {
            entries += 1;
            let payload: String = entry.get(PAYLOAD_FIELD).unwrap_or_default();

            // Handler failure means no ack; retry in place with backoff so
            // per-partition order is preserved while the backlog waits.
            let mut backoff = Duration::from_millis(50);
            loop {
                match handler(payload.clone()).await {
                    Ok(()) => break,
                    Err(e) => {
                        tracing::warn!(
                            "Handler failed on {}/{} entry {}: {}. Redelivering...",
                            topic, group, entry.id, e
                        );
                        tokio::time::sleep(backoff).await;
                        backoff = (backoff * 2).min(MAX_RETRY_BACKOFF);
                    }
                }
            }

            let _acked: i64 = conn.xack(topic, group, &[&entry.id]).await?;
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::consumer_name;

    #[test]
    fn consumer_name_is_stable_across_restarts() {
        let first = consumer_name("media-service-group");
        let second = consumer_name("media-service-group");

        assert_eq!(first, second);
        assert!(first.starts_with("media-service-group-"));
    }
}
