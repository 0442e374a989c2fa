use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{mpsc, Mutex};

use crate::errors::AppError;

use super::{EventBus, EventHandler};

const MAX_RETRY_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct Record {
    partition_key: String,
    payload: String,
}

struct Group {
    id: String,
    senders: Vec<mpsc::UnboundedSender<Record>>,
}

struct Topic {
    /// Retained log so that groups subscribing late still see every event,
    /// mirroring a durable broker.
    log: Vec<Record>,
    groups: Vec<Group>,
}

/// Single-process bus with broker semantics: per-topic retained log,
/// consumer groups, hash-partitioned ordered delivery, and redelivery of
/// events whose handler failed. Used by tests and the dev setup.
pub struct InMemoryEventBus {
    partitions: usize,
    topics: DashMap<String, Arc<Mutex<Topic>>>,
}

impl InMemoryEventBus {
    pub fn new(partitions: usize) -> Self {
        InMemoryEventBus {
            partitions: partitions.max(1),
            topics: DashMap::new(),
        }
    }

    fn topic(&self, name: &str) -> Arc<Mutex<Topic>> {
        self.topics
            .entry(name.to_string())
            .or_insert_with(|| {
                Arc::new(Mutex::new(Topic {
                    log: Vec::new(),
                    groups: Vec::new(),
                }))
            })
            .clone()
    }

    fn partition_for(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.partitions
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        InMemoryEventBus::new(4)
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(
        &self,
        topic: &str,
        partition_key: &str,
        payload: &str,
    ) -> Result<(), AppError> {
        let record = Record {
            partition_key: partition_key.to_string(),
            payload: payload.to_string(),
        };

        let topic = self.topic(topic);
        let mut topic = topic.lock().await;
        topic.log.push(record.clone());

        let partition = self.partition_for(partition_key);
        for group in &topic.groups {
            // A dropped receiver means the group's worker is gone; the event
            // stays in the log for any future subscriber.
            let _ = group.senders[partition].send(record.clone());
        }
        Ok(())
    }

    async fn subscribe(
        &self,
        topic_name: &str,
        group_id: &str,
        handler: EventHandler,
    ) -> Result<(), AppError> {
        let topic = self.topic(topic_name);
        let mut topic = topic.lock().await;

        if topic.groups.iter().any(|g| g.id == group_id) {
            return Err(AppError::InternalError(format!(
                "group '{}' already subscribed to '{}'",
                group_id, topic_name
            )));
        }

        let mut senders = Vec::with_capacity(self.partitions);
        for partition in 0..self.partitions {
            let (tx, rx) = mpsc::unbounded_channel::<Record>();
            senders.push(tx);
            tokio::spawn(run_partition_worker(
                topic_name.to_string(),
                group_id.to_string(),
                partition,
                rx,
                handler.clone(),
            ));
        }

        // Replay the retained log so the new group converges on history.
        for record in &topic.log {
            let partition = self.partition_for(&record.partition_key);
            let _ = senders[partition].send(record.clone());
        }

        topic.groups.push(Group {
            id: group_id.to_string(),
            senders,
        });
        Ok(())
    }
}

/// Drains one partition in order. A failing handler blocks the partition and
/// the event is redelivered with backoff until it succeeds, matching
/// broker-level redelivery.
async fn run_partition_worker(
    topic: String,
    group: String,
    partition: usize,
    mut rx: mpsc::UnboundedReceiver<Record>,
    handler: EventHandler,
) {
    while let Some(record) = rx.recv().await {
        let mut backoff = Duration::from_millis(50);
        loop {
            match handler(record.payload.clone()).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(
                        "Handler failed on {}/{} partition {}: {}. Redelivering...",
                        topic, group, partition, e
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(MAX_RETRY_BACKOFF);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Mutex as AsyncMutex;

    fn counting_handler(counter: Arc<AtomicUsize>) -> EventHandler {
        Arc::new(move |_payload| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn delivers_to_every_group() {
        let bus = InMemoryEventBus::default();
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));

        bus.subscribe("t", "g1", counting_handler(first.clone())).await.unwrap();
        bus.subscribe("t", "g2", counting_handler(second.clone())).await.unwrap();
        bus.publish("t", "k", "payload").await.unwrap();

        settle().await;
        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replays_log_to_late_subscribers() {
        let bus = InMemoryEventBus::default();
        bus.publish("t", "k", "one").await.unwrap();
        bus.publish("t", "k", "two").await.unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        bus.subscribe("t", "late", counting_handler(seen.clone())).await.unwrap();

        settle().await;
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn redelivers_until_handler_succeeds() {
        let bus = InMemoryEventBus::default();
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_in_handler = attempts.clone();

        let handler: EventHandler = Arc::new(move |_payload| {
            let attempts = attempts_in_handler.clone();
            Box::pin(async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(AppError::TransientDependency("simulated".into()))
                } else {
                    Ok(())
                }
            })
        });

        bus.subscribe("t", "g", handler).await.unwrap();
        bus.publish("t", "k", "payload").await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn preserves_order_within_a_partition_key() {
        let bus = InMemoryEventBus::default();
        let seen = Arc::new(AsyncMutex::new(Vec::new()));
        let seen_in_handler = seen.clone();

        let handler: EventHandler = Arc::new(move |payload| {
            let seen = seen_in_handler.clone();
            Box::pin(async move {
                seen.lock().await.push(payload);
                Ok(())
            })
        });

        bus.subscribe("t", "g", handler).await.unwrap();
        for i in 0..10 {
            bus.publish("t", "same-key", &i.to_string()).await.unwrap();
        }

        settle().await;
        let seen = seen.lock().await;
        let expected: Vec<String> = (0..10).map(|i| i.to_string()).collect();
        assert_eq!(*seen, expected);
    }

    #[tokio::test]
    async fn rejects_duplicate_group_subscription() {
        let bus = InMemoryEventBus::default();
        let counter = Arc::new(AtomicUsize::new(0));

        bus.subscribe("t", "g", counting_handler(counter.clone())).await.unwrap();
        let err = bus.subscribe("t", "g", counting_handler(counter)).await.unwrap_err();
        assert!(matches!(err, AppError::InternalError(_)));
    }
}
