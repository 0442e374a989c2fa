use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use serde::Serialize;

use crate::{
    bus::{EventBus, EventHandler},
    constants::{MEDIA_SERVICE_GROUP, PRODUCT_SERVICE_GROUP},
    errors::AppError,
    events::{
        parse_product_deleted, parse_user_deleted, ProductDeletedPayload, PRODUCT_DELETED_TOPIC,
        USER_DELETED_TOPIC,
    },
    repositories::{media::MediaRepository, product::ProductRepository},
    use_cases::{media::MediaHandler, products::ProductHandler},
};

/// Central counters for the deletion consumers, surfaced on `/health` for
/// alerting. Malformed events in particular are dropped rather than
/// retried, so the counter is the only trace they leave.
#[derive(Default)]
pub struct ConsumerStats {
    pub events_processed: AtomicU64,
    pub malformed_events: AtomicU64,
    pub media_deleted: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct ConsumerStatsSnapshot {
    pub events_processed: u64,
    pub malformed_events: u64,
    pub media_deleted: u64,
}

impl ConsumerStats {
    pub fn snapshot(&self) -> ConsumerStatsSnapshot {
        ConsumerStatsSnapshot {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            malformed_events: self.malformed_events.load(Ordering::Relaxed),
            media_deleted: self.media_deleted.load(Ordering::Relaxed),
        }
    }

    fn record_malformed(&self, topic: &str, err: &AppError) {
        tracing::error!("Dropping malformed {} event: {}", topic, err);
        self.malformed_events.fetch_add(1, Ordering::Relaxed);
    }
}

/// Media-service deletion consumer: subscribes to `product.deleted` and
/// `user.deleted` and translates each event into idempotent local cleanup.
/// Handler errors (store unavailable) propagate so the bus redelivers;
/// malformed payloads are counted and dropped.
pub async fn start_media_consumers<R>(
    bus: &Arc<dyn EventBus>,
    media_handler: Arc<MediaHandler<R>>,
    stats: Arc<ConsumerStats>,
) -> Result<(), AppError>
where
    R: MediaRepository + 'static,
{
    let handler = media_handler.clone();
    let handler_stats = stats.clone();
    let on_product_deleted: EventHandler = Arc::new(move |payload: String| {
        let media = handler.clone();
        let stats = handler_stats.clone();
        Box::pin(async move {
            let parsed = match parse_product_deleted(&payload) {
                Ok(parsed) => parsed,
                Err(e) => {
                    stats.record_malformed(PRODUCT_DELETED_TOPIC, &e);
                    return Ok(());
                }
            };

            let deleted = match parsed {
                ProductDeletedPayload::ByMediaIds { product_id, media_ids } => {
                    tracing::info!(
                        "Received product.deleted for {} with {} media ids",
                        product_id,
                        media_ids.len()
                    );
                    media.delete_media_by_ids(&media_ids).await?
                }
                ProductDeletedPayload::ByProductId(product_id) => {
                    tracing::info!("Received product.deleted for {} (id-only form)", product_id);
                    media.delete_media_by_product(product_id).await?
                }
            };

            stats.events_processed.fetch_add(1, Ordering::Relaxed);
            stats.media_deleted.fetch_add(deleted as u64, Ordering::Relaxed);
            Ok(())
        })
    });

    let handler = media_handler;
    let handler_stats = stats;
    let on_user_deleted: EventHandler = Arc::new(move |payload: String| {
        let media = handler.clone();
        let stats = handler_stats.clone();
        Box::pin(async move {
            let user_id = match parse_user_deleted(&payload) {
                Ok(id) => id,
                Err(e) => {
                    stats.record_malformed(USER_DELETED_TOPIC, &e);
                    return Ok(());
                }
            };

            tracing::info!("Received user.deleted for {}", user_id);
            let deleted = media.delete_media_by_user(user_id).await?;

            stats.events_processed.fetch_add(1, Ordering::Relaxed);
            stats.media_deleted.fetch_add(deleted as u64, Ordering::Relaxed);
            Ok(())
        })
    });

    bus.subscribe(PRODUCT_DELETED_TOPIC, MEDIA_SERVICE_GROUP, on_product_deleted)
        .await?;
    bus.subscribe(USER_DELETED_TOPIC, MEDIA_SERVICE_GROUP, on_user_deleted)
        .await?;
    Ok(())
}

/// Product-service deletion consumer: on `user.deleted`, deletes the user's
/// products and re-emits `product.deleted` per product, which the media
/// consumer picks up independently. No ordering with the media-side
/// `user.deleted` handling is required — both key off rows that either
/// exist or don't.
pub async fn start_product_consumers<R>(
    bus: &Arc<dyn EventBus>,
    product_handler: Arc<ProductHandler<R>>,
    stats: Arc<ConsumerStats>,
) -> Result<(), AppError>
where
    R: ProductRepository + 'static,
{
    let on_user_deleted: EventHandler = Arc::new(move |payload: String| {
        let products = product_handler.clone();
        let stats = stats.clone();
        Box::pin(async move {
            let user_id = match parse_user_deleted(&payload) {
                Ok(id) => id,
                Err(e) => {
                    stats.record_malformed(USER_DELETED_TOPIC, &e);
                    return Ok(());
                }
            };

            tracing::info!("Received user.deleted for {}; cascading to products", user_id);
            products.delete_products_by_user(user_id).await?;

            stats.events_processed.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })
    });

    bus.subscribe(USER_DELETED_TOPIC, PRODUCT_SERVICE_GROUP, on_user_deleted)
        .await?;
    Ok(())
}
