use std::sync::Arc;

use tokio::time::{interval, Duration};

use crate::{repositories::product::ProductRepository, use_cases::products::ProductHandler};

/// Periodic reconciler sweep. Interruptible at any point — each run starts
/// from the stores, nothing is carried between iterations.
pub async fn start_reconciler_task<R>(handler: Arc<ProductHandler<R>>, interval_secs: u64)
where
    R: ProductRepository,
{
    let mut interval = interval(Duration::from_secs(interval_secs.max(1)));

    loop {
        interval.tick().await;

        match handler.cleanup_orphaned_media().await {
            Ok(summary) => tracing::info!(
                "Reconciler pass: {} products checked, {} repaired, {} references removed",
                summary.products_checked,
                summary.products_repaired,
                summary.references_removed
            ),
            Err(e) => tracing::error!("Reconciler pass failed: {}", e),
        }
    }
}
