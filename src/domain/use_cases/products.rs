use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    bus::EventBus,
    entities::{
        product::{CleanupSummary, Product, ProductRequest, ProductResponse},
        user::{Principal, Role},
    },
    errors::AppError,
    events::{ProductDeleted, PRODUCT_DELETED_TOPIC},
    http::{MediaProbe, MediaServiceApi},
    repositories::product::ProductRepository,
};

pub struct ProductHandler<R>
where
    R: ProductRepository,
{
    pub product_repo: R,
    pub bus: Arc<dyn EventBus>,
    pub media_client: Arc<dyn MediaServiceApi>,
}

impl<R> ProductHandler<R>
where
    R: ProductRepository,
{
    pub fn new(product_repo: R, bus: Arc<dyn EventBus>, media_client: Arc<dyn MediaServiceApi>) -> Self {
        ProductHandler {
            product_repo,
            bus,
            media_client,
        }
    }

    pub async fn create_product(
        &self,
        request: &ProductRequest,
        principal: &Principal,
    ) -> Result<ProductResponse, AppError> {
        request.validate()?;

        if principal.role != Role::Seller {
            return Err(AppError::Forbidden("Only sellers can create products".into()));
        }

        let product = Product::new(principal.id, request);
        self.product_repo.save(&product).await?;

        Ok(ProductResponse::from(product))
    }

    pub async fn get_product(&self, id: &Uuid) -> Result<ProductResponse, AppError> {
        let product = self.load(id).await?;
        Ok(ProductResponse::from(product))
    }

    /// Deletes the product and publishes `product.deleted` with the
    /// `media_ids` snapshot taken before the local delete. The publish runs
    /// after the delete commits; its failure is an accepted gap closed by
    /// the reconciler.
    pub async fn delete_product(&self, id: Uuid, principal: &Principal) -> Result<(), AppError> {
        let product = self.load(&id).await?;
        self.check_owner(&product, principal)?;

        let media_ids = product.media_ids.clone();
        self.product_repo.delete(&id).await?;
        self.publish_product_deleted(id, media_ids).await;

        Ok(())
    }

    /// Cascade step for `user.deleted`: delete every product owned by the
    /// user and re-emit `product.deleted` per product. Idempotent — on
    /// redelivery the owner has no products left and this is a no-op.
    pub async fn delete_products_by_user(&self, user_id: Uuid) -> Result<(), AppError> {
        let products = self.product_repo.find_by_owner(&user_id).await?;

        for product in products {
            let media_ids = product.media_ids.clone();
            self.product_repo.delete(&product.id).await?;
            self.publish_product_deleted(product.id, media_ids).await;
        }

        Ok(())
    }

    /// Association coordinator. The append to `media_ids` is the
    /// authoritative write; the back-reference stamp on the media service is
    /// best-effort and its failure never rejects the associate.
    pub async fn associate_media(
        &self,
        product_id: Uuid,
        media_id: Uuid,
        principal: &Principal,
    ) -> Result<ProductResponse, AppError> {
        let mut product = self.load(&product_id).await?;
        self.check_owner(&product, principal)?;

        // Duplicates are tolerated; deletion paths remove every occurrence.
        product.media_ids.push(media_id);
        product.updated_at = chrono::Utc::now();
        self.product_repo.save(&product).await?;

        if let Err(e) = self.media_client.stamp_product(media_id, product_id).await {
            tracing::warn!(
                "Failed to stamp media {} with product {}: {}. Back-reference stays stale until repaired.",
                media_id, product_id, e
            );
        }

        Ok(ProductResponse::from(product))
    }

    /// Removal callback, invoked by the media service after it deletes a
    /// media row that still pointed at a product. Every outcome is a
    /// success: a missing product or an id not in the list means the
    /// reference is already gone, and the caller must not fail its own
    /// deletion over this side call.
    pub async fn remove_media_from_product(
        &self,
        product_id: Uuid,
        media_id: Uuid,
    ) -> Result<(), AppError> {
        let Some(mut product) = self.product_repo.find(&product_id).await? else {
            tracing::debug!(
                "Removal callback for missing product {}; nothing to do",
                product_id
            );
            return Ok(());
        };

        let before = product.media_ids.len();
        product.media_ids.retain(|id| *id != media_id);

        if product.media_ids.len() != before {
            product.updated_at = chrono::Utc::now();
            self.product_repo.save(&product).await?;
        }

        Ok(())
    }

    /// Reconciler sweep: probe every referenced media id and strip the ones
    /// the media service definitively no longer has. Indeterminate probes
    /// keep the reference — over-keeping is recoverable, erroneous pruning
    /// is not. Re-entrant; no state is carried across products.
    pub async fn cleanup_orphaned_media(&self) -> Result<CleanupSummary, AppError> {
        let products = self.product_repo.find_all().await?;
        let mut summary = CleanupSummary::default();

        for mut product in products {
            summary.products_checked += 1;

            let mut kept = Vec::with_capacity(product.media_ids.len());
            let mut removed = 0usize;

            for media_id in &product.media_ids {
                match self.media_client.probe(*media_id).await {
                    MediaProbe::Absent => removed += 1,
                    MediaProbe::Present | MediaProbe::Indeterminate => kept.push(*media_id),
                }
            }

            if removed > 0 {
                tracing::info!(
                    "Cleaned product {}: removed {} orphaned media references",
                    product.id, removed
                );
                product.media_ids = kept;
                product.updated_at = chrono::Utc::now();
                self.product_repo.save(&product).await?;

                summary.products_repaired += 1;
                summary.references_removed += removed;
            }
        }

        Ok(summary)
    }

    async fn load(&self, id: &Uuid) -> Result<Product, AppError> {
        self.product_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Product not found with id: {}", id)))
    }

    fn check_owner(&self, product: &Product, principal: &Principal) -> Result<(), AppError> {
        if product.user_id != principal.id {
            return Err(AppError::Forbidden(
                "You do not have permission to modify this product".into(),
            ));
        }
        Ok(())
    }

    async fn publish_product_deleted(&self, id: Uuid, media_ids: Vec<Uuid>) {
        let event = ProductDeleted { id, media_ids };
        match event.to_payload() {
            Ok(payload) => {
                if let Err(e) = self
                    .bus
                    .publish(PRODUCT_DELETED_TOPIC, &id.to_string(), &payload)
                    .await
                {
                    tracing::error!(
                        "Failed to publish product.deleted for {}: {}. Cleanup deferred to the reconciler.",
                        id, e
                    );
                }
            }
            Err(e) => tracing::error!("Failed to encode product.deleted for {}: {}", id, e),
        }
    }
}
