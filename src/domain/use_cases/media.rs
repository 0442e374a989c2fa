use std::sync::Arc;

use uuid::Uuid;

use crate::{
    entities::{
        media::{Media, MediaResponse},
        user::Principal,
    },
    errors::AppError,
    http::ProductServiceApi,
    repositories::media::MediaRepository,
    storage::FileStore,
};

pub struct MediaHandler<R>
where
    R: MediaRepository,
{
    pub media_repo: R,
    pub file_store: Arc<dyn FileStore>,
    pub product_client: Arc<dyn ProductServiceApi>,
}

impl<R> MediaHandler<R>
where
    R: MediaRepository,
{
    pub fn new(media_repo: R, file_store: Arc<dyn FileStore>, product_client: Arc<dyn ProductServiceApi>) -> Self {
        MediaHandler {
            media_repo,
            file_store,
            product_client,
        }
    }

    pub async fn get_media(&self, id: &Uuid) -> Result<MediaResponse, AppError> {
        let media = self
            .media_repo
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media not found with id: {}", id)))?;

        Ok(MediaResponse::from(media))
    }

    /// Existence check behind the `HEAD /media/{id}` probe.
    pub async fn exists(&self, id: &Uuid) -> Result<bool, AppError> {
        Ok(self.media_repo.find(id).await?.is_some())
    }

    /// Stamps the back-reference, invoked by the product service right after
    /// it appended the id to its own list. Internal surface; the caller
    /// treats any failure as best-effort.
    pub async fn stamp_product(&self, media_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let mut media = self
            .media_repo
            .find(&media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media not found with id: {}", media_id)))?;

        media.product_id = Some(product_id);
        media.updated_at = chrono::Utc::now();
        self.media_repo.save(&media).await
    }

    /// Direct deletion by the owner. If the media still points at a product,
    /// the product service is told to drop the forward reference first —
    /// best-effort, since the reconciler repairs that direction anyway.
    pub async fn delete(&self, id: Uuid, principal: &Principal) -> Result<(), AppError> {
        let media = self
            .media_repo
            .find(&id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media not found with id: {}", id)))?;

        if media.user_id != principal.id {
            return Err(AppError::Forbidden(
                "You do not have permission to delete this media".into(),
            ));
        }

        if let Some(product_id) = media.product_id {
            if let Err(e) = self.product_client.remove_media(product_id, id).await {
                tracing::warn!(
                    "Failed to remove media {} from product {}: {}. Reconciler will converge.",
                    id, product_id, e
                );
            }
        }

        self.delete_row(&media).await
    }

    /// Cascade target for `product.deleted{id, mediaIds}`. Listed ids that
    /// are already gone are skipped, so duplicate or reordered delivery
    /// converges on the same end state.
    pub async fn delete_media_by_ids(&self, ids: &[Uuid]) -> Result<usize, AppError> {
        let mut deleted = 0;
        for id in ids {
            if let Some(media) = self.media_repo.find(id).await? {
                self.delete_row(&media).await?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Cascade target for the legacy bare-id `product.deleted` form: the
    /// media rows have to be found through the back-reference.
    pub async fn delete_media_by_product(&self, product_id: Uuid) -> Result<usize, AppError> {
        let rows = self.media_repo.find_by_product(&product_id).await?;
        let mut deleted = 0;
        for media in rows {
            self.delete_row(&media).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Cascade target for `user.deleted`: every media row owned by the user,
    /// attached to a product or not.
    pub async fn delete_media_by_user(&self, user_id: Uuid) -> Result<usize, AppError> {
        let rows = self.media_repo.find_by_owner(&user_id).await?;
        let mut deleted = 0;
        for media in rows {
            self.delete_row(&media).await?;
            deleted += 1;
        }
        Ok(deleted)
    }

    /// Blob first, then the record. A blob-delete failure is logged and the
    /// record is deleted anyway; an orphaned blob is preferable to a record
    /// pointing at storage we may already have lost.
    async fn delete_row(&self, media: &Media) -> Result<(), AppError> {
        if let Err(e) = self.file_store.delete(&media.file_path).await {
            tracing::error!("Failed to delete blob for media {}: {}", media.id, e);
        }

        self.media_repo.delete(&media.id).await
    }
}
