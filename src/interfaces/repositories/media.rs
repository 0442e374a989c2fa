use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::media::Media,
    errors::AppError,
    repositories::pg_repo::{from_row, to_doc, PgMediaRepo},
};

#[async_trait]
pub trait MediaRepository: Send + Sync {
    async fn find(&self, id: &Uuid) -> Result<Option<Media>, AppError>;
    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Media>, AppError>;
    async fn find_by_product(&self, product_id: &Uuid) -> Result<Vec<Media>, AppError>;
    async fn save(&self, media: &Media) -> Result<(), AppError>;
    /// Idempotent: deleting an absent media row is a no-op.
    async fn delete(&self, id: &Uuid) -> Result<(), AppError>;
}

#[async_trait]
impl<T> MediaRepository for std::sync::Arc<T>
where
    T: MediaRepository + ?Sized,
{
    async fn find(&self, id: &Uuid) -> Result<Option<Media>, AppError> {
        (**self).find(id).await
    }

    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Media>, AppError> {
        (**self).find_by_owner(user_id).await
    }

    async fn find_by_product(&self, product_id: &Uuid) -> Result<Vec<Media>, AppError> {
        (**self).find_by_product(product_id).await
    }

    async fn save(&self, media: &Media) -> Result<(), AppError> {
        (**self).save(media).await
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete(id).await
    }
}

impl PgMediaRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        PgMediaRepo { pool }
    }
}

#[async_trait]
impl MediaRepository for PgMediaRepo {
    async fn find(&self, id: &Uuid) -> Result<Option<Media>, AppError> {
        let row = sqlx::query("SELECT doc FROM media WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        row.as_ref().map(from_row).transpose()
    }

    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Media>, AppError> {
        let rows = sqlx::query("SELECT doc FROM media WHERE doc->>'user_id' = $1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        rows.iter().map(from_row).collect()
    }

    async fn find_by_product(&self, product_id: &Uuid) -> Result<Vec<Media>, AppError> {
        let rows = sqlx::query("SELECT doc FROM media WHERE doc->>'product_id' = $1")
            .bind(product_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        rows.iter().map(from_row).collect()
    }

    async fn save(&self, media: &Media) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO media (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(media.id)
        .bind(to_doc(media)?)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
