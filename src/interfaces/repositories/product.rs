use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::product::Product,
    errors::AppError,
    repositories::pg_repo::{from_row, to_doc, PgProductRepo},
};

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find(&self, id: &Uuid) -> Result<Option<Product>, AppError>;
    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Product>, AppError>;
    /// Full scan for the reconciler sweep.
    async fn find_all(&self) -> Result<Vec<Product>, AppError>;
    async fn save(&self, product: &Product) -> Result<(), AppError>;
    /// Idempotent: deleting an absent product is a no-op.
    async fn delete(&self, id: &Uuid) -> Result<(), AppError>;
}

#[async_trait]
impl<T> ProductRepository for std::sync::Arc<T>
where
    T: ProductRepository + ?Sized,
{
    async fn find(&self, id: &Uuid) -> Result<Option<Product>, AppError> {
        (**self).find(id).await
    }

    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Product>, AppError> {
        (**self).find_by_owner(user_id).await
    }

    async fn find_all(&self) -> Result<Vec<Product>, AppError> {
        (**self).find_all().await
    }

    async fn save(&self, product: &Product) -> Result<(), AppError> {
        (**self).save(product).await
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete(id).await
    }
}

impl PgProductRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        PgProductRepo { pool }
    }
}

#[async_trait]
impl ProductRepository for PgProductRepo {
    async fn find(&self, id: &Uuid) -> Result<Option<Product>, AppError> {
        let row = sqlx::query("SELECT doc FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        row.as_ref().map(from_row).transpose()
    }

    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query("SELECT doc FROM products WHERE doc->>'user_id' = $1")
            .bind(user_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        rows.iter().map(from_row).collect()
    }

    async fn find_all(&self) -> Result<Vec<Product>, AppError> {
        let rows = sqlx::query("SELECT doc FROM products")
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::from)?;

        rows.iter().map(from_row).collect()
    }

    async fn save(&self, product: &Product) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO products (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(product.id)
        .bind(to_doc(product)?)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
