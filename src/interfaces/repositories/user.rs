use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    entities::user::User,
    errors::AppError,
    repositories::pg_repo::{from_row, to_doc, PgUserRepo},
};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn check_connection(&self) -> Result<(), AppError>;
    async fn find(&self, id: &Uuid) -> Result<Option<User>, AppError>;
    async fn save(&self, user: &User) -> Result<(), AppError>;
    /// Idempotent: deleting an absent user is a no-op.
    async fn delete(&self, id: &Uuid) -> Result<(), AppError>;
}

// Handlers take their repository by value; shared ownership goes through
// Arc without a wrapper type.
#[async_trait]
impl<T> UserRepository for std::sync::Arc<T>
where
    T: UserRepository + ?Sized,
{
    async fn check_connection(&self) -> Result<(), AppError> {
        (**self).check_connection().await
    }

    async fn find(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        (**self).find(id).await
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        (**self).save(user).await
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        (**self).delete(id).await
    }
}

impl PgUserRepo {
    pub fn new(pool: sqlx::PgPool) -> Self {
        PgUserRepo { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(AppError::from)
    }

    async fn find(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT doc FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)?;

        row.as_ref().map(from_row).transpose()
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO users (id, doc) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET doc = EXCLUDED.doc",
        )
        .bind(user.id)
        .bind(to_doc(user)?)
        .execute(&self.pool)
        .await
        .map_err(AppError::from)?;

        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;

        Ok(())
    }
}
