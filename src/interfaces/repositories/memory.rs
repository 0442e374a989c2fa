use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    entities::{media::Media, product::Product, user::User},
    errors::AppError,
    repositories::{media::MediaRepository, product::ProductRepository, user::UserRepository},
};

/// Dashmap-backed reference stores with the same contracts as the Postgres
/// collections. Used by the test suites and the single-process dev setup.
#[derive(Default)]
pub struct InMemoryUserRepo {
    rows: DashMap<Uuid, User>,
}

#[derive(Default)]
pub struct InMemoryProductRepo {
    rows: DashMap<Uuid, Product>,
}

#[derive(Default)]
pub struct InMemoryMediaRepo {
    rows: DashMap<Uuid, Media>,
}

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find(&self, id: &Uuid) -> Result<Option<User>, AppError> {
        Ok(self.rows.get(id).map(|r| r.clone()))
    }

    async fn save(&self, user: &User) -> Result<(), AppError> {
        self.rows.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        self.rows.remove(id);
        Ok(())
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepo {
    async fn find(&self, id: &Uuid) -> Result<Option<Product>, AppError> {
        Ok(self.rows.get(id).map(|r| r.clone()))
    }

    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Product>, AppError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.user_id == *user_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn find_all(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.rows.iter().map(|r| r.clone()).collect())
    }

    async fn save(&self, product: &Product) -> Result<(), AppError> {
        self.rows.insert(product.id, product.clone());
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        self.rows.remove(id);
        Ok(())
    }
}

#[async_trait]
impl MediaRepository for InMemoryMediaRepo {
    async fn find(&self, id: &Uuid) -> Result<Option<Media>, AppError> {
        Ok(self.rows.get(id).map(|r| r.clone()))
    }

    async fn find_by_owner(&self, user_id: &Uuid) -> Result<Vec<Media>, AppError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.user_id == *user_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn find_by_product(&self, product_id: &Uuid) -> Result<Vec<Media>, AppError> {
        Ok(self
            .rows
            .iter()
            .filter(|r| r.product_id == Some(*product_id))
            .map(|r| r.clone())
            .collect())
    }

    async fn save(&self, media: &Media) -> Result<(), AppError> {
        self.rows.insert(media.id, media.clone());
        Ok(())
    }

    async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        self.rows.remove(id);
        Ok(())
    }
}
