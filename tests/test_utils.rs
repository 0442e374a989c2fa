#![allow(dead_code)]

use std::{
    collections::HashSet,
    future::Future,
    sync::{Arc, Mutex},
    time::Duration,
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use marketplace_backend::{
    bus::{EventBus, InMemoryEventBus},
    consumers::{start_media_consumers, start_product_consumers, ConsumerStats},
    entities::{
        media::Media,
        product::Product,
        user::{Principal, Role, User},
    },
    errors::AppError,
    http::{MediaProbe, MediaServiceApi, ProductServiceApi},
    repositories::{
        media::MediaRepository,
        memory::{InMemoryMediaRepo, InMemoryProductRepo, InMemoryUserRepo},
        product::ProductRepository,
        user::UserRepository,
    },
    storage::files::MockFileStore,
    use_cases::{media::MediaHandler, products::ProductHandler, users::UserHandler},
};

pub type TestUserHandler = UserHandler<Arc<InMemoryUserRepo>>;
pub type TestProductHandler = ProductHandler<Arc<InMemoryProductRepo>>;
pub type TestMediaHandler = MediaHandler<Arc<InMemoryMediaRepo>>;

/// Shared switchboard for the store-backed media client: ids listed here
/// probe as `Indeterminate` regardless of what the store says.
#[derive(Default)]
pub struct ProbeControl {
    indeterminate: Mutex<HashSet<Uuid>>,
}

impl ProbeControl {
    pub fn mark_indeterminate(&self, id: Uuid) {
        self.indeterminate.lock().unwrap().insert(id);
    }

    fn is_indeterminate(&self, id: &Uuid) -> bool {
        self.indeterminate.lock().unwrap().contains(id)
    }
}

/// Media-service client wired straight to the in-memory media store, so the
/// cross-service calls behave like a healthy peer without a network.
pub struct StoreBackedMediaClient {
    media: Arc<InMemoryMediaRepo>,
    probes: Arc<ProbeControl>,
}

#[async_trait]
impl MediaServiceApi for StoreBackedMediaClient {
    async fn stamp_product(&self, media_id: Uuid, product_id: Uuid) -> Result<(), AppError> {
        let mut media = self
            .media
            .find(&media_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Media not found with id: {}", media_id)))?;
        media.product_id = Some(product_id);
        self.media.save(&media).await
    }

    async fn probe(&self, media_id: Uuid) -> MediaProbe {
        if self.probes.is_indeterminate(&media_id) {
            return MediaProbe::Indeterminate;
        }
        match self.media.find(&media_id).await {
            Ok(Some(_)) => MediaProbe::Present,
            Ok(None) => MediaProbe::Absent,
            Err(_) => MediaProbe::Indeterminate,
        }
    }
}

/// Product-service client wired straight to the in-memory product store.
pub struct StoreBackedProductClient {
    products: Arc<InMemoryProductRepo>,
}

#[async_trait]
impl ProductServiceApi for StoreBackedProductClient {
    async fn remove_media(&self, product_id: Uuid, media_id: Uuid) -> Result<(), AppError> {
        if let Some(mut product) = self.products.find(&product_id).await? {
            product.media_ids.retain(|id| *id != media_id);
            self.products.save(&product).await?;
        }
        Ok(())
    }
}

/// All three services wired together over shared in-memory stores and the
/// in-memory bus, with the deletion consumers running.
pub struct TestContext {
    pub bus: Arc<dyn EventBus>,
    pub users: Arc<InMemoryUserRepo>,
    pub products: Arc<InMemoryProductRepo>,
    pub media: Arc<InMemoryMediaRepo>,
    pub user_handler: Arc<TestUserHandler>,
    pub product_handler: Arc<TestProductHandler>,
    pub media_handler: Arc<TestMediaHandler>,
    pub probes: Arc<ProbeControl>,
    pub stats: Arc<ConsumerStats>,
}

impl TestContext {
    pub async fn spawn() -> Self {
        let probes = Arc::new(ProbeControl::default());
        let media = Arc::new(InMemoryMediaRepo::default());
        let media_client = Arc::new(StoreBackedMediaClient {
            media: media.clone(),
            probes: probes.clone(),
        });
        Self::spawn_with_media_client(media_client, media, probes).await
    }

    /// Variant for exercising degraded cross-service calls: the media-service
    /// client is supplied by the test (usually a `MockMediaServiceApi`).
    pub async fn spawn_with_media_client(
        media_client: Arc<dyn MediaServiceApi>,
        media: Arc<InMemoryMediaRepo>,
        probes: Arc<ProbeControl>,
    ) -> Self {
        let bus: Arc<dyn EventBus> = Arc::new(InMemoryEventBus::default());
        let users = Arc::new(InMemoryUserRepo::default());
        let products = Arc::new(InMemoryProductRepo::default());
        let stats = Arc::new(ConsumerStats::default());

        let mut file_store = MockFileStore::new();
        file_store.expect_delete().returning(|_| Ok(()));

        let product_client = Arc::new(StoreBackedProductClient {
            products: products.clone(),
        });

        let user_handler = Arc::new(UserHandler::new(users.clone(), bus.clone()));
        let product_handler = Arc::new(ProductHandler::new(
            products.clone(),
            bus.clone(),
            media_client,
        ));
        let media_handler = Arc::new(MediaHandler::new(
            media.clone(),
            Arc::new(file_store),
            product_client,
        ));

        start_media_consumers(&bus, media_handler.clone(), stats.clone())
            .await
            .expect("Failed to start media consumers");
        start_product_consumers(&bus, product_handler.clone(), stats.clone())
            .await
            .expect("Failed to start product consumers");

        TestContext {
            bus,
            users,
            products,
            media,
            user_handler,
            product_handler,
            media_handler,
            probes,
            stats,
        }
    }

    pub async fn seed_user(&self, role: Role) -> User {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: "Ada Seller".into(),
            email: format!("{}@example.com", Uuid::new_v4()),
            role,
            avatar: None,
            created_at: now,
            updated_at: now,
        };
        self.users.save(&user).await.expect("Failed to seed user");
        user
    }

    pub async fn seed_product(&self, owner: &User, media_ids: Vec<Uuid>) -> Product {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            user_id: owner.id,
            name: "Vintage camera".into(),
            description: "Working condition".into(),
            price: 120.0,
            quantity: 1,
            media_ids,
            created_at: now,
            updated_at: now,
        };
        self.products
            .save(&product)
            .await
            .expect("Failed to seed product");
        product
    }

    pub async fn seed_media(&self, owner: &User, product_id: Option<Uuid>) -> Media {
        let mut media = Media::new(
            owner.id,
            format!("{}.jpg", Uuid::new_v4()),
            "image/jpeg".into(),
            2048,
        );
        media.product_id = product_id;
        self.media.save(&media).await.expect("Failed to seed media");
        media
    }
}

pub fn principal_of(user: &User) -> Principal {
    Principal {
        id: user.id,
        role: user.role,
    }
}

/// Polls `cond` until it holds or two seconds pass. The bus delivers
/// asynchronously, so assertions about cascade effects go through this.
pub async fn wait_for<F, Fut>(what: &str, mut cond: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..100 {
        if cond().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("Timed out waiting for: {}", what);
}

/// Fixed window for asserting that something did NOT happen.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(150)).await;
}
