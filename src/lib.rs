use std::{sync::Arc, time::Duration};

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;
pub mod consumers;

pub use domain::{entities, events, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, bus, db, http, storage};

use auth::jwt::JwtService;
use bus::EventBus;
use consumers::ConsumerStats;
use errors::AppError;
use http::{HttpMediaServiceClient, HttpProductServiceClient};
use repositories::pg_repo::{PgMediaRepo, PgProductRepo, PgUserRepo};
use storage::LocalFileStore;
use use_cases::{media::MediaHandler, products::ProductHandler, users::UserHandler};

pub type AppUserHandler = UserHandler<PgUserRepo>;
pub type AppProductHandler = ProductHandler<PgProductRepo>;
pub type AppMediaHandler = MediaHandler<PgMediaRepo>;

/// Explicitly constructed, injected component graph — no ambient statics.
/// The user/product/media handlers coordinate only through the stores, the
/// bus, and the HTTP clients, so they can be split into separate
/// deployments without touching the core.
pub struct AppState {
    pub user_handler: Arc<AppUserHandler>,
    pub product_handler: Arc<AppProductHandler>,
    pub media_handler: Arc<AppMediaHandler>,
    pub jwt_service: JwtService,
    pub consumer_stats: Arc<ConsumerStats>,
}

impl AppState {
    pub fn new(
        config: &settings::AppConfig,
        pool: sqlx::PgPool,
        bus: Arc<dyn EventBus>,
    ) -> Result<Self, AppError> {
        let timeout = Duration::from_millis(config.remote_timeout_ms);

        let media_client = Arc::new(HttpMediaServiceClient::new(
            &config.media_service_url,
            timeout,
        )?);
        let product_client = Arc::new(HttpProductServiceClient::new(
            &config.product_service_url,
            timeout,
        )?);
        let file_store = Arc::new(LocalFileStore::new(config.storage_location.clone()));

        let user_handler = Arc::new(UserHandler::new(
            PgUserRepo::new(pool.clone()),
            bus.clone(),
        ));
        let product_handler = Arc::new(ProductHandler::new(
            PgProductRepo::new(pool.clone()),
            bus.clone(),
            media_client,
        ));
        let media_handler = Arc::new(MediaHandler::new(
            PgMediaRepo::new(pool),
            file_store,
            product_client,
        ));

        Ok(AppState {
            user_handler,
            product_handler,
            media_handler,
            jwt_service: JwtService::new(config),
            consumer_stats: Arc::new(ConsumerStats::default()),
        })
    }
}
