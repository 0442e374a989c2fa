use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{get, middleware::NormalizePath, web, App, HttpResponse, HttpServer, Responder};
use tracing_actix_web::TracingLogger;

use marketplace_backend::{
    background_task::start_reconciler_task,
    bus::{EventBus, InMemoryEventBus, RedisEventBus},
    consumers::{start_media_consumers, start_product_consumers},
    db::postgres::{create_pool, ensure_collections},
    graceful_shutdown::shutdown_signal,
    middlewares::auth::AuthMiddleware,
    routes::configure_routes,
    settings::AppConfig,
    AppState,
};

#[get("/")]
async fn home() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "Marketplace backend",
        "status": "Ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match AppConfig::new() {
        Ok(cfg) => {
            tracing::info!("Loaded configuration: {:?}", cfg);
            cfg
        },
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = create_pool(&config.database_url)
        .await
        .expect("Failed to create database connection pool");

    ensure_collections(&pool)
        .await
        .expect("Failed to ensure document collections");

    let bus: Arc<dyn EventBus> = match &config.bus_url {
        Some(url) => Arc::new(RedisEventBus::new(url).expect("Failed to create bus client")),
        None => {
            tracing::warn!("No bus URL configured; using the in-memory bus (dev only)");
            Arc::new(InMemoryEventBus::default())
        }
    };

    let app_state = web::Data::new(
        AppState::new(&config, pool.clone(), bus.clone())
            .expect("Failed to build application state")
    );

    start_media_consumers(
        &bus,
        app_state.media_handler.clone(),
        app_state.consumer_stats.clone(),
    )
    .await
    .expect("Failed to start media deletion consumers");

    start_product_consumers(
        &bus,
        app_state.product_handler.clone(),
        app_state.consumer_stats.clone(),
    )
    .await
    .expect("Failed to start product deletion consumers");

    tokio::spawn(start_reconciler_task(
        app_state.product_handler.clone(),
        config.reconcile_interval_secs,
    ));

    let server_addr = format!("{}:{}", config.host, config.port);

    tracing::info!(
        "🚀 Starting Marketplace API v{} on {}",
        env!("CARGO_PKG_VERSION"),
        server_addr
    );

    let cors_config = config.clone();
    let server = HttpServer::new(move || {
        let cors_origins = cors_config.cors_origins();
        let cors = if cors_origins.iter().any(|o| o == "*") {
            Cors::permissive()
        } else {
            cors_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
                .allow_any_method()
                .allow_any_header()
        };

        App::new()
            .app_data(app_state.clone())
            .wrap(TracingLogger::default())
            .wrap(NormalizePath::trim())
            .wrap(AuthMiddleware)
            .wrap(cors)
            .service(home)
            .configure(configure_routes)
    })
    .workers(config.worker_count)
    .bind(server_addr)?
    .run();

    tokio::select! {
        res = server => res,
        _ = shutdown_signal() => Ok(()),
    }
}
