use actix_web::{get, web, HttpResponse, Responder};
use humantime::format_duration;
use chrono::Utc;
use std::time::Duration;
use serde::Serialize;

use crate::{
    consumers::ConsumerStatsSnapshot, constants::START_TIME,
    repositories::user::UserRepository, AppState,
};

#[derive(Serialize)]
struct HealthCheckResponse {
    status: String,
    uptime: String,
    timestamp: String,
    database: String,
    version: String,
    consumers: ConsumerStatsSnapshot,
}

#[get("/health")]
pub async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let now_utc = Utc::now();
    let uptime_duration = now_utc.signed_duration_since(*START_TIME);
    let human_uptime = format_duration(Duration::from_secs(uptime_duration.num_seconds().max(0) as u64));

    let db_status = match state.user_handler.user_repo.check_connection().await {
        Ok(_) => "OK",
        Err(_) => "Unavailable",
    };

    HttpResponse::Ok().json(HealthCheckResponse {
        status: "healthy".to_string(),
        uptime: human_uptime.to_string(),
        timestamp: now_utc.to_rfc3339(),
        database: db_status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        consumers: state.consumer_stats.snapshot(),
    })
}
