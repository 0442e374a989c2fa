use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;
use std::time::Duration;

/// The document collections backing the reference stores. One jsonb table
/// per entity; the store is deliberately schemaless beyond the id column.
pub const COLLECTIONS: [&str; 3] = ["users", "products", "media"];

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let max_retries = 5;
    let mut retry_count = 0;
    let mut wait_seconds = 2;

    loop {
        match PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
        {
            Ok(pool) => {
                info!("Database connection established.");
                return Ok(pool);
            }
            Err(e) if retry_count < max_retries => {
                retry_count += 1;
                info!(
                    "Failed to connect to database (attempt {}/{}): {}. Retrying in {}s...",
                    retry_count, max_retries, e, wait_seconds);

                tokio::time::sleep(Duration::from_secs(wait_seconds)).await;

                wait_seconds *= 2; // Exponential backoff
            }
            Err(e) => return Err(e),
        }
    }
}

/// Creates any missing document collection at startup.
pub async fn ensure_collections(pool: &PgPool) -> Result<(), sqlx::Error> {
    for name in COLLECTIONS {
        let statement = format!(
            "CREATE TABLE IF NOT EXISTS {} (id UUID PRIMARY KEY, doc JSONB NOT NULL)",
            name
        );
        sqlx::query(&statement).execute(pool).await?;
    }
    Ok(())
}
