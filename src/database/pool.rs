use crate::config::Settings;
use crate::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

/// `DATABASE_POOL_SIZE` connections are kept warm; up to
/// `DATABASE_MAX_OVERFLOW` more are opened under load.
pub fn pool_options(settings: &Settings) -> PgPoolOptions {
    PgPoolOptions::new()
        .min_connections(settings.database_pool_size)
        .max_connections(settings.max_pool_connections().max(1))
        .acquire_timeout(Duration::from_secs(30))
}

pub async fn create_pool(settings: &Settings) -> Result<PgPool> {
    info!(
        pool_size = settings.database_pool_size,
        max_overflow = settings.database_max_overflow,
        "Connecting to PostgreSQL..."
    );
    let pool = pool_options(settings).connect(&settings.database_url).await?;
    info!("PostgreSQL connection pool established");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
