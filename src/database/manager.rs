use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use sqlx::PgPool;
use tracing::info;

use crate::config::DatabaseConfig;

/// Connection options built from discrete settings so the password never
/// passes through a loggable DSN string
pub fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .password(&config.password)
        .database(&config.name)
        .ssl_mode(PgSslMode::Prefer)
}

/// Open the shared pool. A failure here is fatal to startup.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    info!(
        "Connecting to database: host={} port={} dbname={} user={}",
        config.host, config.port, config.name, config.user
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_with(connect_options(config))
        .await?;

    info!("Connection opened to database");
    Ok(pool)
}
