use clap::Parser;
use tracing_subscriber::EnvFilter;

use accountability_api::cli::{self, Cli};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=info,sqlx=warn";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so DB_* and SECRET can live next to the binary
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    cli::run(Cli::parse()).await
}
