use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use crate::app::{app, AppState};
use crate::config::AppConfig;
use crate::database::{manager, schema, PgStore};

#[derive(Parser)]
#[command(name = "accountability-api")]
#[command(about = "REST backend for personal goals, habits and task lists")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Migrate the database, then serve HTTP (default)")]
    Serve {
        #[arg(long, help = "Listen port, overrides PORT")]
        port: Option<u16>,
    },

    #[command(about = "Create missing tables and indexes, then exit")]
    Migrate,
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env().context("failed to load configuration")?;
    info!("Starting in {:?} mode", config.environment);

    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Migrate => {
            let pool = manager::connect(&config.database)
                .await
                .context("failed to connect to database")?;
            schema::migrate(&pool).await.context("migration failed")?;
            Ok(())
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await
        }
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let pool = manager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    schema::migrate(&pool).await.context("migration failed")?;

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let state = AppState::new(config, Arc::new(PgStore::new(pool)))
        .context("failed to initialise token issuer")?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    info!("Listening on http://{}", bind_addr);
    axum::serve(listener, app(state))
        .await
        .context("server error")?;
    Ok(())
}
