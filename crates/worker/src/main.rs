//! swcache entry point.
//!
//! Opens the cache database, binds a controller to the configured generation
//! and delivers the lifecycle event named on the command line.
//! Logging goes to stderr so stdout carries only the JSON result.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use swcache_client::{FetchClient, FetchConfig, OfflineNetwork};
use swcache_core::{AppConfig, CacheDb, Network};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod controller;
mod host;

use cli::{Cli, Commands};
use controller::CacheController;
use host::WorkerHost;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_from(cli.config.as_deref())?;

    let db = CacheDb::open(&config.db_path).await?;
    let network: Arc<dyn Network> = if cli.offline {
        Arc::new(OfflineNetwork)
    } else {
        Arc::new(FetchClient::new(FetchConfig::from(&config))?)
    };

    let controller = CacheController::new(config, Arc::new(db.clone()), Arc::clone(&network))?;
    let host = WorkerHost::new(db.clone(), network);

    tracing::debug!("swcache {} for {}", controller.generation(), controller.origin());

    let output = match &cli.command {
        Commands::Install => serde_json::to_value(host.install(&controller).await?)?,
        Commands::Activate => serde_json::to_value(host.activate(&controller).await?)?,
        Commands::Fetch(args) => serde_json::to_value(commands::fetch(&host, &controller, args).await?)?,
        Commands::Caches => serde_json::to_value(commands::caches(&db, &controller).await?)?,
        Commands::Entries(args) => serde_json::to_value(commands::entries(&db, &controller, args).await?)?,
        Commands::Evict(args) => serde_json::to_value(commands::evict(&db, &controller, args).await?)?,
        Commands::Status => serde_json::to_value(commands::status(&host, &controller).await?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
