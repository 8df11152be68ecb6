//! Synchronization runner for the schemasync metadata engine.
//!
//! Loads the instance fleet and shared remote credentials from a TOML
//! config file, opens the local metadata store, and runs synchronization
//! passes: one by default, or repeatedly on a fixed interval when the
//! deployment has no external cron driving it.

mod config;

use clap::Parser;
use config::FileConfig;
use schemasync_core::{Scheduler, SqliteStore, StaticCatalog, init_logging};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "schemasync")]
#[command(about = "Synchronize schema metadata from registered database instances")]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(
        short,
        long,
        env = "SCHEMASYNC_CONFIG",
        default_value = "schemasync.toml"
    )]
    config: PathBuf,

    /// Seconds between passes; runs a single pass when omitted
    #[arg(long)]
    interval: Option<u64>,

    /// Increase log verbosity (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet)?;

    let file_config = FileConfig::load(&cli.config)?;
    let settings = file_config.settings()?;
    let instances = file_config.instances();

    let store = SqliteStore::open(&file_config.store_path).await?;
    let catalog = StaticCatalog::new(instances);
    info!(
        instances = catalog.len(),
        store = %file_config.store_path.display(),
        "schemasync starting"
    );

    let scheduler = Scheduler::with_connectors(
        Arc::new(catalog),
        Arc::new(store.clone()),
        file_config.credentials(),
        settings,
    );

    match cli.interval {
        None => scheduler.run_once().await,
        Some(secs) => {
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            loop {
                // First tick fires immediately, then every `secs`
                ticker.tick().await;
                scheduler.run_once().await;
            }
        }
    }

    store.close().await;
    Ok(())
}
