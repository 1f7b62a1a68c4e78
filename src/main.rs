use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use hotfeed::{Config, Database, Harvester};

/// Harvest trending articles from hot-entry feeds into a local database.
#[derive(Debug, Parser)]
#[command(name = "hotfeed", version, about)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "hotfeed.toml")]
    config: PathBuf,

    /// Override the database path from the config file
    #[arg(short, long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };
    if let Some(database) = args.database {
        config.database_path = database;
    }

    let db = match Database::open(&config.database_path).await {
        Ok(db) => db,
        Err(e) => {
            error!(path = %config.database_path, error = %e, "Failed to open database");
            return ExitCode::FAILURE;
        }
    };

    let result = run_harvest(&db, config).await;
    db.close().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Harvest failed");
            ExitCode::FAILURE
        }
    }
}

/// Seed categories and run the harvest. Split out so the database is closed
/// on every exit path.
async fn run_harvest(db: &Database, config: Config) -> Result<()> {
    let names: Vec<&str> = config.categories.iter().map(|c| c.name.as_str()).collect();
    db.seed_categories(&names).await?;

    let harvester = Harvester::new(db.clone(), config)?;
    harvester.run().await?;

    info!("Done");
    Ok(())
}
