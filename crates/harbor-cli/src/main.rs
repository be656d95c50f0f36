use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use harbor_storage::pg::PgStore;
use harbor_sync::{build_scheduler, run_harvest_once, run_seed_once, HarvestConfig};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "harbor")]
#[command(about = "ATS job harvest pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one harvest pass over the configured roster
    Harvest,
    /// Upsert the roster companies into the store
    Seed,
    /// Apply pending database migrations
    Migrate,
    /// Report likely duplicate company names in the store
    DedupCompanies,
    /// Run the cron scheduler until interrupted
    Scheduler,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    // Credentials are checked before any network activity; a missing
    // DATABASE_URL exits non-zero here.
    let config = HarvestConfig::from_env()?;

    match cli.command.unwrap_or(Commands::Harvest) {
        Commands::Harvest => {
            let summary = run_harvest_once(&config).await?;
            println!("{}", summary.render());
        }
        Commands::Seed => {
            let seeded = run_seed_once(&config).await?;
            println!("seeded {seeded} companies from {}", config.roster_path.display());
        }
        Commands::Migrate => {
            let store = PgStore::connect(&config.database_url)
                .await
                .context("connecting to store")?;
            store.migrate().await.context("applying migrations")?;
            println!("migrations applied");
        }
        Commands::DedupCompanies => {
            let store = PgStore::connect(&config.database_url)
                .await
                .context("connecting to store")?;
            let groups = harbor_sync::duplicate_company_report(&store).await?;
            if groups.is_empty() {
                println!("no likely duplicates found");
            } else {
                for group in groups {
                    println!("possible duplicates: {}", group.join(" | "));
                }
            }
        }
        Commands::Scheduler => {
            let Some(mut scheduler) = build_scheduler(Arc::new(config)).await? else {
                anyhow::bail!("scheduler disabled; set HARBOR_SCHEDULER_ENABLED=1");
            };
            scheduler.start().await.context("starting scheduler")?;
            info!("scheduler running; Ctrl-C to stop");
            tokio::signal::ctrl_c().await.context("waiting for interrupt")?;
        }
    }

    Ok(())
}
