//! Migrate command - applies or reverts schema migrations

use clap::Args;
use tracing::info;

use crate::config::AppConfig;
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::storage::{connect, PostgresMigrator};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    /// Revert the most recent migration instead of applying pending ones
    #[arg(long)]
    pub revert: bool,
}

pub async fn run(args: MigrateArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    let pool = connect(&config.database).await?;
    let migrator = PostgresMigrator::new(pool.clone());

    if args.revert {
        match migrator.revert().await? {
            Some(version) => info!(version, "Reverted migration"),
            None => info!("No migration to revert"),
        }
    } else {
        let applied = migrator.run().await?;
        info!(applied, "Migrations applied");
    }

    let version = migrator.current_version().await?;
    info!(version = ?version, "Current schema version");

    pool.close().await;

    Ok(())
}
