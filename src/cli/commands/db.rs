//! Database status commands

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;

use crate::config::Config;
use crate::config::db;
use crate::config::migrations::MigrationManager;

#[derive(Args)]
pub struct DbCommands {
    #[command(subcommand)]
    pub command: DbSubcommands,
}

#[derive(Subcommand)]
pub enum DbSubcommands {
    /// Show database path, schema version, and migration status
    Status,
}

pub async fn handle_db_command(config: &Config, commands: DbCommands) -> Result<()> {
    match commands.command {
        DbSubcommands::Status => show_status(config).await,
    }
}

async fn show_status(config: &Config) -> Result<()> {
    let info = db::get_db_info(config.pool()).await?;

    println!();
    println!("  {}", "Database status:".bright_white().bold());
    println!("  path: {}", config.db_path().display().to_string().cyan());
    println!("  SQLite version: {}", info.sqlite_version);
    println!("  journal mode: {}", info.journal_mode);
    println!("  schema version: {}", info.schema_version);
    println!("  tables: {}", info.table_count);
    println!();

    let manager = MigrationManager::new(config.pool());
    let status = manager.status().await?;
    status.print_status();

    Ok(())
}
