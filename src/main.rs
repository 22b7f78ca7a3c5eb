use anyhow::Result;
use clap::Parser;
use log::info;

use qbank_cli::cli::commands::{
    handle_db_command, handle_import_command, handle_instance_command, handle_question_command,
    handle_survey_command,
};
use qbank_cli::cli::{Cli, Commands};
use qbank_cli::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger to file (truncate on each run)
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open("qbank-cli.log")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .init();

    // Parse before opening the database; --help must not create it
    let cli = Cli::parse();

    let config = Config::load().await?;
    info!("Starting qbank-cli");

    match cli.command {
        Commands::Instance(commands) => handle_instance_command(&config, commands).await,
        Commands::Import(args) => handle_import_command(&config, args).await,
        Commands::Survey(commands) => handle_survey_command(&config, commands).await,
        Commands::Question(commands) => handle_question_command(&config, commands).await,
        Commands::Db(commands) => handle_db_command(&config, commands).await,
    }
}
