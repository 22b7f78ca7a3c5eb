use super::commands::DbCommands;
use super::commands::ImportArgs;
use super::commands::InstanceCommands;
use super::commands::QuestionCommands;
use super::commands::SurveyCommands;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "qbank-cli")]
#[command(about = "A CLI tool for managing survey question banks fed by external metadata registries")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Registry instance management
    Instance(InstanceCommands),
    /// Import a program or dataset from a registry instance
    Import(ImportArgs),
    /// Survey management and rendering
    Survey(SurveyCommands),
    /// Question inspection and skip-logic editing
    Question(QuestionCommands),
    /// Database status and maintenance
    Db(DbCommands),
}
