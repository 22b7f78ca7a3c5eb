//! Registry import command

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use colored::*;

use crate::api::RegistryClient;
use crate::api::models::{ProgramType, RegistryDomain};
use crate::config::Config;
use crate::reconcile;

#[derive(Args)]
pub struct ImportArgs {
    /// Survey to import into
    #[arg(long)]
    pub survey: i64,
    /// Program or dataset identifier in the registry
    #[arg(long)]
    pub program: String,
    /// Registry domain to fetch from
    #[arg(long, value_enum, default_value = "tracker")]
    pub domain: DomainArg,
    /// Override the program type instead of trusting the registry payload
    #[arg(long, value_enum)]
    pub program_type: Option<ProgramTypeArg>,
    /// Instance to fetch from; defaults to the current instance
    #[arg(long)]
    pub instance: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DomainArg {
    /// Individual-level programs (tracker and event)
    Tracker,
    /// Aggregate datasets
    Aggregate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProgramTypeArg {
    Tracker,
    Event,
}

impl From<DomainArg> for RegistryDomain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Tracker => RegistryDomain::Tracker,
            DomainArg::Aggregate => RegistryDomain::Aggregate,
        }
    }
}

impl From<ProgramTypeArg> for ProgramType {
    fn from(arg: ProgramTypeArg) -> Self {
        match arg {
            ProgramTypeArg::Tracker => ProgramType::Tracker,
            ProgramTypeArg::Event => ProgramType::Event,
        }
    }
}

pub async fn handle_import_command(config: &Config, args: ImportArgs) -> Result<()> {
    let instance_name = match args.instance {
        Some(name) => name,
        None => config
            .get_current_instance()
            .await?
            .context("No instance selected. Use 'qbank-cli instance select' or pass --instance")?,
    };

    let instance = config
        .get_instance(&instance_name)
        .await?
        .with_context(|| format!("Instance '{}' not found", instance_name))?;

    let client = RegistryClient::from_instance(&instance);
    let domain: RegistryDomain = args.domain.into();
    let program_type = args.program_type.map(ProgramType::from);

    println!(
        "📥 Importing {} {} from '{}' into survey {}...",
        domain,
        args.program.bright_white().bold(),
        instance_name.bright_green(),
        args.survey.to_string().bright_white().bold()
    );

    let result = reconcile::import_program(
        config,
        &client,
        args.survey,
        domain,
        &args.program,
        program_type,
    )
    .await
    .map_err(|e| anyhow::anyhow!("[{}] {}", e.code(), e))?;

    println!("{} Import complete", "✅".bold());
    println!(
        "   {} questions created",
        result.questions_created.to_string().bright_green().bold()
    );
    println!(
        "   {} questions reused",
        result.questions_reused.to_string().bright_cyan().bold()
    );
    println!(
        "   {} option values merged",
        result.options_merged.to_string().bright_yellow().bold()
    );
    println!(
        "   {} questions linked",
        result.questions_linked.to_string().bright_white().bold()
    );

    Ok(())
}
