//! Survey management and rendering commands

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;

use crate::config::Config;
use crate::render;
use crate::skiplogic::VisibilityDecision;

#[derive(Args)]
pub struct SurveyCommands {
    #[command(subcommand)]
    pub command: SurveySubcommands,
}

#[derive(Subcommand)]
pub enum SurveySubcommands {
    /// Create a new survey
    Create {
        /// Survey name (must be unique)
        name: String,
    },
    /// List all surveys
    List,
    /// List a survey's questions in position order
    Questions {
        /// Survey id
        #[arg(long)]
        survey: i64,
    },
    /// Render a survey against captured answers
    Render {
        /// Survey id
        #[arg(long)]
        survey: i64,
        /// JSON answers file, an object of question id to answer value
        #[arg(long)]
        answers: Option<PathBuf>,
        /// Emit machine-readable JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_survey_command(config: &Config, commands: SurveyCommands) -> Result<()> {
    match commands.command {
        SurveySubcommands::Create { name } => create_survey(config, &name).await,
        SurveySubcommands::List => list_surveys(config).await,
        SurveySubcommands::Questions { survey } => list_questions(config, survey).await,
        SurveySubcommands::Render {
            survey,
            answers,
            json,
        } => render_survey(config, survey, answers, json).await,
    }
}

async fn create_survey(config: &Config, name: &str) -> Result<()> {
    let id = config.create_survey(name).await?;
    println!(
        "{} Survey '{}' created with id {}",
        "✓".bright_green().bold(),
        name.bright_green().bold(),
        id.to_string().bright_white().bold()
    );
    Ok(())
}

async fn list_surveys(config: &Config) -> Result<()> {
    let surveys = config.list_surveys().await?;

    if surveys.is_empty() {
        println!("  {}", "⚠️  No surveys yet".bright_yellow().bold());
        println!("  {}", "Create one with 'qbank-cli survey create'.".dimmed());
        return Ok(());
    }

    println!();
    println!("  {}", "Surveys:".bright_white().bold());
    for survey in &surveys {
        println!(
            "  {:>3}. {} ({})",
            survey.id.to_string().bright_white().bold(),
            survey.name.bright_green(),
            survey.created_at.format("%Y-%m-%d").to_string().dimmed()
        );
    }
    println!();

    Ok(())
}

async fn list_questions(config: &Config, survey_id: i64) -> Result<()> {
    let survey = config
        .get_survey(survey_id)
        .await?
        .with_context(|| format!("Survey {} not found", survey_id))?;
    let rows = config.list_survey_questions(survey_id).await?;

    println!();
    println!(
        "  {} {}",
        "Survey:".bright_white().bold(),
        survey.name.bright_green().bold()
    );

    if rows.is_empty() {
        println!("  {}", "No questions attached. Run an import first.".dimmed());
        println!();
        return Ok(());
    }

    for (position, question) in &rows {
        let mut flags = Vec::new();
        if question.option_set_id.is_some() {
            flags.push("options");
        }
        if !question.skip_logic.is_empty() {
            flags.push("skip-logic");
        }
        let suffix = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        println!(
            "  {:>3}. {} {}{}",
            position,
            format!("[{}]", question.kind).bright_cyan(),
            question.label,
            suffix.dimmed()
        );
    }
    println!();

    Ok(())
}

async fn render_survey(
    config: &Config,
    survey_id: i64,
    answers_path: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let answers = match answers_path {
        Some(path) => read_answers(&path)?,
        None => HashMap::new(),
    };

    let rows = render::get_visible_questions(config.pool(), survey_id, &answers).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!();
    for row in &rows {
        match &row.decision {
            VisibilityDecision::Show => {
                println!("  {:>3}. {}", row.position, row.question.label);
            }
            VisibilityDecision::Hide => {
                println!(
                    "  {:>3}. {} {}",
                    row.position,
                    row.question.label.dimmed().strikethrough(),
                    "(hidden)".dimmed()
                );
            }
            VisibilityDecision::ShowWithOptions(allowed) => {
                println!(
                    "  {:>3}. {} {}",
                    row.position,
                    row.question.label,
                    format!("(options: {})", allowed.join(", ")).bright_yellow()
                );
            }
        }
    }
    println!();

    Ok(())
}

/// Answers files map question ids (as JSON object keys) to answer values.
fn read_answers(path: &Path) -> Result<HashMap<i64, String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers file: {}", path.display()))?;
    let parsed: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("Answers file is not a JSON object of strings: {}", path.display()))?;

    let mut answers = HashMap::with_capacity(parsed.len());
    for (key, value) in parsed {
        let id: i64 = key
            .parse()
            .with_context(|| format!("Answer key '{}' is not a question id", key))?;
        answers.insert(id, value);
    }
    Ok(answers)
}
