//! Question inspection and skip-logic editing commands

use std::io::Read;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::*;

use crate::config::Config;
use crate::skiplogic::{self, SkipAction};

#[derive(Args)]
pub struct QuestionCommands {
    #[command(subcommand)]
    pub command: QuestionSubcommands,
}

#[derive(Subcommand)]
pub enum QuestionSubcommands {
    /// Show a question with its options and skip logic
    Show {
        /// Question id
        id: i64,
        /// Emit machine-readable JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Replace a question's skip-logic rules
    SetSkipLogic {
        /// Question id
        id: i64,
        /// JSON rules file, or '-' to read from stdin
        #[arg(long)]
        rules: String,
    },
}

pub async fn handle_question_command(config: &Config, commands: QuestionCommands) -> Result<()> {
    match commands.command {
        QuestionSubcommands::Show { id, json } => show_question(config, id, json).await,
        QuestionSubcommands::SetSkipLogic { id, rules } => {
            set_question_skip_logic(config, id, &rules).await
        }
    }
}

async fn show_question(config: &Config, id: i64, json: bool) -> Result<()> {
    let question = config
        .get_question(id)
        .await?
        .with_context(|| format!("Question {} not found", id))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&question)?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        format!("#{}", question.id).bright_white().bold(),
        question.label.bright_green().bold()
    );
    println!(
        "  kind: {}  required: {}",
        question.kind.to_string().bright_cyan(),
        question.is_required
    );

    if let Some(option_set_id) = question.option_set_id {
        let set_name = config
            .get_option_set(option_set_id)
            .await?
            .map(|set| set.name)
            .unwrap_or_default();
        let values = config.get_option_values(option_set_id).await?;
        println!("  options [{}]: {}", set_name.bright_yellow(), values.join(", "));
    }

    if question.skip_logic.is_empty() {
        println!("  {}", "no skip logic".dimmed());
    } else {
        println!("  skip logic:");
        for rule in &question.skip_logic {
            let action = match (&rule.action, &rule.target) {
                (SkipAction::Show, _) => "show".to_string(),
                (SkipAction::Hide, _) => "hide".to_string(),
                (SkipAction::FilterOptions, Some(allowed)) => {
                    format!("filter options to [{}]", allowed.join(", "))
                }
                (SkipAction::FilterOptions, None) => "filter options".to_string(),
            };
            println!(
                "    when #{} equals '{}' {}",
                rule.trigger_question_id,
                rule.value,
                action.bright_cyan()
            );
        }
    }
    println!();

    Ok(())
}

async fn set_question_skip_logic(config: &Config, id: i64, rules_source: &str) -> Result<()> {
    let raw = if rules_source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read rules from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(rules_source)
            .with_context(|| format!("Failed to read rules file: {}", rules_source))?
    };

    let rules = skiplogic::parse_rules(&raw)?;
    config.set_skip_logic(id, &rules).await?;

    if rules.is_empty() {
        println!(
            "{} Cleared skip logic on question {}",
            "✓".bright_green().bold(),
            id.to_string().bright_white().bold()
        );
    } else {
        println!(
            "{} Saved {} skip-logic rule(s) on question {}",
            "✓".bright_green().bold(),
            rules.len().to_string().bright_white().bold(),
            id.to_string().bright_white().bold()
        );
    }

    Ok(())
}
