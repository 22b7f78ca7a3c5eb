//! Registry instance management commands

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::*;
use dialoguer::{Confirm, Password};

use crate::config::Config;
use crate::config::models::Instance;

#[derive(Args)]
pub struct InstanceCommands {
    #[command(subcommand)]
    pub command: InstanceSubcommands,
}

#[derive(Subcommand)]
pub enum InstanceSubcommands {
    /// Add a registry instance
    Add {
        /// Name for this instance (e.g., "production", "staging")
        name: String,
        /// Registry base URL (e.g., https://registry.example.org)
        #[arg(long)]
        url: String,
        /// Username for basic authentication
        #[arg(long)]
        username: String,
        /// Password; prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// List all instances
    List,
    /// Select the current instance
    Select {
        /// Instance name to select
        name: String,
    },
    /// Remove an instance
    Remove {
        /// Instance name to remove
        name: String,
        /// Force removal without confirmation
        #[arg(short, long)]
        force: bool,
    },
    /// Show the current instance
    Show,
}

pub async fn handle_instance_command(config: &Config, commands: InstanceCommands) -> Result<()> {
    match commands.command {
        InstanceSubcommands::Add {
            name,
            url,
            username,
            password,
        } => add_instance(config, name, url, username, password).await,
        InstanceSubcommands::List => list_instances(config).await,
        InstanceSubcommands::Select { name } => select_instance(config, &name).await,
        InstanceSubcommands::Remove { name, force } => remove_instance(config, &name, force).await,
        InstanceSubcommands::Show => show_current_instance(config).await,
    }
}

async fn add_instance(
    config: &Config,
    name: String,
    url: String,
    username: String,
    password: Option<String>,
) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let instance = Instance {
        name: name.clone(),
        base_url: url,
        username,
        password,
    };

    config.add_instance(instance).await?;
    println!(
        "{} Instance '{}' added successfully",
        "✓".bright_green().bold(),
        name.bright_green().bold()
    );
    Ok(())
}

async fn list_instances(config: &Config) -> Result<()> {
    let instances = config.list_instances().await?;

    if instances.is_empty() {
        println!("  {}", "⚠️  No instances configured".bright_yellow().bold());
        println!("  {}", "Add one with 'qbank-cli instance add'.".dimmed());
        return Ok(());
    }

    println!();
    println!("  {}", "Configured instances:".bright_white().bold());
    for (name, base_url, is_current) in &instances {
        let (marker, name_color, current_text) = if *is_current {
            ("●", name.bright_green().bold(), " (current)".bright_green())
        } else {
            ("○", name.white(), "".white())
        };
        println!(
            "  {} {} → {}{}",
            marker.bright_green(),
            name_color,
            base_url.cyan(),
            current_text
        );
    }
    println!();

    Ok(())
}

async fn select_instance(config: &Config, name: &str) -> Result<()> {
    config.set_current_instance(name).await?;
    println!(
        "{} Selected instance: {}",
        "✓".bright_cyan().bold(),
        name.bright_green().bold()
    );
    Ok(())
}

async fn remove_instance(config: &Config, name: &str, force: bool) -> Result<()> {
    if !force {
        if config.get_current_instance().await?.as_deref() == Some(name) {
            println!(
                "  {} Warning: '{}' is the current instance",
                "⚠️".bright_yellow().bold(),
                name.bright_green().bold()
            );
        }

        let confirm = Confirm::new()
            .with_prompt(format!("Remove instance '{}'?", name))
            .default(false)
            .interact()?;

        if !confirm {
            println!("Cancelled.");
            return Ok(());
        }
    }

    config.delete_instance(name).await?;
    println!(
        "{} Instance '{}' removed successfully",
        "✓".bright_green().bold(),
        name.bright_green().bold()
    );

    if config.get_current_instance().await?.is_none() {
        println!("No current instance selected. Use 'qbank-cli instance select' to choose one.");
    }

    Ok(())
}

async fn show_current_instance(config: &Config) -> Result<()> {
    let Some(name) = config.get_current_instance().await? else {
        println!(
            "  {} No instance selected. Use 'qbank-cli instance select' to choose one.",
            "⚠️".bright_yellow().bold()
        );
        return Ok(());
    };

    let Some(instance) = config.get_instance(&name).await? else {
        anyhow::bail!("Current instance '{}' is missing from the store", name);
    };

    println!();
    println!("  {}", "Current instance:".bright_white().bold());
    println!(
        "  {} → {} ({})",
        instance.name.bright_green().bold(),
        instance.base_url.cyan(),
        instance.username.bright_yellow()
    );
    println!();

    Ok(())
}
