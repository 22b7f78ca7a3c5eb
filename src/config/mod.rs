//! SQLite-backed storage module for the question bank
//!
//! This module provides persistent storage for:
//! - Registry instance configurations (base URL + basic-auth credentials)
//! - Surveys and their ordered question attachments
//! - The question bank: questions, option sets, option values
//! - External mappings produced by reconciliation

use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod db;
pub mod migrations;
pub mod models;
pub mod repository;

pub use models::*;

use crate::skiplogic::SkipLogicRule;

/// Main storage manager using the SQLite backend
pub struct Config {
    pub(crate) pool: sqlx::SqlitePool,
    config_path: PathBuf,
}

impl Config {
    /// Get the path to the SQLite database file
    pub fn get_db_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "linux") {
            dirs::config_dir()
                .context("Failed to get XDG config directory")?
                .join("qbank-cli")
        } else {
            dirs::home_dir()
                .context("Failed to get home directory")?
                .join(".qbank-cli")
        };

        if !config_dir.exists() {
            std::fs::create_dir_all(&config_dir)
                .with_context(|| format!("Failed to create config directory: {:?}", config_dir))?;
            log::info!("Created config directory: {:?}", config_dir);
        }

        Ok(config_dir.join("qbank.db"))
    }

    /// Open the question bank, running any pending migrations
    pub async fn load() -> Result<Self> {
        let db_path = Self::get_db_path()?;
        log::debug!("Loading question bank from: {:?}", db_path);

        let pool = db::connect(&db_path).await?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            config_path: db_path,
        })
    }

    /// Create a config for testing (in-memory database)
    pub async fn new_test() -> Result<Self> {
        let pool = db::connect_memory().await?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            pool,
            config_path: PathBuf::from(":memory:"),
        })
    }

    /// The underlying connection pool. The reconciliation engine uses
    /// this to run a whole import inside one transaction.
    pub fn pool(&self) -> &sqlx::SqlitePool {
        &self.pool
    }

    /// Path of the database backing this config
    pub fn db_path(&self) -> &std::path::Path {
        &self.config_path
    }

    // Instance management methods
    pub async fn add_instance(&self, instance: Instance) -> Result<()> {
        repository::instances::insert(&self.pool, instance).await
    }

    pub async fn get_instance(&self, name: &str) -> Result<Option<Instance>> {
        repository::instances::get(&self.pool, name).await
    }

    pub async fn list_instances(&self) -> Result<Vec<(String, String, bool)>> {
        repository::instances::list(&self.pool).await
    }

    pub async fn delete_instance(&self, name: &str) -> Result<()> {
        repository::instances::delete(&self.pool, name).await
    }

    pub async fn get_current_instance(&self) -> Result<Option<String>> {
        repository::instances::get_current(&self.pool).await
    }

    pub async fn set_current_instance(&self, name: &str) -> Result<()> {
        repository::instances::set_current(&self.pool, name).await
    }

    // Survey methods
    pub async fn create_survey(&self, name: &str) -> Result<i64> {
        repository::surveys::create(&self.pool, name).await
    }

    pub async fn get_survey(&self, id: i64) -> Result<Option<Survey>> {
        repository::surveys::get(&self.pool, id).await
    }

    pub async fn list_surveys(&self) -> Result<Vec<Survey>> {
        repository::surveys::list(&self.pool).await
    }

    pub async fn list_survey_questions(&self, survey_id: i64) -> Result<Vec<(i64, Question)>> {
        repository::surveys::list_questions(&self.pool, survey_id).await
    }

    // Question bank methods
    pub async fn get_question(&self, id: i64) -> Result<Option<Question>> {
        repository::questions::get(&self.pool, id).await
    }

    pub async fn set_skip_logic(&self, id: i64, rules: &[SkipLogicRule]) -> Result<()> {
        repository::questions::set_skip_logic(&self.pool, id, rules).await
    }

    pub async fn get_option_set(&self, id: i64) -> Result<Option<OptionSet>> {
        repository::option_sets::get(&self.pool, id).await
    }

    pub async fn get_option_values(&self, id: i64) -> Result<Vec<String>> {
        repository::option_sets::get_values(&self.pool, id).await
    }
}
