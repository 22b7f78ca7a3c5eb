//! Repository for registry instance operations

use crate::config::models::Instance;
use anyhow::{Context, Result};
use sqlx::SqlitePool;

/// Insert or update a registry instance. The first instance registered
/// becomes the current one; re-adding an existing instance keeps its
/// current flag.
pub async fn insert(pool: &SqlitePool, instance: Instance) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM instances")
        .fetch_one(&mut *tx)
        .await
        .context("Failed to count instances")?;

    // The subselect reads the old row before REPLACE discards it, so
    // updating credentials does not clear the current flag.
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO instances (name, base_url, username, password, is_current, updated_at)
        VALUES (?, ?, ?, ?, COALESCE((SELECT is_current FROM instances WHERE name = ?), FALSE), CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&instance.name)
    .bind(&instance.base_url)
    .bind(&instance.username)
    .bind(&instance.password)
    .bind(&instance.name)
    .execute(&mut *tx)
    .await
    .with_context(|| format!("Failed to insert instance '{}'", instance.name))?;

    if existing == 0 {
        sqlx::query("UPDATE instances SET is_current = TRUE WHERE name = ?")
            .bind(&instance.name)
            .execute(&mut *tx)
            .await
            .context("Failed to mark first instance as current")?;
    }

    tx.commit().await.context("Failed to commit transaction")?;

    log::info!("Saved instance: {}", instance.name);
    Ok(())
}

/// Get instance by name
pub async fn get(pool: &SqlitePool, name: &str) -> Result<Option<Instance>> {
    let row: Option<Instance> = sqlx::query_as(
        "SELECT name, base_url, username, password FROM instances WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get instance '{}'", name))?;

    Ok(row)
}

/// List all instances as (name, base_url, is_current)
pub async fn list(pool: &SqlitePool) -> Result<Vec<(String, String, bool)>> {
    let rows: Vec<(String, String, bool)> = sqlx::query_as(
        "SELECT name, base_url, is_current FROM instances ORDER BY name",
    )
    .fetch_all(pool)
    .await
    .context("Failed to list instances")?;

    Ok(rows)
}

/// Delete instance by name
pub async fn delete(pool: &SqlitePool, name: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM instances WHERE name = ?")
        .bind(name)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to delete instance '{}'", name))?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Instance '{}' not found", name);
    }

    log::info!("Deleted instance: {}", name);
    Ok(())
}

/// Get current instance name
pub async fn get_current(pool: &SqlitePool) -> Result<Option<String>> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT name FROM instances WHERE is_current = TRUE LIMIT 1")
            .fetch_optional(pool)
            .await
            .context("Failed to get current instance")?;

    Ok(row.map(|(name,)| name))
}

/// Set current instance
pub async fn set_current(pool: &SqlitePool, name: &str) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to start transaction")?;

    let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM instances WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *tx)
        .await
        .context("Failed to check if instance exists")?;

    if exists == 0 {
        anyhow::bail!("Instance '{}' not found", name);
    }

    sqlx::query("UPDATE instances SET is_current = FALSE WHERE is_current = TRUE")
        .execute(&mut *tx)
        .await
        .context("Failed to clear current instance flags")?;

    sqlx::query("UPDATE instances SET is_current = TRUE, updated_at = CURRENT_TIMESTAMP WHERE name = ?")
        .bind(name)
        .execute(&mut *tx)
        .await
        .context("Failed to set current instance")?;

    tx.commit().await.context("Failed to commit transaction")?;

    log::info!("Set current instance: {}", name);
    Ok(())
}
