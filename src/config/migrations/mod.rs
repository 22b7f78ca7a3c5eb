//! Migration framework for the question bank database.
//!
//! Migrations are embedded at compile time and auto-discovered from the
//! files/ directory. Each migration is a directory named `NNN_name`
//! containing an `up.sql`. The schema only ever moves forward; applied
//! migrations are tracked with a checksum so edits to already-applied
//! files are caught at startup.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use std::collections::BTreeMap;

pub mod manager;

pub use manager::MigrationManager;

/// A single forward migration
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub name: String,
    pub up_sql: String,
}

/// Migration record in the database
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedMigration {
    pub version: i64,
    pub name: String,
    pub applied_at: chrono::DateTime<chrono::Utc>,
    pub checksum: String,
}

/// Load all available migrations from the embedded files
pub fn load_migrations() -> Result<BTreeMap<i64, Migration>> {
    use include_dir::{Dir, include_dir};

    static MIGRATIONS_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/config/migrations/files");

    let mut migrations = BTreeMap::new();

    for entry in MIGRATIONS_DIR.dirs() {
        let dir_name = entry
            .path()
            .file_name()
            .and_then(|n| n.to_str())
            .context("Invalid migration directory name")?;

        // Directory name format: NNN_name
        let parts: Vec<&str> = dir_name.splitn(2, '_').collect();
        if parts.len() != 2 {
            anyhow::bail!(
                "Invalid migration directory format: {}. Expected format: NNN_name",
                dir_name
            );
        }

        let version: i64 = parts[0]
            .parse()
            .with_context(|| format!("Invalid migration version in directory: {dir_name}"))?;
        let name = parts[1].to_string();

        let up_sql = MIGRATIONS_DIR
            .get_file(format!("{dir_name}/up.sql"))
            .with_context(|| format!("Missing up.sql in migration {dir_name}"))?
            .contents_utf8()
            .with_context(|| format!("up.sql is not valid UTF-8 in migration {dir_name}"))?
            .to_string();

        if migrations.insert(version, Migration { version, name, up_sql }).is_some() {
            anyhow::bail!("Duplicate migration version: {version}");
        }
    }

    if migrations.is_empty() {
        anyhow::bail!("No migrations found in files directory");
    }

    Ok(migrations)
}

/// Initialize the migration tracking table
pub async fn init_migration_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
            checksum TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await
    .context("Failed to create schema_migrations table")?;

    Ok(())
}

/// Get list of applied migrations
pub async fn get_applied_migrations(pool: &SqlitePool) -> Result<Vec<AppliedMigration>> {
    sqlx::query_as::<_, AppliedMigration>(
        "SELECT version, name, applied_at, checksum FROM schema_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .context("Failed to get applied migrations")
}

/// Calculate checksum for migration SQL.
/// Line endings are normalized to LF before hashing so the same file
/// hashes identically on Windows and Unix checkouts.
pub fn calculate_checksum(sql: &str) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let normalized = sql.replace("\r\n", "\n").replace('\r', "\n");

    let mut hasher = DefaultHasher::new();
    normalized.hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

/// Validate that applied migrations match the embedded ones
pub async fn validate_migrations(pool: &SqlitePool) -> Result<()> {
    let available = load_migrations()?;
    let applied = get_applied_migrations(pool).await?;

    for applied_migration in applied {
        let Some(available_migration) = available.get(&applied_migration.version) else {
            anyhow::bail!(
                "Applied migration {} '{}' not found in available migrations",
                applied_migration.version,
                applied_migration.name
            );
        };

        let expected_checksum = calculate_checksum(&available_migration.up_sql);
        if applied_migration.checksum != expected_checksum {
            anyhow::bail!(
                "Migration {} checksum mismatch! Applied: {}, Expected: {}. \
                This indicates the migration file has been modified after being applied.",
                applied_migration.version,
                applied_migration.checksum,
                expected_checksum
            );
        }
    }

    Ok(())
}

/// Get pending migrations (available but not applied)
pub async fn get_pending_migrations(pool: &SqlitePool) -> Result<Vec<Migration>> {
    let available = load_migrations()?;
    let applied = get_applied_migrations(pool).await?;

    let applied_versions: std::collections::HashSet<i64> =
        applied.into_iter().map(|m| m.version).collect();

    Ok(available
        .into_values()
        .filter(|m| !applied_versions.contains(&m.version))
        .collect())
}

/// Get the current schema version (highest applied migration)
pub async fn get_current_version(pool: &SqlitePool) -> Result<Option<i64>> {
    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await
        .context("Failed to get current schema version")?;

    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_migrations() {
        let migrations = load_migrations().unwrap();

        assert!(migrations.contains_key(&1), "Should have migration 001_initial");
        assert!(migrations.contains_key(&2), "Should have migration 002_indexes");

        for (version, migration) in &migrations {
            assert!(!migration.up_sql.is_empty(), "Migration {} should have up.sql", version);
            assert!(!migration.name.is_empty(), "Migration {} should have a name", version);
        }
    }

    #[test]
    fn test_calculate_checksum() {
        let sql = "CREATE TABLE test (id INTEGER);";
        let checksum1 = calculate_checksum(sql);
        let checksum2 = calculate_checksum(sql);
        assert_eq!(checksum1, checksum2);

        let different_sql = "CREATE TABLE test2 (id INTEGER);";
        assert_ne!(checksum1, calculate_checksum(different_sql));
    }

    #[test]
    fn test_checksum_ignores_line_endings() {
        let unix = "CREATE TABLE test (\n    id INTEGER\n);";
        let windows = "CREATE TABLE test (\r\n    id INTEGER\r\n);";
        assert_eq!(calculate_checksum(unix), calculate_checksum(windows));
    }
}
