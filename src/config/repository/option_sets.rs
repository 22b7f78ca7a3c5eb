//! Repository for option set operations, including the import-time merger

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use crate::api::models::ExternalOption;
use crate::config::models::OptionSet;
use crate::reconcile::ImportError;

/// Outcome of merging one external option set
#[derive(Debug, Clone, Copy)]
pub struct MergedOptionSet {
    pub option_set_id: i64,
    pub values_inserted: u32,
}

/// Merge an external option set into the local bank.
///
/// The set is keyed by trimmed display name, so same-named sets from
/// different programs collapse into one local pool. Values are inserted
/// only when the set does not already contain them, and each
/// (value, code, external set id) triple is recorded at most once.
/// Running the same merge twice inserts nothing the second time.
pub async fn merge(
    conn: &mut SqliteConnection,
    name: &str,
    options: &[ExternalOption],
    external_set_id: &str,
) -> Result<MergedOptionSet, ImportError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ImportError::Validation(
            "option set has an empty name".to_string(),
        ));
    }
    let external_set_id = external_set_id.trim();

    let option_set_id = match find_by_name(&mut *conn, name).await? {
        Some(id) => id,
        None => {
            let result = sqlx::query("INSERT INTO option_sets (name) VALUES (?)")
                .bind(name)
                .execute(&mut *conn)
                .await
                .map_err(|e| ImportError::from_insert(&format!("creating option set '{name}'"), e))?;
            log::debug!("Created option set '{}'", name);
            result.last_insert_rowid()
        }
    };

    let mut values_inserted = 0u32;
    for option in options {
        let value = option.value.trim();
        if value.is_empty() {
            log::warn!("Skipping blank option value in set '{}'", name);
            continue;
        }
        let code = option
            .code
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let value_exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM option_values WHERE option_set_id = ? AND value = ?",
        )
        .bind(option_set_id)
        .bind(value)
        .fetch_one(&mut *conn)
        .await?;

        if value_exists == 0 {
            sqlx::query("INSERT INTO option_values (option_set_id, value) VALUES (?, ?)")
                .bind(option_set_id)
                .bind(value)
                .execute(&mut *conn)
                .await
                .map_err(|e| {
                    ImportError::from_insert(&format!("inserting option value '{value}'"), e)
                })?;
            values_inserted += 1;
        }

        let mapping_exists: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM external_option_mappings \
             WHERE value = ? AND COALESCE(code, '') = COALESCE(?, '') AND option_set_id = ?",
        )
        .bind(value)
        .bind(code)
        .bind(external_set_id)
        .fetch_one(&mut *conn)
        .await?;

        if mapping_exists == 0 {
            sqlx::query(
                "INSERT INTO external_option_mappings (value, code, option_set_id) VALUES (?, ?, ?)",
            )
            .bind(value)
            .bind(code)
            .bind(external_set_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                ImportError::from_insert(&format!("mapping option value '{value}'"), e)
            })?;
        }
    }

    Ok(MergedOptionSet {
        option_set_id,
        values_inserted,
    })
}

async fn find_by_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>, ImportError> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT id FROM option_sets WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|(id,)| id))
}

/// Get option set by id
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<OptionSet>> {
    let row: Option<OptionSet> = sqlx::query_as("SELECT id, name FROM option_sets WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("Failed to get option set {id}"))?;

    Ok(row)
}

/// Values of an option set, in insertion order
pub async fn get_values(pool: &SqlitePool, option_set_id: i64) -> Result<Vec<String>> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT value FROM option_values WHERE option_set_id = ? ORDER BY id")
            .bind(option_set_id)
            .fetch_all(pool)
            .await
            .with_context(|| format!("Failed to get values for option set {option_set_id}"))?;

    Ok(rows.into_iter().map(|(value,)| value).collect())
}
