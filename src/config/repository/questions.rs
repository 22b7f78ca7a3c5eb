//! Repository for bank questions and the import-time reuse resolver

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use crate::config::models::{DbQuestion, Question, QuestionKind};
use crate::reconcile::ImportError;
use crate::skiplogic::{self, SkipLogicRule};

/// Role an external element plays in its program
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingRole {
    DataElement,
    Attribute,
}

/// External identity of the element being resolved
#[derive(Debug, Clone)]
pub struct ExternalKey<'a> {
    pub role: MappingRole,
    pub id: &'a str,
    pub option_set_id: Option<&'a str>,
    pub stage_id: Option<&'a str>,
}

/// Outcome of resolving one external element
#[derive(Debug, Clone, Copy)]
pub struct ResolvedQuestion {
    pub question_id: i64,
    pub reused: bool,
}

/// Resolve an external element (or a bare label) to a bank question.
///
/// With an external key, the element id decides: an already-mapped id
/// returns the mapped question and writes nothing, otherwise a new
/// required question is created together with its mapping row. Without
/// a key the lookup is by trimmed label and kind, the path category
/// combinations take, so the same combo recurring across programs
/// collapses into one question.
///
/// The local `option_set_id` is bound to the question on creation only;
/// reuse never rewrites an existing question.
pub async fn resolve(
    conn: &mut SqliteConnection,
    label: &str,
    kind: QuestionKind,
    option_set_id: Option<i64>,
    external: Option<&ExternalKey<'_>>,
) -> Result<ResolvedQuestion, ImportError> {
    let label = label.trim();
    if label.is_empty() {
        return Err(ImportError::Validation(match external {
            Some(key) => format!("external element '{}' has an empty label", key.id),
            None => "question label is empty".to_string(),
        }));
    }

    match external {
        Some(key) => {
            if let Some(question_id) = find_mapped(&mut *conn, key).await? {
                log::debug!("Reusing question {} for external id {}", question_id, key.id);
                return Ok(ResolvedQuestion {
                    question_id,
                    reused: true,
                });
            }

            let question_id = insert_question(&mut *conn, label, kind, option_set_id).await?;
            insert_mapping(&mut *conn, question_id, key).await?;
            Ok(ResolvedQuestion {
                question_id,
                reused: false,
            })
        }
        None => {
            if let Some(question_id) = find_by_label(&mut *conn, label, kind).await? {
                log::debug!("Reusing question {} for label '{}'", question_id, label);
                return Ok(ResolvedQuestion {
                    question_id,
                    reused: true,
                });
            }

            let question_id = insert_question(&mut *conn, label, kind, option_set_id).await?;
            Ok(ResolvedQuestion {
                question_id,
                reused: false,
            })
        }
    }
}

async fn find_mapped(
    conn: &mut SqliteConnection,
    key: &ExternalKey<'_>,
) -> Result<Option<i64>, ImportError> {
    let sql = match key.role {
        MappingRole::DataElement => {
            "SELECT question_id FROM external_mappings WHERE data_element_id = ? ORDER BY id LIMIT 1"
        }
        MappingRole::Attribute => {
            "SELECT question_id FROM external_mappings WHERE attribute_id = ? ORDER BY id LIMIT 1"
        }
    };

    let row: Option<(i64,)> = sqlx::query_as(sql)
        .bind(key.id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(|(id,)| id))
}

async fn find_by_label(
    conn: &mut SqliteConnection,
    label: &str,
    kind: QuestionKind,
) -> Result<Option<i64>, ImportError> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM questions WHERE label = ? AND kind = ? ORDER BY id LIMIT 1")
            .bind(label)
            .bind(kind.as_str())
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|(id,)| id))
}

async fn insert_question(
    conn: &mut SqliteConnection,
    label: &str,
    kind: QuestionKind,
    option_set_id: Option<i64>,
) -> Result<i64, ImportError> {
    let result = sqlx::query(
        "INSERT INTO questions (label, kind, is_required, option_set_id) VALUES (?, ?, TRUE, ?)",
    )
    .bind(label)
    .bind(kind.as_str())
    .bind(option_set_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| ImportError::from_insert(&format!("creating question '{label}'"), e))?;

    log::debug!("Created {} question '{}'", kind, label);
    Ok(result.last_insert_rowid())
}

async fn insert_mapping(
    conn: &mut SqliteConnection,
    question_id: i64,
    key: &ExternalKey<'_>,
) -> Result<(), ImportError> {
    let (data_element_id, attribute_id) = match key.role {
        MappingRole::DataElement => (Some(key.id), None),
        MappingRole::Attribute => (None, Some(key.id)),
    };

    sqlx::query(
        r#"
        INSERT INTO external_mappings (question_id, data_element_id, attribute_id, option_set_id, stage_id)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(question_id)
    .bind(data_element_id)
    .bind(attribute_id)
    .bind(key.option_set_id)
    .bind(key.stage_id)
    .execute(&mut *conn)
    .await
    .map_err(|e| ImportError::from_insert(&format!("mapping external id '{}'", key.id), e))?;

    Ok(())
}

/// Get question by id, with skip logic and validation rules parsed
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Question>> {
    let row: Option<DbQuestion> = sqlx::query_as(
        r#"
        SELECT id, label, kind, is_required, option_set_id, min_selections,
               max_selections, validation_rules, skip_logic
        FROM questions WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .with_context(|| format!("Failed to get question {id}"))?;

    row.map(DbQuestion::into_question).transpose()
}

/// Replace the skip-logic rules of a question
pub async fn set_skip_logic(pool: &SqlitePool, id: i64, rules: &[SkipLogicRule]) -> Result<()> {
    skiplogic::validate_rules(rules)?;

    let payload = if rules.is_empty() {
        None
    } else {
        Some(skiplogic::serialize_rules(rules)?)
    };

    let result = sqlx::query("UPDATE questions SET skip_logic = ? WHERE id = ?")
        .bind(payload)
        .bind(id)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to update skip logic for question {id}"))?;

    if result.rows_affected() == 0 {
        anyhow::bail!("Question {} not found", id);
    }

    log::info!("Updated skip logic for question {} ({} rules)", id, rules.len());
    Ok(())
}
