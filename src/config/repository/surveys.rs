//! Repository for survey operations

use anyhow::{Context, Result};
use sqlx::{SqliteConnection, SqlitePool};

use crate::config::models::{Question, Survey, SurveyQuestionRow};
use crate::reconcile::ImportError;

/// Create a survey and return its id
pub async fn create(pool: &SqlitePool, name: &str) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("Survey name cannot be empty");
    }

    let result = sqlx::query("INSERT INTO surveys (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to create survey '{}'", name))?;

    let id = result.last_insert_rowid();
    log::info!("Created survey '{}' (id {})", name, id);
    Ok(id)
}

/// Get survey by id
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Option<Survey>> {
    let row: Option<Survey> =
        sqlx::query_as("SELECT id, name, created_at FROM surveys WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await
            .with_context(|| format!("Failed to get survey {id}"))?;

    Ok(row)
}

/// List all surveys
pub async fn list(pool: &SqlitePool) -> Result<Vec<Survey>> {
    let rows: Vec<Survey> = sqlx::query_as("SELECT id, name, created_at FROM surveys ORDER BY id")
        .fetch_all(pool)
        .await
        .context("Failed to list surveys")?;

    Ok(rows)
}

/// Questions attached to a survey, in position order
pub async fn list_questions(pool: &SqlitePool, survey_id: i64) -> Result<Vec<(i64, Question)>> {
    let rows: Vec<SurveyQuestionRow> = sqlx::query_as(
        r#"
        SELECT sq.position, q.id, q.label, q.kind, q.is_required, q.option_set_id,
               q.min_selections, q.max_selections, q.validation_rules, q.skip_logic
        FROM survey_questions sq
        JOIN questions q ON q.id = sq.question_id
        WHERE sq.survey_id = ?
        ORDER BY sq.position
        "#,
    )
    .bind(survey_id)
    .fetch_all(pool)
    .await
    .with_context(|| format!("Failed to list questions for survey {survey_id}"))?;

    rows.into_iter()
        .map(|row| Ok((row.position, row.question.into_question()?)))
        .collect()
}

/// Whether the survey exists, checked on the import connection
pub async fn exists_on(conn: &mut SqliteConnection, survey_id: i64) -> Result<bool, ImportError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM surveys WHERE id = ?")
        .bind(survey_id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(count > 0)
}

/// Next free position in a survey. Positions start at 1 and stay
/// contiguous because links are only ever appended.
pub async fn next_position(conn: &mut SqliteConnection, survey_id: i64) -> Result<i64, ImportError> {
    let max: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(position), 0) FROM survey_questions WHERE survey_id = ?")
            .bind(survey_id)
            .fetch_one(&mut *conn)
            .await?;

    Ok(max + 1)
}

/// Append a question link at the given position
pub async fn link_question(
    conn: &mut SqliteConnection,
    survey_id: i64,
    question_id: i64,
    position: i64,
) -> Result<(), ImportError> {
    sqlx::query("INSERT INTO survey_questions (survey_id, question_id, position) VALUES (?, ?, ?)")
        .bind(survey_id)
        .bind(question_id)
        .bind(position)
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            ImportError::from_insert(
                &format!("linking question {question_id} at position {position}"),
                e,
            )
        })?;

    Ok(())
}
