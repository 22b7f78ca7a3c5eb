//! Answer-aware feed for the survey renderer.
//!
//! The collaborator rendering surveys does not evaluate skip logic
//! itself. It hands us the answers captured so far and gets back every
//! question in order, each tagged with its visibility decision.

use std::collections::HashMap;

use anyhow::{Result, bail};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::config::models::Question;
use crate::config::repository::surveys;
use crate::skiplogic::{self, VisibilityDecision};

/// One survey entry with its evaluated visibility.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedQuestion {
    pub position: i64,
    pub question: Question,
    #[serde(flatten)]
    pub decision: VisibilityDecision,
}

/// Evaluate every question in a survey against the captured answers.
///
/// Rows come back in position order and include hidden entries, so the
/// renderer can choose between dropping them and greying them out.
pub async fn get_visible_questions(
    pool: &SqlitePool,
    survey_id: i64,
    answers: &HashMap<i64, String>,
) -> Result<Vec<RenderedQuestion>> {
    if surveys::get(pool, survey_id).await?.is_none() {
        bail!("Survey {} not found", survey_id);
    }

    let rows = surveys::list_questions(pool, survey_id).await?;
    Ok(rows
        .into_iter()
        .map(|(position, question)| {
            let decision = skiplogic::evaluate(&question, answers);
            RenderedQuestion {
                position,
                question,
                decision,
            }
        })
        .collect())
}
