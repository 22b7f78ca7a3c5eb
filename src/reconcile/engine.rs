//! The reconciliation walk: external program trees into the question bank

use log::{debug, info};
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::api::ProgramReader;
use crate::api::models::{
    ExternalOptionSet, ExternalProgramTree, ProgramDomain, ProgramType, RegistryDomain,
};
use crate::config::Config;
use crate::config::models::QuestionKind;
use crate::config::repository::questions::{ExternalKey, MappingRole, ResolvedQuestion};
use crate::config::repository::{option_sets, questions, surveys};

use super::error::ImportError;

/// Counts reported by a completed import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ImportResult {
    pub questions_created: u32,
    pub questions_reused: u32,
    pub options_merged: u32,
    pub questions_linked: u32,
}

/// Fetch a program tree and reconcile it into a survey.
///
/// The fetch completes before the write transaction begins, so a slow or
/// failing registry never leaves partial state. All writes happen inside
/// one transaction: commit on success, rollback on the first error.
pub async fn import_program(
    config: &Config,
    reader: &dyn ProgramReader,
    survey_id: i64,
    domain: RegistryDomain,
    program_id: &str,
    program_type: Option<ProgramType>,
) -> Result<ImportResult, ImportError> {
    let run_id = Uuid::new_v4();
    info!("[{run_id}] importing {domain} program {program_id} into survey {survey_id}");

    let tree = reader
        .fetch_program_tree(domain, program_id, program_type)
        .await
        .map_err(|e| ImportError::ExternalFetch(format!("program {program_id}: {e:#}")))?;

    let mut tx = config.pool().begin().await?;
    let result = import_tree(&mut *tx, survey_id, &tree).await?;
    tx.commit().await?;

    info!(
        "[{run_id}] committed: {} created, {} reused, {} options merged, {} linked",
        result.questions_created,
        result.questions_reused,
        result.options_merged,
        result.questions_linked
    );
    Ok(result)
}

/// Walk a validated tree and reconcile it into `survey_id` on the given
/// connection. Callers own transaction boundaries; [`import_program`]
/// wraps this so the whole walk commits or rolls back together.
///
/// Walk order is fixed: tracked-entity attributes, then the category
/// combination, then data elements stage by stage in declaration order.
/// Positions continue from the survey's current maximum, so importing a
/// second program appends after the first.
pub async fn import_tree(
    conn: &mut SqliteConnection,
    survey_id: i64,
    tree: &ExternalProgramTree,
) -> Result<ImportResult, ImportError> {
    if !surveys::exists_on(&mut *conn, survey_id).await? {
        return Err(ImportError::Validation(format!(
            "survey {survey_id} does not exist"
        )));
    }

    let mut result = ImportResult::default();
    let mut position = surveys::next_position(&mut *conn, survey_id).await?;

    // 1. Tracked-entity attributes (tracker programs only)
    if tree.domain == ProgramDomain::Tracker {
        for attribute in &tree.attributes {
            let option_set_id = merge_option_set(
                &mut *conn,
                "attribute",
                &attribute.id,
                attribute.option_set.as_ref(),
                &mut result,
            )
            .await?;
            let kind = question_kind_for(option_set_id);
            let key = ExternalKey {
                role: MappingRole::Attribute,
                id: &attribute.id,
                option_set_id: attribute.option_set.as_ref().map(|set| set.id.as_str()),
                stage_id: None,
            };
            let resolved =
                questions::resolve(&mut *conn, &attribute.label, kind, option_set_id, Some(&key))
                    .await?;
            link(&mut *conn, survey_id, &resolved, &mut position, &mut result).await?;
        }
    }

    // 2. Category combination, unless it is the registry's default placeholder
    if let Some(combo) = &tree.category_combo {
        if is_default_category_combo(&combo.name) {
            debug!("Skipping default category combination '{}'", combo.name);
        } else {
            let merged = option_sets::merge(&mut *conn, &combo.name, &combo.options, &combo.id)
                .await
                .map_err(|e| e.owned_by("category combination", &combo.id))?;
            result.options_merged += merged.values_inserted;
            // Keyed by name, not external id: the same combo recurs
            // across programs and collapses into one question.
            let resolved = questions::resolve(
                &mut *conn,
                &combo.name,
                QuestionKind::Select,
                Some(merged.option_set_id),
                None,
            )
            .await?;
            link(&mut *conn, survey_id, &resolved, &mut position, &mut result).await?;
        }
    }

    // 3. Data elements, stage by stage in declaration order
    for stage in &tree.stages {
        for element in &stage.data_elements {
            let option_set_id = merge_option_set(
                &mut *conn,
                "data element",
                &element.id,
                element.option_set.as_ref(),
                &mut result,
            )
            .await?;
            let kind = question_kind_for(option_set_id);
            let key = ExternalKey {
                role: MappingRole::DataElement,
                id: &element.id,
                option_set_id: element.option_set.as_ref().map(|set| set.id.as_str()),
                stage_id: stage.id.as_deref(),
            };
            let resolved =
                questions::resolve(&mut *conn, &element.label, kind, option_set_id, Some(&key))
                    .await?;
            link(&mut *conn, survey_id, &resolved, &mut position, &mut result).await?;
        }
    }

    Ok(result)
}

/// Merge an element's option set, if it has one, and tally the inserts.
/// Failures are tagged with the owning element so the caller sees which
/// part of the tree carried the bad set.
async fn merge_option_set(
    conn: &mut SqliteConnection,
    owner_role: &str,
    owner_id: &str,
    option_set: Option<&ExternalOptionSet>,
    result: &mut ImportResult,
) -> Result<Option<i64>, ImportError> {
    let Some(set) = option_set else {
        return Ok(None);
    };

    let merged = option_sets::merge(&mut *conn, &set.name, &set.options, &set.id)
        .await
        .map_err(|e| e.owned_by(owner_role, owner_id))?;
    result.options_merged += merged.values_inserted;
    Ok(Some(merged.option_set_id))
}

fn question_kind_for(option_set_id: Option<i64>) -> QuestionKind {
    if option_set_id.is_some() {
        QuestionKind::Select
    } else {
        QuestionKind::Text
    }
}

async fn link(
    conn: &mut SqliteConnection,
    survey_id: i64,
    resolved: &ResolvedQuestion,
    position: &mut i64,
    result: &mut ImportResult,
) -> Result<(), ImportError> {
    surveys::link_question(&mut *conn, survey_id, resolved.question_id, *position).await?;
    *position += 1;
    result.questions_linked += 1;
    if resolved.reused {
        result.questions_reused += 1;
    } else {
        result.questions_created += 1;
    }
    Ok(())
}

/// The registry models "no disaggregation" as a combination named
/// "default"; it carries no analytical meaning and is not imported.
fn is_default_category_combo(name: &str) -> bool {
    let trimmed = name.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default")
}
