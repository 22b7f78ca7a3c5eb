use anyhow::Result;
use async_trait::async_trait;

use qbank_cli::api::ProgramReader;
use qbank_cli::api::models::{
    ExternalElement, ExternalOption, ExternalOptionSet, ExternalProgramTree, ExternalStage,
    ProgramDomain, ProgramType, RegistryDomain,
};
use qbank_cli::config::Config;
use qbank_cli::config::models::QuestionKind;
use qbank_cli::reconcile::{self, ImportError, ImportResult};

fn option_set(id: &str, name: &str, values: &[&str]) -> ExternalOptionSet {
    ExternalOptionSet {
        id: id.to_string(),
        name: name.to_string(),
        options: values
            .iter()
            .map(|value| ExternalOption {
                value: value.to_string(),
                code: None,
            })
            .collect(),
    }
}

fn element(id: &str, label: &str) -> ExternalElement {
    ExternalElement {
        id: id.to_string(),
        label: label.to_string(),
        value_type: Some("TEXT".to_string()),
        option_set: None,
    }
}

fn choice_element(id: &str, label: &str, set: ExternalOptionSet) -> ExternalElement {
    ExternalElement {
        id: id.to_string(),
        label: label.to_string(),
        value_type: Some("TEXT".to_string()),
        option_set: Some(set),
    }
}

fn stage(id: &str, name: &str, data_elements: Vec<ExternalElement>) -> ExternalStage {
    ExternalStage {
        id: Some(id.to_string()),
        name: name.to_string(),
        data_elements,
    }
}

fn tracker_tree(id: &str, name: &str) -> ExternalProgramTree {
    ExternalProgramTree {
        id: id.to_string(),
        name: name.to_string(),
        domain: ProgramDomain::Tracker,
        attributes: Vec::new(),
        stages: Vec::new(),
        category_combo: None,
    }
}

/// Two attributes (one with options), a category combo, and three data
/// elements across two stages: six questions, seven option values.
fn immunization_program() -> ExternalProgramTree {
    let mut tree = tracker_tree("IpHINAT79UW", "Child Immunization");
    tree.attributes = vec![
        element("w75KJ2mc4zz", "First name"),
        choice_element(
            "cejWyOfXge6",
            "Gender",
            option_set("pC3N9N77UmT", "Gender", &["Male", "Female"]),
        ),
    ];
    tree.category_combo = Some(option_set(
        "m2jTvAj5kkm",
        "Funding Source",
        &["Donor", "Government"],
    ));
    tree.stages = vec![
        stage(
            "A03MvHHogjR",
            "Birth",
            vec![
                choice_element(
                    "a3kGcGDCuk6",
                    "MCH Apgar Score",
                    option_set("kzgQRhOCadd", "Apgar score group", &["0-3", "4-6", "7-10"]),
                ),
                element("UXz7xuGCEhU", "Weight (g)"),
            ],
        ),
        stage(
            "ZzYYXq4fJie",
            "Baby Postnatal",
            vec![element("GQY2lXrypjO", "Infant Weight (g)")],
        ),
    ];
    tree
}

async fn import(config: &Config, survey_id: i64, tree: &ExternalProgramTree) -> Result<ImportResult> {
    let mut tx = config.pool().begin().await?;
    let result = reconcile::import_tree(&mut *tx, survey_id, tree).await?;
    tx.commit().await?;
    Ok(result)
}

async fn count(config: &Config, table: &str) -> Result<i64> {
    let n: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(config.pool())
        .await?;
    Ok(n)
}

/// Canned reader standing in for a live registry
struct CannedReader {
    tree: ExternalProgramTree,
}

#[async_trait]
impl ProgramReader for CannedReader {
    async fn fetch_program_tree(
        &self,
        _domain: RegistryDomain,
        _program_id: &str,
        _program_type: Option<ProgramType>,
    ) -> Result<ExternalProgramTree> {
        Ok(self.tree.clone())
    }
}

struct UnreachableRegistry;

#[async_trait]
impl ProgramReader for UnreachableRegistry {
    async fn fetch_program_tree(
        &self,
        _domain: RegistryDomain,
        _program_id: &str,
        _program_type: Option<ProgramType>,
    ) -> Result<ExternalProgramTree> {
        anyhow::bail!("connection refused")
    }
}

#[tokio::test]
async fn test_full_program_walk_orders_questions() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Immunization intake").await?;

    let result = import(&config, survey_id, &immunization_program()).await?;
    assert_eq!(
        result,
        ImportResult {
            questions_created: 6,
            questions_reused: 0,
            options_merged: 7,
            questions_linked: 6,
        }
    );

    let rows = config.list_survey_questions(survey_id).await?;
    let listing: Vec<(i64, &str)> = rows
        .iter()
        .map(|(position, question)| (*position, question.label.as_str()))
        .collect();
    assert_eq!(
        listing,
        vec![
            (1, "First name"),
            (2, "Gender"),
            (3, "Funding Source"),
            (4, "MCH Apgar Score"),
            (5, "Weight (g)"),
            (6, "Infant Weight (g)"),
        ]
    );

    // Elements with option sets become choice questions, bare ones text
    assert_eq!(rows[0].1.kind, QuestionKind::Text);
    assert_eq!(rows[1].1.kind, QuestionKind::Select);
    assert!(rows[1].1.option_set_id.is_some());
    assert_eq!(rows[4].1.kind, QuestionKind::Text);
    assert!(rows[4].1.option_set_id.is_none());

    let gender_values = config
        .get_option_values(rows[1].1.option_set_id.unwrap())
        .await?;
    assert_eq!(gender_values, vec!["Male", "Female"]);

    Ok(())
}

#[tokio::test]
async fn test_second_survey_reuses_entire_bank() -> Result<()> {
    let config = Config::new_test().await?;
    let first = config.create_survey("Registration A").await?;
    let second = config.create_survey("Registration B").await?;

    import(&config, first, &immunization_program()).await?;
    let questions_before = count(&config, "questions").await?;
    let sets_before = count(&config, "option_sets").await?;
    let values_before = count(&config, "option_values").await?;
    let mappings_before = count(&config, "external_mappings").await?;

    let result = import(&config, second, &immunization_program()).await?;
    assert_eq!(
        result,
        ImportResult {
            questions_created: 0,
            questions_reused: 6,
            options_merged: 0,
            questions_linked: 6,
        }
    );

    assert_eq!(count(&config, "questions").await?, questions_before);
    assert_eq!(count(&config, "option_sets").await?, sets_before);
    assert_eq!(count(&config, "option_values").await?, values_before);
    assert_eq!(count(&config, "external_mappings").await?, mappings_before);

    // The second survey gets its own contiguous positions from 1
    let rows = config.list_survey_questions(second).await?;
    let positions: Vec<i64> = rows.iter().map(|(position, _)| *position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4, 5, 6]);

    Ok(())
}

#[tokio::test]
async fn test_reimport_into_same_survey_appends() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Repeat intake").await?;

    import(&config, survey_id, &immunization_program()).await?;
    let result = import(&config, survey_id, &immunization_program()).await?;

    assert_eq!(result.questions_created, 0);
    assert_eq!(result.questions_reused, 6);
    assert_eq!(result.questions_linked, 6);

    let rows = config.list_survey_questions(survey_id).await?;
    let positions: Vec<i64> = rows.iter().map(|(position, _)| *position).collect();
    assert_eq!(positions, (1..=12).collect::<Vec<i64>>());
    assert_eq!(rows[0].1.id, rows[6].1.id);
    assert_eq!(rows[5].1.id, rows[11].1.id);

    Ok(())
}

#[tokio::test]
async fn test_empty_tree_imports_nothing() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Empty").await?;

    let result = import(&config, survey_id, &tracker_tree("bare", "Bare program")).await?;
    assert_eq!(result, ImportResult::default());
    assert_eq!(count(&config, "survey_questions").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_missing_survey_is_validation_error() -> Result<()> {
    let config = Config::new_test().await?;

    let mut tx = config.pool().begin().await?;
    let err = reconcile::import_tree(&mut *tx, 999, &immunization_program())
        .await
        .unwrap_err();
    drop(tx);

    assert!(matches!(err, ImportError::Validation(_)));
    assert_eq!(err.code(), "validation");
    assert!(err.to_string().contains("survey 999 does not exist"));

    Ok(())
}

#[tokio::test]
async fn test_repeated_element_id_creates_once_links_twice() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Vitals").await?;

    let mut tree = tracker_tree("prog", "Vitals program");
    tree.stages = vec![stage(
        "s1",
        "Checkup",
        vec![element("pulse1", "Pulse"), element("pulse1", "Pulse")],
    )];

    let result = import(&config, survey_id, &tree).await?;
    assert_eq!(result.questions_created, 1);
    assert_eq!(result.questions_reused, 1);
    assert_eq!(result.questions_linked, 2);

    assert_eq!(count(&config, "questions").await?, 1);
    let rows = config.list_survey_questions(survey_id).await?;
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].1.id, rows[1].1.id);
    assert_eq!(rows[0].0, 1);
    assert_eq!(rows[1].0, 2);

    Ok(())
}

#[tokio::test]
async fn test_default_category_combo_is_skipped() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Plain").await?;

    let mut tree = tracker_tree("prog", "Plain program");
    tree.category_combo = Some(option_set("bRowv6yZOF2", "DEFAULT", &["default"]));
    tree.stages = vec![stage("s1", "Visit", vec![element("de1", "Notes")])];

    let result = import(&config, survey_id, &tree).await?;
    assert_eq!(result.questions_linked, 1);
    assert_eq!(result.options_merged, 0);

    let rows = config.list_survey_questions(survey_id).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1.label, "Notes");
    assert_eq!(count(&config, "option_sets").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_event_program_skips_attributes() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Incident reports").await?;

    let mut tree = tracker_tree("prog", "Incident program");
    tree.domain = ProgramDomain::Event;
    tree.attributes = vec![element("attr1", "Reporter name")];
    tree.stages = vec![stage("s1", "Report", vec![element("de1", "Incident type")])];

    let result = import(&config, survey_id, &tree).await?;
    assert_eq!(result.questions_linked, 1);

    let rows = config.list_survey_questions(survey_id).await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].1.label, "Incident type");
    assert_eq!(count(&config, "questions").await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_shared_elements_reuse_across_programs() -> Result<()> {
    let config = Config::new_test().await?;
    let baseline = config.create_survey("Baseline").await?;
    let followup = config.create_survey("Follow-up").await?;

    let mut program_a = tracker_tree("progA", "Baseline program");
    program_a.stages = vec![stage(
        "s1",
        "Visit",
        vec![
            element("de1", "Height (cm)"),
            element("de2", "Weight (kg)"),
            element("de3", "Temperature"),
        ],
    )];

    let mut program_b = tracker_tree("progB", "Follow-up program");
    program_b.stages = vec![stage(
        "s9",
        "Return visit",
        vec![
            element("de2", "Weight (kg)"),
            element("de3", "Temperature"),
            element("de4", "Blood pressure"),
        ],
    )];

    let first = import(&config, baseline, &program_a).await?;
    assert_eq!(first.questions_created, 3);

    let second = import(&config, followup, &program_b).await?;
    assert_eq!(second.questions_created, 1);
    assert_eq!(second.questions_reused, 2);
    assert_eq!(second.questions_linked, 3);

    assert_eq!(count(&config, "questions").await?, 4);
    // One mapping row per distinct external id, never re-written on reuse
    assert_eq!(count(&config, "external_mappings").await?, 4);

    Ok(())
}

#[tokio::test]
async fn test_same_named_option_sets_merge_into_one_pool() -> Result<()> {
    let config = Config::new_test().await?;
    let first = config.create_survey("Screening A").await?;
    let second = config.create_survey("Screening B").await?;

    let mut program_a = tracker_tree("progA", "Screening A program");
    program_a.stages = vec![stage(
        "s1",
        "Screen",
        vec![choice_element(
            "de1",
            "Consent given",
            option_set("osA", "Yes/No", &["Yes", "No"]),
        )],
    )];

    // Different external set id, same display name, one extra value
    let mut program_b = tracker_tree("progB", "Screening B program");
    program_b.stages = vec![stage(
        "s2",
        "Screen",
        vec![choice_element(
            "de2",
            "Guardian present",
            option_set("osB", "Yes/No", &["Yes", "No", "Unknown"]),
        )],
    )];

    let result_a = import(&config, first, &program_a).await?;
    assert_eq!(result_a.options_merged, 2);

    let result_b = import(&config, second, &program_b).await?;
    assert_eq!(result_b.options_merged, 1);

    assert_eq!(count(&config, "option_sets").await?, 1);
    let rows = config.list_survey_questions(first).await?;
    let set_id = rows[0].1.option_set_id.unwrap();
    assert_eq!(
        config.get_option_values(set_id).await?,
        vec!["Yes", "No", "Unknown"]
    );

    // Each (value, code, external set) triple is recorded once per source
    assert_eq!(count(&config, "external_option_mappings").await?, 5);

    // A third pass over either program inserts nothing new
    let replay = import(&config, first, &program_a).await?;
    assert_eq!(replay.options_merged, 0);
    assert_eq!(count(&config, "external_option_mappings").await?, 5);

    Ok(())
}

#[tokio::test]
async fn test_failed_import_rolls_back_everything() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Atomic").await?;

    // Second element carries an unnamed option set, which fails
    // validation after the first element has already been written.
    let mut tree = tracker_tree("prog", "Broken program");
    tree.stages = vec![stage(
        "s1",
        "Visit",
        vec![
            element("de1", "Fine element"),
            choice_element("de2", "Broken element", option_set("osX", "   ", &["A"])),
        ],
    )];

    let reader = CannedReader { tree };
    let err = reconcile::import_program(
        &config,
        &reader,
        survey_id,
        RegistryDomain::Tracker,
        "prog",
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ImportError::Validation(_)));

    for table in [
        "questions",
        "option_sets",
        "option_values",
        "survey_questions",
        "external_mappings",
        "external_option_mappings",
    ] {
        assert_eq!(
            count(&config, table).await?,
            0,
            "{table} should be empty after rollback"
        );
    }

    Ok(())
}

#[tokio::test]
async fn test_validation_error_names_owning_element() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Context").await?;

    let mut tree = tracker_tree("prog", "Broken program");
    tree.stages = vec![stage(
        "s1",
        "Visit",
        vec![choice_element(
            "de2",
            "Broken element",
            option_set("osX", "   ", &["A"]),
        )],
    )];

    let mut tx = config.pool().begin().await?;
    let err = reconcile::import_tree(&mut *tx, survey_id, &tree)
        .await
        .unwrap_err();
    drop(tx);

    assert_eq!(err.code(), "validation");
    assert_eq!(
        err.to_string(),
        "validation failed: data element 'de2': option set has an empty name"
    );

    // Same failure on the attribute path names the attribute instead
    let mut tree = tracker_tree("prog2", "Broken attributes");
    tree.attributes = vec![choice_element(
        "attr1",
        "Broken attribute",
        option_set("osY", "", &["B"]),
    )];

    let mut tx = config.pool().begin().await?;
    let err = reconcile::import_tree(&mut *tx, survey_id, &tree)
        .await
        .unwrap_err();
    drop(tx);

    assert_eq!(
        err.to_string(),
        "validation failed: attribute 'attr1': option set has an empty name"
    );

    Ok(())
}

#[tokio::test]
async fn test_unreachable_registry_writes_nothing() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("Offline").await?;

    let err = reconcile::import_program(
        &config,
        &UnreachableRegistry,
        survey_id,
        RegistryDomain::Tracker,
        "prog",
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ImportError::ExternalFetch(_)));
    assert_eq!(err.code(), "external_fetch");
    assert!(err.to_string().starts_with("external source unavailable"));
    assert_eq!(count(&config, "questions").await?, 0);
    assert_eq!(count(&config, "survey_questions").await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_import_program_commits_on_success() -> Result<()> {
    let config = Config::new_test().await?;
    let survey_id = config.create_survey("End to end").await?;

    let reader = CannedReader {
        tree: immunization_program(),
    };
    let result = reconcile::import_program(
        &config,
        &reader,
        survey_id,
        RegistryDomain::Tracker,
        "IpHINAT79UW",
        None,
    )
    .await?;

    assert_eq!(result.questions_linked, 6);
    assert_eq!(config.list_survey_questions(survey_id).await?.len(), 6);

    Ok(())
}
