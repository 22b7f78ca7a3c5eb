//! Data models for the question bank database

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::skiplogic::{self, SkipLogicRule};

/// Registered external registry instance
#[derive(Debug, Clone, FromRow)]
pub struct Instance {
    pub name: String,
    pub base_url: String,
    pub username: String,
    pub password: String,
}

/// A survey that bank questions can be attached to
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Survey {
    pub id: i64,
    pub name: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A shared pool of answer choices
#[derive(Debug, Clone, FromRow)]
pub struct OptionSet {
    pub id: i64,
    pub name: String,
}

/// Answer kind of a question. Choice kinds carry an option set,
/// free-form kinds never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionKind {
    Text,
    Select,
    Radio,
    Checkbox,
    Number,
    Date,
}

impl QuestionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionKind::Text => "text",
            QuestionKind::Select => "select",
            QuestionKind::Radio => "radio",
            QuestionKind::Checkbox => "checkbox",
            QuestionKind::Number => "number",
            QuestionKind::Date => "date",
        }
    }

    /// Whether this kind draws its answers from an option set
    pub fn uses_option_set(&self) -> bool {
        matches!(
            self,
            QuestionKind::Select | QuestionKind::Radio | QuestionKind::Checkbox
        )
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QuestionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Ok(match s {
            "text" => QuestionKind::Text,
            "select" => QuestionKind::Select,
            "radio" => QuestionKind::Radio,
            "checkbox" => QuestionKind::Checkbox,
            "number" => QuestionKind::Number,
            "date" => QuestionKind::Date,
            other => bail!("Unknown question kind: {other}"),
        })
    }
}

/// A bank question with its parsed skip logic
#[derive(Debug, Clone, Serialize)]
pub struct Question {
    pub id: i64,
    pub label: String,
    pub kind: QuestionKind,
    pub is_required: bool,
    pub option_set_id: Option<i64>,
    pub min_selections: Option<i64>,
    pub max_selections: Option<i64>,
    pub validation_rules: Option<serde_json::Value>,
    pub skip_logic: Vec<SkipLogicRule>,
}

/// Database representation of a question row
#[derive(Debug, Clone, FromRow)]
pub struct DbQuestion {
    pub id: i64,
    pub label: String,
    pub kind: String,
    pub is_required: bool,
    pub option_set_id: Option<i64>,
    pub min_selections: Option<i64>,
    pub max_selections: Option<i64>,
    pub validation_rules: Option<String>, // JSON
    pub skip_logic: Option<String>,       // JSON
}

impl DbQuestion {
    pub fn into_question(self) -> Result<Question> {
        let kind: QuestionKind = self
            .kind
            .parse()
            .with_context(|| format!("Question {} has an invalid kind", self.id))?;

        let validation_rules = match self.validation_rules {
            Some(raw) => Some(
                serde_json::from_str(&raw)
                    .with_context(|| format!("Question {} has invalid validation rules", self.id))?,
            ),
            None => None,
        };

        let skip_logic = match self.skip_logic {
            Some(raw) => skiplogic::parse_rules(&raw)
                .with_context(|| format!("Question {} has invalid skip logic", self.id))?,
            None => Vec::new(),
        };

        Ok(Question {
            id: self.id,
            label: self.label,
            kind,
            is_required: self.is_required,
            option_set_id: self.option_set_id,
            min_selections: self.min_selections,
            max_selections: self.max_selections,
            validation_rules,
            skip_logic,
        })
    }
}

/// A question row joined with its position in a survey
#[derive(Debug, Clone, FromRow)]
pub struct SurveyQuestionRow {
    pub position: i64,
    #[sqlx(flatten)]
    pub question: DbQuestion,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_kind_round_trip() {
        for kind in [
            QuestionKind::Text,
            QuestionKind::Select,
            QuestionKind::Radio,
            QuestionKind::Checkbox,
            QuestionKind::Number,
            QuestionKind::Date,
        ] {
            let parsed: QuestionKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("multiselect".parse::<QuestionKind>().is_err());
    }

    #[test]
    fn test_choice_kinds_use_option_sets() {
        assert!(QuestionKind::Select.uses_option_set());
        assert!(QuestionKind::Radio.uses_option_set());
        assert!(QuestionKind::Checkbox.uses_option_set());
        assert!(!QuestionKind::Text.uses_option_set());
        assert!(!QuestionKind::Number.uses_option_set());
        assert!(!QuestionKind::Date.uses_option_set());
    }
}
