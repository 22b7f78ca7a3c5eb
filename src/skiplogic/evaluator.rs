use std::collections::HashMap;

use serde::Serialize;

use super::rules::{SkipAction, SkipCondition};
use crate::config::models::Question;

/// Outcome of evaluating a question's rules against the captured answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "visibility", content = "allowed_options")]
pub enum VisibilityDecision {
    Show,
    Hide,
    /// Visible, but only the listed option values may be offered.
    ShowWithOptions(Vec<String>),
}

/// Decide whether a question is visible given the answers captured so far.
///
/// Rules are applied in stored order and the last rule whose trigger
/// matches wins. A question with no rules, or whose triggers are all
/// unanswered, is shown. Answers are compared verbatim against the rule
/// value; an unanswered trigger never fires a rule.
pub fn evaluate(question: &Question, answers: &HashMap<i64, String>) -> VisibilityDecision {
    let mut decision = VisibilityDecision::Show;
    for rule in &question.skip_logic {
        let Some(answer) = answers.get(&rule.trigger_question_id) else {
            continue;
        };
        let matched = match rule.condition {
            SkipCondition::Equals => answer == &rule.value,
        };
        if !matched {
            continue;
        }
        decision = match rule.action {
            SkipAction::Show => VisibilityDecision::Show,
            SkipAction::Hide => VisibilityDecision::Hide,
            SkipAction::FilterOptions => {
                VisibilityDecision::ShowWithOptions(rule.target.clone().unwrap_or_default())
            }
        };
    }
    decision
}
