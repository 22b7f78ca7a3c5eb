use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Comparison applied to the triggering question's answer.
///
/// Only equality exists today; the enum keeps the stored payload honest
/// about which comparison produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCondition {
    Equals,
}

/// What happens to the target question when a rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipAction {
    Show,
    Hide,
    FilterOptions,
}

/// A single visibility rule, stored on the question it controls.
///
/// The serialized form is shared with other consumers of the question
/// bank, so field names and layout must survive a parse/serialize
/// round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipLogicRule {
    pub trigger_question_id: i64,
    pub condition: SkipCondition,
    pub value: String,
    pub action: SkipAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec<String>>,
}

/// Parse the stored rule payload of a question. An empty or missing
/// payload means "always visible" and yields no rules.
pub fn parse_rules(raw: &str) -> Result<Vec<SkipLogicRule>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw).context("Failed to parse skip logic rules")
}

/// Serialize rules back into the stored payload format.
pub fn serialize_rules(rules: &[SkipLogicRule]) -> Result<String> {
    serde_json::to_string(rules).context("Failed to serialize skip logic rules")
}

/// Reject rule sets that could not be evaluated meaningfully.
///
/// `filter_options` narrows the target question's choices, so it must
/// name at least one allowed option. `show`/`hide` carry no target.
pub fn validate_rules(rules: &[SkipLogicRule]) -> Result<()> {
    for (index, rule) in rules.iter().enumerate() {
        if rule.action == SkipAction::FilterOptions {
            match &rule.target {
                Some(target) if !target.is_empty() => {}
                _ => bail!(
                    "Rule {} uses filter_options but names no allowed options",
                    index + 1
                ),
            }
        }
    }
    Ok(())
}
