//! Conditional visibility rules for survey questions.
//!
//! Rules are stored verbatim on the question they control and evaluated
//! against the answers captured so far. Evaluation is pure: no I/O, no
//! clock, no database access.

pub mod evaluator;
pub mod rules;

pub use evaluator::{VisibilityDecision, evaluate};
pub use rules::{SkipAction, SkipCondition, SkipLogicRule, parse_rules, serialize_rules, validate_rules};
