//! Fixed phrases spoken by the intake bot.
//!
//! These strings are matched verbatim by downstream tooling; do not reword them.

use crate::state::FeatureName;

pub const INITIAL_PROMPT: &str = "Please provide the patient's details including age, gender, transfusion details, RDW level, insulin-requiring diabetes mellitus, and grade of kidney disease.";

pub const TRANSPORT_ERROR: &str = "Error: Could not process your request.";

pub const RECOGNITION_ERROR: &str = "Error: Speech recognition failed.";

const REPROMPT_PREFIX: &str = "Please re-enter the value for the following features: ";

/// Re-prompt naming every rejected feature in the order the backend listed them.
pub fn reentry_prompt(features: &[FeatureName]) -> String {
    let list = features
        .iter()
        .map(FeatureName::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}{}.", REPROMPT_PREFIX, list)
}
