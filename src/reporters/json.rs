//! JSON reporter
//!
//! Outputs decisions as pretty-printed JSON. Maps are ordered, so the same
//! decision always renders to the same bytes.

use crate::models::RatingDecision;
use anyhow::Result;

/// Render decisions as a JSON array
pub fn render(decisions: &[RatingDecision]) -> Result<String> {
    Ok(serde_json::to_string_pretty(decisions)?)
}

/// Render a single decision as a JSON object
pub fn render_one(decision: &RatingDecision) -> Result<String> {
    Ok(serde_json::to_string_pretty(decision)?)
}
