//! Output reporters for rating decisions
//!
//! Supports two output formats:
//! - `text` - Terminal output with colors
//! - `json` - Machine-readable JSON (an array of decisions)

mod json;
mod text;

use crate::models::RatingDecision;
use anyhow::{anyhow, Result};
use std::str::FromStr;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" | "terminal" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(anyhow!("Unknown format '{}'. Valid formats: text, json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Render decisions in the specified format
pub fn report(decisions: &[RatingDecision], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => text::render(decisions),
        OutputFormat::Json => json::render(decisions),
    }
}

/// Render one decision as JSON
pub fn render_json(decision: &RatingDecision) -> Result<String> {
    json::render_one(decision)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{Category, CategoryScore, FiredRule, Rating, TriggerUnit, UnitWarning};
    use std::collections::BTreeMap;

    /// A 16+ decision triggered by violence
    pub(crate) fn test_decision() -> RatingDecision {
        let per_category = Category::ALL
            .iter()
            .map(|&category| {
                let (raw, adjustment, contexts) = match category {
                    Category::Violence => (0.1818, 1.2, vec!["horror_violence".to_string()]),
                    Category::Gore => (0.0909, 1.3, vec!["horror_violence".to_string()]),
                    _ => (0.0, 1.0, vec![]),
                };
                CategoryScore {
                    category,
                    raw_density: raw,
                    hit_count: if raw > 0.0 { 1 } else { 0 },
                    active_contexts: contexts,
                    context_adjustment: adjustment,
                    adjusted_score: raw * adjustment,
                    source_unit: Some(0),
                }
            })
            .collect();

        let mut evidence = BTreeMap::new();
        evidence.insert(
            Category::Violence,
            vec!["he pulled out a knife and stabbed him".to_string()],
        );

        RatingDecision {
            document_id: "scene.txt".into(),
            rating: Rating::SixteenPlus,
            rationale: "16+: violence score 0.2182 >= threshold 0.1000".into(),
            triggering_category: Some(Category::Violence),
            triggering_threshold: Some(0.10),
            fired_rules: vec![FiredRule {
                category: Category::Violence,
                threshold: 0.10,
                score: 0.2182,
                reason: Category::Violence.reason().into(),
            }],
            per_category,
            units_analyzed: 1,
            warnings: vec![UnitWarning {
                unit_index: 0,
                message: "semantic context unavailable: Embedding timed out after 10 ms".into(),
            }],
            evidence,
            top_units: vec![TriggerUnit {
                unit_index: 0,
                heading: Some("INT. KITCHEN - NIGHT".into()),
                preview: "He pulled out a knife".into(),
                weight: 0.2,
                scores: [(Category::Violence, 0.2182)].into_iter().collect(),
            }],
            profile_fingerprint: "abc123".into(),
        }
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from_str("text").expect("text"), OutputFormat::Text);
        assert_eq!(OutputFormat::from_str("JSON").expect("json"), OutputFormat::Json);
        assert!(OutputFormat::from_str("sarif").is_err());
    }
}
