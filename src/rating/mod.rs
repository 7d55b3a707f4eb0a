//! Threshold table and rating decision
//!
//! Tiers are checked from 18+ down to 6+. Within a tier rules are checked
//! in profile order and the first rule whose category score is at or above
//! its threshold selects the tier. If no tier fires the rating is 0+.

mod thresholds;

pub use thresholds::ThresholdTable;

use crate::models::{Category, CategoryScore, FiredRule, Rating};

/// Outcome of walking the threshold table
#[derive(Debug, Clone, PartialEq)]
pub struct TierDecision {
    pub rating: Rating,
    pub rationale: String,
    pub triggering_category: Option<Category>,
    pub triggering_threshold: Option<f64>,
    pub fired_rules: Vec<FiredRule>,
}

impl TierDecision {
    fn fallback(rationale: &str) -> Self {
        Self {
            rating: Rating::ZeroPlus,
            rationale: format!("{}: {}", Rating::ZeroPlus, rationale),
            triggering_category: None,
            triggering_threshold: None,
            fired_rules: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RatingDecisionEngine {
    thresholds: ThresholdTable,
}

impl RatingDecisionEngine {
    pub fn new(thresholds: ThresholdTable) -> Self {
        Self { thresholds }
    }

    /// Map document-level scores to a tier.
    ///
    /// `units_analyzed == 0` is reported as "no content" rather than as a
    /// clean document.
    pub fn decide(&self, scores: &[CategoryScore], units_analyzed: usize) -> TierDecision {
        if units_analyzed == 0 {
            return TierDecision::fallback("no content to analyze");
        }

        let score_of = |category: Category| {
            scores
                .iter()
                .find(|s| s.category == category)
                .map(|s| s.adjusted_score)
                .unwrap_or(0.0)
        };

        for rating in Rating::DESCENDING {
            let fired: Vec<FiredRule> = self
                .thresholds
                .rules(rating)
                .iter()
                .filter_map(|rule| {
                    let score = score_of(rule.category);
                    (score >= rule.threshold).then(|| FiredRule {
                        category: rule.category,
                        threshold: rule.threshold,
                        score,
                        reason: rule.category.reason().to_string(),
                    })
                })
                .collect();

            let Some(first) = fired.first() else {
                continue;
            };

            let mut rationale = format!(
                "{}: {} score {:.4} >= threshold {:.4} ({})",
                rating, first.category, first.score, first.threshold, first.reason
            );
            for other in &fired[1..] {
                rationale.push_str(&format!(
                    "; also {} {:.4} >= {:.4}",
                    other.category, other.score, other.threshold
                ));
            }

            return TierDecision {
                rating,
                rationale,
                triggering_category: Some(first.category),
                triggering_threshold: Some(first.threshold),
                fired_rules: fired,
            };
        }

        TierDecision::fallback("no category met any threshold")
    }
}
