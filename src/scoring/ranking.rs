//! Trigger-unit ranking
//!
//! Reviewers want to jump straight to the scenes that drove a rating. Each
//! unit gets a weight, the sum of its adjusted category scores times the
//! per-category ranking weight, and the heaviest units are reported.

use crate::config::{resolve_category, ConfigResult, RankingConfig};
use crate::models::{Category, TextUnit, TriggerUnit, UnitScore};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct UnitRanking {
    weights: BTreeMap<Category, f64>,
    top_units: usize,
    min_weight: f64,
    preview_chars: usize,
}

impl UnitRanking {
    pub fn from_config(ranking: &RankingConfig) -> ConfigResult<Self> {
        let weights = ranking
            .weights
            .iter()
            .map(|(name, &w)| Ok((resolve_category("ranking.weights", name)?, w)))
            .collect::<ConfigResult<_>>()?;
        Ok(Self {
            weights,
            top_units: ranking.top_units,
            min_weight: ranking.min_weight,
            preview_chars: ranking.preview_chars,
        })
    }

    pub fn unit_weight(&self, score: &UnitScore) -> f64 {
        self.weights
            .iter()
            .map(|(&category, w)| w * score.adjusted(category))
            .sum()
    }

    /// Heaviest units first; ties go to the earlier unit
    pub fn rank(&self, units: &[(&TextUnit, &UnitScore)]) -> Vec<TriggerUnit> {
        let mut ranked: Vec<TriggerUnit> = units
            .iter()
            .filter_map(|(unit, score)| {
                let weight = self.unit_weight(score);
                if weight <= self.min_weight {
                    return None;
                }
                Some(TriggerUnit {
                    unit_index: unit.index,
                    heading: unit.heading.clone(),
                    preview: preview(&unit.text, self.preview_chars),
                    weight,
                    scores: score
                        .categories
                        .iter()
                        .filter(|c| c.adjusted_score > 0.0)
                        .map(|c| (c.category, c.adjusted_score))
                        .collect(),
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.unit_index.cmp(&b.unit_index))
        });
        ranked.truncate(self.top_units);
        ranked
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let cut: String = collapsed.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
