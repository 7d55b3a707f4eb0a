//! Context-adjusted scoring and document aggregation
//!
//! # Scoring Formula
//!
//! ```text
//! adjusted(unit, category) = raw_density(unit, category) × Π multiplier(ctx, pole, category)
//!
//! Where the product runs over the contexts active on the unit, in name
//! order, and pole is graphic for a positive polarity score, mitigating
//! for a negative one. Missing multipliers are 1.0.
//! ```
//!
//! Raw densities are peak-window densities from the scanner, so appending
//! or prepending text to a unit never lowers them. Text inserted inside the
//! densest window can, and added text is re-classified along with the rest
//! of the unit, which may switch a context's pole.
//!
//! # Aggregation Policies
//!
//! - **max** (default): the highest unit score; ties go to the earliest unit
//! - **weighted_mean**: unit scores weighted by token count
//! - **percentile**: linear-interpolated percentile of unit scores
//!
//! # Example
//!
//! A unit with violence density 0.20 under an active graphic
//! `stylized_action` context (violence × 0.8) scores 0.16.

mod multipliers;
mod ranking;

pub use multipliers::MultiplierTable;
pub use ranking::UnitRanking;

use crate::config::AggregationPolicy;
use crate::lexicon::ScanResult;
use crate::models::{ActiveContext, Category, CategoryScore, UnitScore};
use std::collections::BTreeSet;

/// Applies context multipliers to unit scans and reduces units to a
/// document-level score per category
#[derive(Debug, Clone)]
pub struct ScoreAggregator {
    multipliers: MultiplierTable,
    policy: AggregationPolicy,
}

impl ScoreAggregator {
    pub fn new(multipliers: MultiplierTable, policy: AggregationPolicy) -> Self {
        Self {
            multipliers,
            policy,
        }
    }

    /// Context-adjusted scores of one unit, one entry per category
    pub fn score_unit(&self, scan: &ScanResult, active: &[ActiveContext]) -> Vec<CategoryScore> {
        let mut ordered: Vec<&ActiveContext> = active.iter().collect();
        ordered.sort_by(|a, b| a.context_type.cmp(&b.context_type));

        Category::ALL
            .iter()
            .map(|&category| {
                let (raw_density, hit_count) = scan
                    .hits(category)
                    .map(|h| (h.raw_density, h.hit_count))
                    .unwrap_or((0.0, 0));

                let mut adjustment = 1.0;
                let mut contributing = Vec::new();
                for ctx in &ordered {
                    let m = self
                        .multipliers
                        .multiplier(&ctx.context_type, ctx.polarity, category);
                    if m != 1.0 {
                        adjustment *= m;
                        contributing.push(ctx.context_type.clone());
                    }
                }

                CategoryScore {
                    category,
                    raw_density,
                    hit_count,
                    active_contexts: contributing,
                    context_adjustment: adjustment,
                    adjusted_score: raw_density * adjustment,
                    source_unit: None,
                }
            })
            .collect()
    }

    /// Document-level score per category, canonical order
    pub fn aggregate(&self, units: &[UnitScore]) -> Vec<CategoryScore> {
        let mut ordered: Vec<&UnitScore> = units.iter().collect();
        ordered.sort_by_key(|u| u.unit_index);

        Category::ALL
            .iter()
            .map(|&category| {
                let entries: Vec<(&UnitScore, &CategoryScore)> = ordered
                    .iter()
                    .filter_map(|u| u.score(category).map(|s| (*u, s)))
                    .collect();
                if entries.is_empty() {
                    return empty_score(category);
                }
                match self.policy {
                    AggregationPolicy::Max => max_score(&entries),
                    AggregationPolicy::WeightedMean => weighted_mean_score(category, &entries),
                    AggregationPolicy::Percentile { percentile } => {
                        percentile_score(category, &entries, percentile)
                    }
                }
            })
            .collect()
    }
}

fn empty_score(category: Category) -> CategoryScore {
    CategoryScore {
        category,
        raw_density: 0.0,
        hit_count: 0,
        active_contexts: Vec::new(),
        context_adjustment: 1.0,
        adjusted_score: 0.0,
        source_unit: None,
    }
}

fn max_score(entries: &[(&UnitScore, &CategoryScore)]) -> CategoryScore {
    let mut best = entries[0];
    for &entry in &entries[1..] {
        if entry.1.adjusted_score > best.1.adjusted_score {
            best = entry;
        }
    }
    CategoryScore {
        source_unit: Some(best.0.unit_index),
        ..best.1.clone()
    }
}

fn weighted_mean_score(
    category: Category,
    entries: &[(&UnitScore, &CategoryScore)],
) -> CategoryScore {
    let total_tokens: usize = entries.iter().map(|(u, _)| u.token_count).sum();
    let weight = |u: &UnitScore| {
        if total_tokens == 0 {
            1.0
        } else {
            u.token_count as f64
        }
    };
    let denom: f64 = entries.iter().map(|&(u, _)| weight(u)).sum();

    let raw = entries.iter().map(|&(u, s)| weight(u) * s.raw_density).sum::<f64>() / denom;
    let adjusted = entries
        .iter()
        .map(|&(u, s)| weight(u) * s.adjusted_score)
        .sum::<f64>()
        / denom;

    combined(category, entries, raw, adjusted)
}

fn percentile_score(
    category: Category,
    entries: &[(&UnitScore, &CategoryScore)],
    percentile: f64,
) -> CategoryScore {
    let raw = percentile_of(entries.iter().map(|(_, s)| s.raw_density).collect(), percentile);
    let adjusted = percentile_of(
        entries.iter().map(|(_, s)| s.adjusted_score).collect(),
        percentile,
    );
    combined(category, entries, raw, adjusted)
}

/// Score synthesized from several units: hits summed, contexts merged
fn combined(
    category: Category,
    entries: &[(&UnitScore, &CategoryScore)],
    raw: f64,
    adjusted: f64,
) -> CategoryScore {
    let contexts: BTreeSet<&String> = entries
        .iter()
        .flat_map(|(_, s)| s.active_contexts.iter())
        .collect();
    CategoryScore {
        category,
        raw_density: raw,
        hit_count: entries.iter().map(|(_, s)| s.hit_count).sum(),
        active_contexts: contexts.into_iter().cloned().collect(),
        context_adjustment: if raw > 0.0 { adjusted / raw } else { 1.0 },
        adjusted_score: adjusted,
        source_unit: None,
    }
}

/// Linear-interpolated percentile, `percentile` in [0, 100]
fn percentile_of(mut values: Vec<f64>, percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = (percentile.clamp(0.0, 100.0) / 100.0) * (values.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    values[lo] + (values[hi] - values[lo]) * frac
}
