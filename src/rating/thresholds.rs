use crate::config::{ConfigError, ConfigResult, RatingConfig, ThresholdRule};
use crate::models::{Category, Rating};
use std::collections::{BTreeMap, BTreeSet};

/// Validated threshold rules per tier
///
/// 0+ is the fallback tier and never carries rules. For every category, a
/// higher tier never requires a lower score than a lower tier, which makes
/// the rating monotonic in every category score.
#[derive(Debug, Clone, Default)]
pub struct ThresholdTable {
    tiers: BTreeMap<Rating, Vec<ThresholdRule>>,
}

impl ThresholdTable {
    pub fn from_config(config: &RatingConfig) -> ConfigResult<Self> {
        let mut tiers: BTreeMap<Rating, Vec<ThresholdRule>> = BTreeMap::new();

        for tier in &config.thresholds {
            if tier.rating == Rating::ZeroPlus && !tier.rules.is_empty() {
                return Err(ConfigError::FallbackTierRules);
            }
            if tiers.contains_key(&tier.rating) {
                return Err(ConfigError::DuplicateTier(tier.rating));
            }

            let mut seen = BTreeSet::new();
            for rule in &tier.rules {
                if !seen.insert(rule.category) {
                    return Err(ConfigError::DuplicateRule {
                        rating: tier.rating,
                        category: rule.category,
                    });
                }
                if !rule.threshold.is_finite() || rule.threshold < 0.0 {
                    return Err(ConfigError::InvalidThreshold {
                        rating: tier.rating,
                        category: rule.category,
                        value: rule.threshold,
                    });
                }
            }
            tiers.insert(tier.rating, tier.rules.clone());
        }

        let table = Self { tiers };
        table.check_monotonic()?;
        Ok(table)
    }

    fn check_monotonic(&self) -> ConfigResult<()> {
        for category in Category::ALL {
            // BTreeMap iterates tiers in ascending order
            let mut lower: Option<(Rating, f64)> = None;
            for (&rating, rules) in &self.tiers {
                let Some(rule) = rules.iter().find(|r| r.category == category) else {
                    continue;
                };
                if let Some((lower_rating, lower_threshold)) = lower {
                    if rule.threshold < lower_threshold {
                        return Err(ConfigError::NonMonotonicThresholds {
                            category,
                            lower: lower_rating,
                            lower_threshold,
                            higher: rating,
                            higher_threshold: rule.threshold,
                        });
                    }
                }
                lower = Some((rating, rule.threshold));
            }
        }
        Ok(())
    }

    /// Rules of a tier in profile order
    pub fn rules(&self, rating: Rating) -> &[ThresholdRule] {
        self.tiers.get(&rating).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Threshold for a category at a tier, if the tier has a rule for it
    pub fn threshold(&self, rating: Rating, category: Category) -> Option<f64> {
        self.rules(rating)
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.threshold)
    }
}
