//! Rating profile support
//!
//! A profile is an immutable value handed to the engine at construction.
//! Several profiles (strict, lenient, per-broadcaster) can coexist in one
//! process.
//!
//! # Profile Format
//!
//! ```toml
//! [scanner]
//! window_tokens = 8
//!
//! [lexicon.violence]
//! en = ['kill\w*', 'knife']
//! ru = ['нож(а|у|ом)?']
//!
//! [exclusions.violence]
//! en = ['kill(ing)? time']
//!
//! [templates.stylized_action.en]
//! graphic = ["the hero fights the villain in a comic-book battle"]
//! mitigating = ["a realistic brutal beating"]
//!
//! [multipliers.stylized_action.graphic]
//! violence = 0.8
//!
//! [classifier]
//! activation_threshold = 0.1
//!
//! [aggregation]
//! policy = "max"          # or "weighted_mean", or "percentile" + percentile = 80.0
//!
//! [[thresholds]]
//! rating = "16+"
//! rules = [{ category = "violence", threshold = 0.10 }]
//! ```
//!
//! Lexicon, exclusion, template and multiplier tables are keyed by
//! strings and resolved to categories during validation so that a typo is
//! reported by name.

use super::{ConfigError, ConfigResult};
use crate::models::{Category, Rating};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::debug;

const BUILTIN_PROFILE: &str = include_str!("../default_profile.toml");

/// Language -> patterns
pub type LanguagePatterns = BTreeMap<String, Vec<String>>;

/// A complete rating profile
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RatingConfig {
    /// Profile name, reported alongside decisions
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub scanner: ScannerConfig,

    /// category -> language -> patterns
    #[serde(default)]
    pub lexicon: BTreeMap<String, LanguagePatterns>,

    /// category -> language -> idiom patterns that cancel hits
    #[serde(default)]
    pub exclusions: BTreeMap<String, LanguagePatterns>,

    /// context type -> language -> exemplars
    #[serde(default)]
    pub templates: BTreeMap<String, BTreeMap<String, TemplateSet>>,

    /// context type -> pole -> category -> multiplier
    #[serde(default)]
    pub multipliers: BTreeMap<String, PolarityMultipliers>,

    #[serde(default)]
    pub classifier: ClassifierConfig,

    #[serde(default)]
    pub aggregation: AggregationPolicy,

    #[serde(default)]
    pub ranking: RankingConfig,

    /// Tier rules, any order
    #[serde(default)]
    pub thresholds: Vec<TierRules>,
}

/// Lexical scanner settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Width of the sliding token window densities are measured over.
    /// Units shorter than this count as one window of this width.
    #[serde(default = "default_window_tokens")]
    pub window_tokens: usize,

    /// Evidence excerpts kept per category
    #[serde(default = "default_max_evidence")]
    pub max_evidence: usize,

    /// Characters of context on each side of an excerpt
    #[serde(default = "default_excerpt_radius")]
    pub excerpt_radius: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            window_tokens: default_window_tokens(),
            max_evidence: default_max_evidence(),
            excerpt_radius: default_excerpt_radius(),
        }
    }
}

fn default_window_tokens() -> usize {
    8
}
fn default_max_evidence() -> usize {
    5
}
fn default_excerpt_radius() -> usize {
    50
}

/// Exemplars of both poles of a context type, for one language
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplateSet {
    #[serde(default)]
    pub graphic: Vec<String>,
    #[serde(default)]
    pub mitigating: Vec<String>,
}

/// Per-pole category multipliers of one context type
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PolarityMultipliers {
    #[serde(default)]
    pub graphic: BTreeMap<String, f64>,
    #[serde(default)]
    pub mitigating: BTreeMap<String, f64>,
}

/// Semantic classifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// A context is active when |polarity_score| exceeds this value
    #[serde(default = "default_activation_threshold")]
    pub activation_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            activation_threshold: default_activation_threshold(),
        }
    }
}

fn default_activation_threshold() -> f64 {
    0.1
}

/// How per-unit scores are reduced to one score per category
///
/// `Max` (the default) lets a single graphic scene decide the rating no
/// matter how many mild scenes surround it. It is also the only policy
/// under which adding content to a unit can never lower another unit's
/// contribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AggregationPolicy {
    #[default]
    Max,
    /// Mean of unit scores weighted by unit token count
    WeightedMean,
    /// Linear-interpolated percentile (0-100) of unit scores
    Percentile { percentile: f64 },
}

/// Trigger-unit ranking settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// category -> weight in the unit ranking sum
    #[serde(default = "default_ranking_weights")]
    pub weights: BTreeMap<String, f64>,

    #[serde(default = "default_top_units")]
    pub top_units: usize,

    /// Units whose weight does not exceed this are not reported
    #[serde(default = "default_min_weight")]
    pub min_weight: f64,

    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: default_ranking_weights(),
            top_units: default_top_units(),
            min_weight: default_min_weight(),
            preview_chars: default_preview_chars(),
        }
    }
}

fn default_ranking_weights() -> BTreeMap<String, f64> {
    [
        (Category::Violence, 0.5),
        (Category::Gore, 0.8),
        (Category::Profanity, 0.3),
        (Category::Drugs, 0.3),
        (Category::ChildMentions, 0.7),
        (Category::Nudity, 0.6),
        (Category::SexualContent, 0.9),
    ]
    .into_iter()
    .map(|(c, w)| (c.as_str().to_string(), w))
    .collect()
}
fn default_top_units() -> usize {
    5
}
fn default_min_weight() -> f64 {
    0.01
}
fn default_preview_chars() -> usize {
    300
}

/// Rules of one rating tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierRules {
    pub rating: Rating,
    #[serde(default)]
    pub rules: Vec<ThresholdRule>,
}

/// Score at or above `threshold` in `category` fires the tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ThresholdRule {
    pub category: Category,
    pub threshold: f64,
}

impl RatingConfig {
    /// The built-in English/Russian profile
    pub fn builtin() -> ConfigResult<Self> {
        Self::from_toml_str(BUILTIN_PROFILE)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        serde_json::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Display name of the profile
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed")
    }

    /// SHA-256 of the canonical JSON form of the profile
    pub fn fingerprint(&self) -> String {
        // All tables are BTreeMaps, so the serialization is canonical.
        let canonical = serde_json::to_string(self).unwrap_or_default();
        format!("{:x}", Sha256::digest(canonical.as_bytes()))
    }

    /// Every language that appears in the lexicon or the templates
    pub fn languages(&self) -> BTreeSet<String> {
        let mut langs = BTreeSet::new();
        for by_lang in self.lexicon.values() {
            langs.extend(by_lang.keys().cloned());
        }
        for by_lang in self.templates.values() {
            langs.extend(by_lang.keys().cloned());
        }
        langs
    }

    /// Ranking weight of a category (0.0 when not configured)
    pub fn ranking_weight(&self, category: Category) -> f64 {
        self.ranking
            .weights
            .get(category.as_str())
            .copied()
            .unwrap_or(0.0)
    }

    /// Check the numeric settings that are not owned by a store
    pub fn validate_settings(&self) -> ConfigResult<()> {
        if self.scanner.window_tokens == 0 {
            return Err(invalid("scanner.window_tokens", "must be at least 1"));
        }

        let activation = self.classifier.activation_threshold;
        if !activation.is_finite() || !(0.0..1.0).contains(&activation) {
            return Err(invalid(
                "classifier.activation_threshold",
                "must be within [0, 1)",
            ));
        }

        if let AggregationPolicy::Percentile { percentile } = self.aggregation {
            if !percentile.is_finite() || !(0.0..=100.0).contains(&percentile) {
                return Err(invalid("aggregation.percentile", "must be within [0, 100]"));
            }
        }

        for (name, weight) in &self.ranking.weights {
            resolve_category("ranking.weights", name)?;
            if !weight.is_finite() || *weight < 0.0 {
                return Err(invalid(
                    &format!("ranking.weights.{}", name),
                    "must be finite and non-negative",
                ));
            }
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidSetting {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Resolve a category key from a profile table
pub(crate) fn resolve_category(section: &str, name: &str) -> ConfigResult<Category> {
    name.parse::<Category>()
        .map_err(|_| ConfigError::UnknownCategory {
            section: section.to_string(),
            name: name.to_string(),
        })
}

/// Load a profile from a `.toml` or `.json` file
pub fn load_rating_config(path: &Path) -> ConfigResult<RatingConfig> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    let config = match ext.as_deref() {
        Some("toml") => RatingConfig::from_toml_str(&content)?,
        Some("json") => RatingConfig::from_json_str(&content)?,
        _ => return Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    };

    debug!(
        "Loaded rating profile '{}' from {}",
        config.display_name(),
        path.display()
    );
    Ok(config)
}

/// User-level profile location (~/.config/agerating/profile.toml)
pub fn user_profile_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("agerating").join("profile.toml"))
}

#[cfg(test)]
mod tests;
