//! Configuration module for agerating
//!
//! This module handles:
//! - Rating profiles (lexicons, context templates, multipliers, thresholds)
//! - The built-in bilingual default profile
//! - Profile loading from TOML or JSON
//!
//! Every problem found here is fatal to engine initialization. Nothing
//! degrades silently at scoring time.

mod rating_config;

pub use rating_config::{
    load_rating_config, user_profile_path, AggregationPolicy, ClassifierConfig, PolarityMultipliers,
    RankingConfig, RatingConfig, ScannerConfig, TemplateSet, ThresholdRule, TierRules,
};
pub(crate) use rating_config::resolve_category;

use crate::models::{Category, Polarity, Rating};
use std::path::PathBuf;
use thiserror::Error;

/// Errors detected while loading or validating a rating profile
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read profile {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse profile: {0}")]
    Parse(String),

    #[error("Unsupported profile format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("Unknown category '{name}' in [{section}]")]
    UnknownCategory { section: String, name: String },

    #[error("Category '{0}' has no lexicon patterns")]
    EmptyCategory(Category),

    #[error("Malformed pattern '{pattern}' for {category}/{language}: {message}")]
    MalformedPattern {
        category: Category,
        language: String,
        pattern: String,
        message: String,
    },

    #[error("Context type '{context_type}' has no {polarity} exemplar for language '{language}'")]
    MissingTemplatePolarity {
        context_type: String,
        language: String,
        polarity: Polarity,
    },

    #[error("Multiplier table references unknown context type '{0}'")]
    UnknownContextType(String),

    #[error(
        "Invalid multiplier {value} for {context_type}/{polarity}/{category}: \
         must be finite and positive"
    )]
    InvalidMultiplier {
        context_type: String,
        polarity: Polarity,
        category: Category,
        value: f64,
    },

    #[error(
        "Invalid threshold {value} for {category} at {rating}: must be finite and non-negative"
    )]
    InvalidThreshold {
        rating: Rating,
        category: Category,
        value: f64,
    },

    #[error("Tier {0} appears more than once in the threshold table")]
    DuplicateTier(Rating),

    #[error("Category {category} has more than one rule at tier {rating}")]
    DuplicateRule { rating: Rating, category: Category },

    #[error("Tier 0+ is the fallback tier and cannot carry threshold rules")]
    FallbackTierRules,

    #[error(
        "Threshold table is not monotonic for {category}: {higher} requires {higher_threshold} \
         but lower tier {lower} requires {lower_threshold}"
    )]
    NonMonotonicThresholds {
        category: Category,
        lower: Rating,
        lower_threshold: f64,
        higher: Rating,
        higher_threshold: f64,
    },

    #[error("Invalid setting {field}: {message}")]
    InvalidSetting { field: String, message: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;
