//! Core data models for agerating
//!
//! These models are shared by the scanner, the classifier, the aggregator
//! and the decision engine, and make up the structured record handed to
//! reporters.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Content dimensions being scored
///
/// The set is fixed. Declaration order is the canonical reporting order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Violence,
    Gore,
    Profanity,
    Drugs,
    ChildMentions,
    Nudity,
    SexualContent,
}

impl Category {
    /// All categories in canonical order
    pub const ALL: [Category; 7] = [
        Category::Violence,
        Category::Gore,
        Category::Profanity,
        Category::Drugs,
        Category::ChildMentions,
        Category::Nudity,
        Category::SexualContent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Violence => "violence",
            Category::Gore => "gore",
            Category::Profanity => "profanity",
            Category::Drugs => "drugs",
            Category::ChildMentions => "child_mentions",
            Category::Nudity => "nudity",
            Category::SexualContent => "sexual_content",
        }
    }

    /// Human-readable reason used in rationales
    pub fn reason(&self) -> &'static str {
        match self {
            Category::Violence => "violence, threats and killing",
            Category::Gore => "depiction of blood and bodily injury",
            Category::Profanity => "strong language",
            Category::Drugs => "use of alcohol, tobacco or drugs",
            Category::ChildMentions => "minors in dangerous or harmful situations",
            Category::Nudity => "nudity",
            Category::SexualContent => "sexual content",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase().replace('-', "_");
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Age rating tiers, totally ordered
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Rating {
    #[default]
    #[serde(rename = "0+")]
    ZeroPlus,
    #[serde(rename = "6+")]
    SixPlus,
    #[serde(rename = "12+")]
    TwelvePlus,
    #[serde(rename = "16+")]
    SixteenPlus,
    #[serde(rename = "18+")]
    EighteenPlus,
}

impl Rating {
    /// Tiers from highest to lowest, the order the decision engine walks
    pub const DESCENDING: [Rating; 5] = [
        Rating::EighteenPlus,
        Rating::SixteenPlus,
        Rating::TwelvePlus,
        Rating::SixPlus,
        Rating::ZeroPlus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::ZeroPlus => "0+",
            Rating::SixPlus => "6+",
            Rating::TwelvePlus => "12+",
            Rating::SixteenPlus => "16+",
            Rating::EighteenPlus => "18+",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Rating {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0+" | "0" => Ok(Rating::ZeroPlus),
            "6+" | "6" => Ok(Rating::SixPlus),
            "12+" | "12" => Ok(Rating::TwelvePlus),
            "16+" | "16" => Ok(Rating::SixteenPlus),
            "18+" | "18" => Ok(Rating::EighteenPlus),
            other => Err(format!(
                "unknown rating '{}'. Valid ratings: 0+, 6+, 12+, 16+, 18+",
                other
            )),
        }
    }
}

/// Pole of a context type
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Graphic,
    Mitigating,
}

impl std::fmt::Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Graphic => write!(f, "graphic"),
            Polarity::Mitigating => write!(f, "mitigating"),
        }
    }
}

/// A contiguous span of the source document; the atomic unit of analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextUnit {
    /// Sequence index, unique within a document
    pub index: usize,
    /// Optional heading (scene heading or chunk label)
    #[serde(default)]
    pub heading: Option<String>,
    pub text: String,
    /// Best-effort language hint. Never consulted for scoring.
    #[serde(default)]
    pub language_hint: Option<String>,
}

impl TextUnit {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            heading: None,
            text: text.into(),
            language_hint: None,
        }
    }

    pub fn with_heading(mut self, heading: impl Into<String>) -> Self {
        self.heading = Some(heading.into());
        self
    }

    pub fn with_language_hint(mut self, lang: impl Into<String>) -> Self {
        self.language_hint = Some(lang.into());
        self
    }
}

/// Input from the ingestion collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub units: Vec<TextUnit>,
}

impl Document {
    pub fn new(id: impl Into<String>, units: Vec<TextUnit>) -> Self {
        Self {
            id: id.into(),
            units,
        }
    }
}

/// A context type that was active on a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveContext {
    pub context_type: String,
    pub polarity: Polarity,
    /// Max graphic similarity minus max mitigating similarity, in [-1, 1]
    pub polarity_score: f64,
}

/// Score of one category, per unit or per document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub category: Category,
    pub raw_density: f64,
    /// Counted (non-excluded) lexical hits
    pub hit_count: usize,
    /// Contexts whose multiplier for this category differs from 1.0
    pub active_contexts: Vec<String>,
    /// Combined multiplier
    pub context_adjustment: f64,
    pub adjusted_score: f64,
    /// Unit the document-level value was taken from (max policy)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_unit: Option<usize>,
}

/// Annotation left on a unit whose semantic classification degraded
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitWarning {
    pub unit_index: usize,
    pub message: String,
}

/// Per-unit scoring result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitScore {
    pub unit_index: usize,
    pub heading: Option<String>,
    pub token_count: usize,
    /// One entry per category, canonical order
    pub categories: Vec<CategoryScore>,
    pub active_contexts: Vec<ActiveContext>,
    /// Evidence excerpts per category
    pub evidence: BTreeMap<Category, Vec<String>>,
    pub warnings: Vec<UnitWarning>,
}

impl UnitScore {
    pub fn score(&self, category: Category) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.category == category)
    }

    pub fn adjusted(&self, category: Category) -> f64 {
        self.score(category).map(|c| c.adjusted_score).unwrap_or(0.0)
    }
}

/// A threshold rule that fired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiredRule {
    pub category: Category,
    pub threshold: f64,
    pub score: f64,
    pub reason: String,
}

/// A unit ranked among the most rating-relevant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerUnit {
    pub unit_index: usize,
    pub heading: Option<String>,
    pub preview: String,
    pub weight: f64,
    pub scores: BTreeMap<Category, f64>,
}

/// The final output for one document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingDecision {
    pub document_id: String,
    pub rating: Rating,
    pub rationale: String,
    pub triggering_category: Option<Category>,
    pub triggering_threshold: Option<f64>,
    /// Every rule that fired at the selected tier, in rule order
    pub fired_rules: Vec<FiredRule>,
    pub per_category: Vec<CategoryScore>,
    pub units_analyzed: usize,
    pub warnings: Vec<UnitWarning>,
    pub evidence: BTreeMap<Category, Vec<String>>,
    pub top_units: Vec<TriggerUnit>,
    /// SHA-256 of the profile the decision was produced with
    pub profile_fingerprint: String,
}

impl RatingDecision {
    pub fn category_score(&self, category: Category) -> Option<&CategoryScore> {
        self.per_category.iter().find(|c| c.category == category)
    }
}
