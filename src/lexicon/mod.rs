//! Lexicon store and lexical scanner
//!
//! Patterns are configuration data keyed by category and language. The
//! scanner never looks at the language: every pattern of a category is
//! run against every unit, which is what keeps English and Russian (or any
//! language added later) symmetric.
//!
//! Text and patterns are folded before matching:
//! - lowercase (text only; patterns compile case-insensitive)
//! - combining stress marks removed (`уда́р` -> `удар`)
//! - `ё` read as `е`

mod scanner;

pub use scanner::{CategoryHits, LexicalScanner, ScanResult};

use crate::config::{resolve_category, ConfigError, ConfigResult, RatingConfig};
use crate::models::Category;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Combining acute and grave accents (stress marks in Russian scripts)
const STRESS_MARKS: [char; 2] = ['\u{0301}', '\u{0300}'];

/// Fold text for matching and embedding
pub fn fold_text(text: &str) -> String {
    text.chars()
        .filter(|c| !STRESS_MARKS.contains(c))
        .flat_map(char::to_lowercase)
        .map(|c| if c == 'ё' { 'е' } else { c })
        .collect()
}

/// Fold a pattern source. Case is left alone so escapes like `\W` keep
/// their meaning; patterns compile case-insensitive instead.
pub fn fold_pattern(pattern: &str) -> String {
    pattern
        .chars()
        .filter(|c| !STRESS_MARKS.contains(c))
        .map(|c| match c {
            'ё' => 'е',
            'Ё' => 'Е',
            other => other,
        })
        .collect()
}

/// Split text into alphanumeric tokens
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
}

/// A compiled, word-boundary anchored pattern
#[derive(Debug, Clone)]
pub struct LexiconPattern {
    pub language: String,
    /// Pattern as written in the profile
    pub source: String,
    regex: Regex,
}

impl LexiconPattern {
    fn compile(category: Category, language: &str, source: &str) -> ConfigResult<Self> {
        let anchored = format!(r"(?i)\b(?:{})\b", fold_pattern(source));
        let regex = Regex::new(&anchored).map_err(|e| ConfigError::MalformedPattern {
            category,
            language: language.to_string(),
            pattern: source.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            language: language.to_string(),
            source: source.to_string(),
            regex,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

/// Read-only per-category pattern sets across all configured languages
#[derive(Debug, Clone)]
pub struct LexiconStore {
    patterns: BTreeMap<Category, Vec<LexiconPattern>>,
    exclusions: BTreeMap<Category, Vec<LexiconPattern>>,
    languages: BTreeSet<String>,
}

impl LexiconStore {
    /// Compile the lexicon and exclusion tables of a profile.
    ///
    /// Fails on unknown categories, malformed patterns, and any category
    /// left without a single pattern.
    pub fn from_config(config: &RatingConfig) -> ConfigResult<Self> {
        let mut patterns: BTreeMap<Category, Vec<LexiconPattern>> = BTreeMap::new();
        let mut exclusions: BTreeMap<Category, Vec<LexiconPattern>> = BTreeMap::new();
        let mut languages = BTreeSet::new();

        for (name, by_lang) in &config.lexicon {
            let category = resolve_category("lexicon", name)?;
            let entry = patterns.entry(category).or_default();
            for (language, sources) in by_lang {
                if !sources.is_empty() {
                    languages.insert(language.clone());
                }
                for source in sources {
                    entry.push(LexiconPattern::compile(category, language, source)?);
                }
            }
        }

        for category in Category::ALL {
            if patterns.get(&category).map_or(true, |p| p.is_empty()) {
                return Err(ConfigError::EmptyCategory(category));
            }
        }

        for (name, by_lang) in &config.exclusions {
            let category = resolve_category("exclusions", name)?;
            let entry = exclusions.entry(category).or_default();
            for (language, sources) in by_lang {
                for source in sources {
                    entry.push(LexiconPattern::compile(category, language, source)?);
                }
            }
        }

        let store = Self {
            patterns,
            exclusions,
            languages,
        };
        debug!(
            "Lexicon loaded: {} patterns, {} exclusions, languages {:?}",
            store.pattern_count(),
            store.exclusions.values().map(Vec::len).sum::<usize>(),
            store.languages
        );
        Ok(store)
    }

    /// All patterns of a category, across languages
    pub fn lookup(&self, category: Category) -> &[LexiconPattern] {
        self.patterns
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Idiom patterns that cancel hits of a category
    pub fn exclusions(&self, category: Category) -> &[LexiconPattern] {
        self.exclusions
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.values().map(Vec::len).sum()
    }
}
