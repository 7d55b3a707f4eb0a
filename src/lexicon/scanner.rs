//! Lexical scanner: per-category hit counts and densities for one unit

use super::{fold_text, LexiconStore};
use crate::config::ScannerConfig;
use crate::models::Category;
use std::sync::Arc;

/// Hits of one category in one unit
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryHits {
    pub category: Category,
    pub hit_count: usize,
    /// Peak hits in any `window_tokens` run of tokens, over `window_tokens`
    pub raw_density: f64,
    /// Excerpts around the first hits, from folded text
    pub evidence: Vec<String>,
}

/// Result of scanning one unit
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub token_count: usize,
    /// One entry per category, canonical order
    pub categories: Vec<CategoryHits>,
}

impl ScanResult {
    pub fn hits(&self, category: Category) -> Option<&CategoryHits> {
        self.categories.iter().find(|h| h.category == category)
    }

    pub fn density(&self, category: Category) -> f64 {
        self.hits(category).map(|h| h.raw_density).unwrap_or(0.0)
    }
}

/// Counts lexicon matches in text units
///
/// Every pattern of a category is tried against the unit regardless of
/// the language it was written for. Matches of one pattern never overlap;
/// two patterns matching the same span count twice. A hit that lies inside
/// an exclusion match of the same category is dropped.
///
/// Density is the peak hit count over any `window_tokens` consecutive
/// tokens, divided by the window width. Adding text to a unit keeps every
/// window that does not straddle the insertion point, so appending or
/// prepending text never lowers a density.
#[derive(Debug, Clone)]
pub struct LexicalScanner {
    lexicon: Arc<LexiconStore>,
    settings: ScannerConfig,
}

impl LexicalScanner {
    pub fn new(lexicon: Arc<LexiconStore>, settings: ScannerConfig) -> Self {
        Self { lexicon, settings }
    }

    pub fn scan(&self, text: &str) -> ScanResult {
        let folded = fold_text(text);
        let starts = token_starts(&folded);
        let window = self.settings.window_tokens.max(1);

        let categories = Category::ALL
            .iter()
            .map(|&category| {
                let excluded: Vec<(usize, usize)> = self
                    .lexicon
                    .exclusions(category)
                    .iter()
                    .flat_map(|p| p.regex().find_iter(&folded))
                    .map(|m| (m.start(), m.end()))
                    .collect();

                let mut hit_count = 0;
                let mut per_token = vec![0usize; starts.len().max(1)];
                let mut evidence = Vec::new();
                for pattern in self.lexicon.lookup(category) {
                    for m in pattern.regex().find_iter(&folded) {
                        let inside_idiom = excluded
                            .iter()
                            .any(|&(s, e)| s <= m.start() && m.end() <= e);
                        if inside_idiom {
                            continue;
                        }
                        hit_count += 1;
                        // A hit belongs to the token it starts in
                        let token = starts
                            .partition_point(|&s| s <= m.start())
                            .saturating_sub(1);
                        per_token[token] += 1;
                        if evidence.len() < self.settings.max_evidence {
                            evidence.push(excerpt(
                                &folded,
                                m.start(),
                                m.end(),
                                self.settings.excerpt_radius,
                            ));
                        }
                    }
                }

                CategoryHits {
                    category,
                    hit_count,
                    raw_density: peak_window_hits(&per_token, window) as f64 / window as f64,
                    evidence,
                }
            })
            .collect();

        ScanResult {
            token_count: starts.len(),
            categories,
        }
    }
}

/// Byte offset of every token start, tokens as in [`super::tokenize`]
fn token_starts(text: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut in_token = false;
    for (i, c) in text.char_indices() {
        if c.is_alphanumeric() {
            if !in_token {
                starts.push(i);
            }
            in_token = true;
        } else {
            in_token = false;
        }
    }
    starts
}

/// Largest hit count in any `window` consecutive tokens
fn peak_window_hits(per_token: &[usize], window: usize) -> usize {
    if per_token.len() <= window {
        return per_token.iter().sum();
    }
    let mut current: usize = per_token[..window].iter().sum();
    let mut peak = current;
    for i in window..per_token.len() {
        current = current + per_token[i] - per_token[i - window];
        peak = peak.max(current);
    }
    peak
}

/// Text around a match, `radius` chars on each side, whitespace collapsed
fn excerpt(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .nth(radius.saturating_sub(1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let from = if radius == 0 { start } else { from };
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map(|(i, _)| end + i)
        .unwrap_or(text.len());

    text[from..to].split_whitespace().collect::<Vec<_>>().join(" ")
}
