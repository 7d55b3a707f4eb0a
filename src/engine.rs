//! Rating engine
//!
//! Wires the lexicon, classifier, aggregator and decision engine together
//! and runs them over a document:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      RatingEngine                       │
//! ├─────────────────────────────────────────────────────────┤
//! │  1. Scan each unit against the lexicon        (rayon)   │
//! │  2. Classify each unit's context              (rayon)   │
//! │  3. Apply context multipliers per unit                  │
//! │  4. Aggregate units per category                        │
//! │  5. Walk the threshold table                            │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! All configuration problems surface from [`RatingEngine::new`]. Once
//! built, the engine never fails a document because of the embedding
//! backend; affected units are scored without context and flagged.

use crate::config::{ConfigError, RatingConfig};
use crate::context::{
    ContextTemplateStore, EmbedError, Embedder, EmbeddingPool, SemanticContextClassifier,
};
use crate::lexicon::{LexicalScanner, LexiconStore};
use crate::models::{Category, Document, RatingDecision, TextUnit, UnitScore, UnitWarning};
use crate::rating::{RatingDecisionEngine, ThresholdTable};
use crate::scoring::{MultiplierTable, ScoreAggregator, UnitRanking};
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Default per-call embedding deadline
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// Progress callback: (unit label, completed, total)
pub type ProgressCallback = Box<dyn Fn(&str, usize, usize) + Send + Sync>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid rating profile: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to embed context exemplars: {0}")]
    Exemplars(#[source] EmbedError),

    #[error("Document '{document_id}' has more than one unit with index {index}")]
    DuplicateUnitIndex { document_id: String, index: usize },

    #[error("Failed to start embedding workers: {0}")]
    EmbeddingWorkers(#[source] EmbedError),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Validate a profile without an embedding backend
pub fn validate_profile(config: &RatingConfig) -> Result<(), ConfigError> {
    config.validate_settings()?;
    LexiconStore::from_config(config)?;
    let templates = ContextTemplateStore::from_config(config)?;
    MultiplierTable::from_config(config, &templates)?;
    UnitRanking::from_config(&config.ranking)?;
    ThresholdTable::from_config(config)?;
    Ok(())
}

pub struct RatingEngine {
    scanner: LexicalScanner,
    classifier: SemanticContextClassifier,
    aggregator: ScoreAggregator,
    ranking: UnitRanking,
    decision: RatingDecisionEngine,
    max_evidence: usize,
    fingerprint: String,
    profile_name: String,
    embed_timeout: Option<Duration>,
    workers: usize,
    pool: rayon::ThreadPool,
    progress_callback: Option<ProgressCallback>,
}

impl RatingEngine {
    /// Validate the profile, compile the lexicon and embed all exemplars
    pub fn new(config: &RatingConfig, embedder: Arc<dyn Embedder>) -> Result<Self, EngineError> {
        let start = Instant::now();
        config.validate_settings()?;

        let lexicon = Arc::new(LexiconStore::from_config(config)?);
        let templates = ContextTemplateStore::from_config(config)?;
        let multipliers = MultiplierTable::from_config(config, &templates)?;
        let ranking = UnitRanking::from_config(&config.ranking)?;
        let thresholds = ThresholdTable::from_config(config)?;

        let workers = auto_workers();
        let embed_pool =
            EmbeddingPool::new(embedder, workers).map_err(EngineError::EmbeddingWorkers)?;
        let classifier = SemanticContextClassifier::new(
            &templates,
            embed_pool,
            config.classifier.activation_threshold,
            Some(DEFAULT_EMBED_TIMEOUT),
        )
        .map_err(EngineError::Exemplars)?;

        info!(
            "Rating engine ready: profile '{}', {} patterns, {} context types, \
             {} exemplars via '{}' ({:?})",
            config.display_name(),
            lexicon.pattern_count(),
            templates.len(),
            classifier.exemplar_count(),
            classifier.embedder_name(),
            start.elapsed()
        );

        Ok(Self {
            scanner: LexicalScanner::new(lexicon, config.scanner.clone()),
            classifier,
            aggregator: ScoreAggregator::new(multipliers, config.aggregation),
            ranking,
            decision: RatingDecisionEngine::new(thresholds),
            max_evidence: config.scanner.max_evidence,
            fingerprint: config.fingerprint(),
            profile_name: config.display_name().to_string(),
            embed_timeout: Some(DEFAULT_EMBED_TIMEOUT),
            workers,
            pool: build_pool(workers)?,
            progress_callback: None,
        })
    }

    /// Per-unit embedding deadline; `None` waits indefinitely
    pub fn with_embed_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Number of worker threads (0 = auto-detect)
    ///
    /// Sizes both the unit thread pool and the embedding worker pool.
    pub fn with_workers(mut self, workers: usize) -> Result<Self, EngineError> {
        let workers = if workers == 0 { auto_workers() } else { workers };
        if workers != self.workers {
            self.classifier
                .set_workers(workers)
                .map_err(EngineError::EmbeddingWorkers)?;
            self.pool = build_pool(workers)?;
            self.workers = workers;
        }
        Ok(self)
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Score one unit. Embedding failures degrade the unit, never fail it.
    pub fn analyze_unit(&self, unit: &TextUnit) -> UnitScore {
        let scan = self.scanner.scan(&unit.text);

        let classified = self.classifier.classify(&unit.text, self.embed_timeout);
        let (active_contexts, warnings) = match classified {
            Ok(scores) => (self.classifier.active_contexts(&scores), Vec::new()),
            Err(e) => {
                warn!("Unit {} scored without semantic context: {}", unit.index, e);
                let warning = UnitWarning {
                    unit_index: unit.index,
                    message: format!("semantic context unavailable: {}", e),
                };
                (Vec::new(), vec![warning])
            }
        };

        let categories = self.aggregator.score_unit(&scan, &active_contexts);
        let evidence = scan
            .categories
            .into_iter()
            .filter(|h| !h.evidence.is_empty())
            .map(|h| (h.category, h.evidence))
            .collect();

        UnitScore {
            unit_index: unit.index,
            heading: unit.heading.clone(),
            token_count: scan.token_count,
            categories,
            active_contexts,
            evidence,
            warnings,
        }
    }

    /// Rate a document
    pub fn analyze(&self, document: &Document) -> Result<RatingDecision, EngineError> {
        let start = Instant::now();

        let mut seen = BTreeSet::new();
        for unit in &document.units {
            if !seen.insert(unit.index) {
                return Err(EngineError::DuplicateUnitIndex {
                    document_id: document.id.clone(),
                    index: unit.index,
                });
            }
        }

        let mut units: Vec<&TextUnit> = document.units.iter().collect();
        units.sort_by_key(|u| u.index);

        let completed = AtomicUsize::new(0);
        let total = units.len();
        let unit_scores: Vec<UnitScore> = self.pool.install(|| {
            units
                .par_iter()
                .map(|unit| {
                    let score = self.analyze_unit(unit);
                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(&format!("unit {}", unit.index), done, total);
                    }
                    score
                })
                .collect()
        });

        let per_category = self.aggregator.aggregate(&unit_scores);
        let tier = self.decision.decide(&per_category, unit_scores.len());

        let warnings: Vec<UnitWarning> = unit_scores
            .iter()
            .flat_map(|u| u.warnings.iter().cloned())
            .collect();

        let mut rationale = tier.rationale;
        if !warnings.is_empty() {
            rationale.push_str(&format!(
                " [{} of {} unit(s) rated without semantic context]",
                warnings.len(),
                unit_scores.len()
            ));
        }

        let mut evidence: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for score in &unit_scores {
            for (category, excerpts) in &score.evidence {
                let merged = evidence.entry(*category).or_default();
                let room = self.max_evidence.saturating_sub(merged.len());
                merged.extend(excerpts.iter().take(room).cloned());
            }
        }

        let pairs: Vec<(&TextUnit, &UnitScore)> =
            units.iter().copied().zip(unit_scores.iter()).collect();
        let top_units = self.ranking.rank(&pairs);

        debug!(
            "Document '{}': {} units in {:?}",
            document.id,
            unit_scores.len(),
            start.elapsed()
        );
        info!("Rated '{}' {} ({})", document.id, tier.rating, rationale);

        Ok(RatingDecision {
            document_id: document.id.clone(),
            rating: tier.rating,
            rationale,
            triggering_category: tier.triggering_category,
            triggering_threshold: tier.triggering_threshold,
            fired_rules: tier.fired_rules,
            per_category,
            units_analyzed: unit_scores.len(),
            warnings,
            evidence,
            top_units,
            profile_fingerprint: self.fingerprint.clone(),
        })
    }
}

fn build_pool(workers: usize) -> Result<rayon::ThreadPool, EngineError> {
    Ok(rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("rate-{}", i))
        .build()?)
}

fn auto_workers() -> usize {
    std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(4)
        .min(16)
}
