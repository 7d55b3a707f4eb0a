//! Semantic context classifier

use super::embedding::{cosine_similarity, EmbeddingCache, EmbeddingPool};
use super::{ContextTemplateStore, EmbedError, EmbedResult};
use crate::models::{ActiveContext, Polarity};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Context type -> polarity score in [-1, 1]
pub type ContextScores = BTreeMap<String, f64>;

struct EmbeddedTemplates {
    graphic: Vec<Arc<Vec<f32>>>,
    mitigating: Vec<Arc<Vec<f32>>>,
}

/// Scores text units against every context type
///
/// Exemplars are embedded once at construction. A failure there is
/// returned to the caller; failures while classifying a unit are returned
/// per call so the engine can degrade that unit alone.
pub struct SemanticContextClassifier {
    pool: EmbeddingPool,
    templates: BTreeMap<String, EmbeddedTemplates>,
    cache: EmbeddingCache,
    activation_threshold: f64,
    dim: Option<usize>,
}

impl SemanticContextClassifier {
    pub fn new(
        store: &ContextTemplateStore,
        pool: EmbeddingPool,
        activation_threshold: f64,
        timeout: Option<Duration>,
    ) -> EmbedResult<Self> {
        let cache = EmbeddingCache::new();
        let mut dim = None;
        let mut templates = BTreeMap::new();

        for (context_type, exemplars) in store.iter() {
            let mut embed_all = |texts: &[String]| -> EmbedResult<Vec<Arc<Vec<f32>>>> {
                texts
                    .iter()
                    .map(|text| {
                        let vector = cache.get_or_embed(&pool, text, timeout)?;
                        check_dim(&mut dim, vector.len())?;
                        Ok(vector)
                    })
                    .collect()
            };
            let graphic = embed_all(&exemplars.graphic)?;
            let mitigating = embed_all(&exemplars.mitigating)?;
            templates.insert(
                context_type.to_string(),
                EmbeddedTemplates {
                    graphic,
                    mitigating,
                },
            );
        }

        debug!(
            "Embedded {} exemplars for {} context types with '{}'",
            cache.len(),
            templates.len(),
            pool.embedder_name()
        );

        Ok(Self {
            pool,
            templates,
            cache,
            activation_threshold,
            dim,
        })
    }

    pub fn embedder_name(&self) -> &str {
        self.pool.embedder_name()
    }

    /// Replace the embedding pool with one of `workers` threads
    pub fn set_workers(&mut self, workers: usize) -> EmbedResult<()> {
        if workers != self.pool.workers() {
            self.pool = EmbeddingPool::new(self.pool.embedder(), workers)?;
        }
        Ok(())
    }

    /// Number of distinct exemplar texts embedded
    pub fn exemplar_count(&self) -> usize {
        self.cache.len()
    }

    /// Polarity score of every context type for one unit
    pub fn classify(&self, text: &str, timeout: Option<Duration>) -> EmbedResult<ContextScores> {
        let unit = self.pool.embed(text, timeout)?;
        if let Some(expected) = self.dim {
            if unit.len() != expected {
                return Err(EmbedError::DimensionMismatch {
                    expected,
                    actual: unit.len(),
                });
            }
        }

        Ok(self
            .templates
            .iter()
            .map(|(context_type, t)| {
                let graphic = best_similarity(&unit, &t.graphic);
                let mitigating = best_similarity(&unit, &t.mitigating);
                (context_type.clone(), (graphic - mitigating).clamp(-1.0, 1.0))
            })
            .collect())
    }

    /// Contexts whose |score| exceeds the activation threshold, sorted by name
    pub fn active_contexts(&self, scores: &ContextScores) -> Vec<ActiveContext> {
        scores
            .iter()
            .filter(|(_, score)| score.abs() > self.activation_threshold)
            .map(|(context_type, &score)| ActiveContext {
                context_type: context_type.clone(),
                polarity: if score > 0.0 {
                    Polarity::Graphic
                } else {
                    Polarity::Mitigating
                },
                polarity_score: score,
            })
            .collect()
    }
}

fn check_dim(dim: &mut Option<usize>, actual: usize) -> EmbedResult<()> {
    if actual == 0 {
        return Err(EmbedError::Empty);
    }
    match *dim {
        Some(expected) if expected != actual => {
            Err(EmbedError::DimensionMismatch { expected, actual })
        }
        Some(_) => Ok(()),
        None => {
            *dim = Some(actual);
            Ok(())
        }
    }
}

fn best_similarity(unit: &[f32], exemplars: &[Arc<Vec<f32>>]) -> f64 {
    exemplars
        .iter()
        .map(|e| cosine_similarity(unit, e))
        .fold(f64::NEG_INFINITY, f64::max)
        .max(-1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{RatingConfig, TemplateSet};
    use crate::context::{Embedder, HashingEmbedder};

    /// Maps a few words onto fixed axes
    struct AxisEmbedder;

    impl Embedder for AxisEmbedder {
        fn name(&self) -> &str {
            "axis"
        }

        fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
            let mut v = vec![0.0f32; 3];
            for word in text.split_whitespace() {
                match word {
                    "cartoon" => v[0] += 1.0,
                    "brutal" => v[1] += 1.0,
                    "fail" => return Err(EmbedError::Backend("boom".into())),
                    "wide" => return Ok(vec![1.0; 5]),
                    _ => v[2] += 1.0,
                }
            }
            Ok(v)
        }
    }

    fn axis_pool() -> EmbeddingPool {
        EmbeddingPool::new(Arc::new(AxisEmbedder), 1).expect("pool")
    }

    fn store() -> ContextTemplateStore {
        let mut config = RatingConfig::default();
        let mut by_lang = BTreeMap::new();
        by_lang.insert(
            "en".to_string(),
            TemplateSet {
                graphic: vec!["cartoon".into()],
                mitigating: vec!["brutal".into()],
            },
        );
        config.templates.insert("stylized_action".into(), by_lang);
        ContextTemplateStore::from_config(&config).expect("templates")
    }

    #[test]
    fn test_polarity_scores() {
        let classifier = SemanticContextClassifier::new(&store(), axis_pool(), 0.1, None)
        .expect("classifier");

        let scores = classifier.classify("cartoon", None).expect("classify");
        assert!((scores["stylized_action"] - 1.0).abs() < 1e-9);

        let scores = classifier.classify("brutal", None).expect("classify");
        assert!((scores["stylized_action"] + 1.0).abs() < 1e-9);

        let scores = classifier.classify("other words", None).expect("classify");
        assert!(scores["stylized_action"].abs() < 1e-9);
        assert!(classifier.active_contexts(&scores).is_empty());
    }

    #[test]
    fn test_active_contexts_use_strict_threshold() {
        let classifier = SemanticContextClassifier::new(&store(), axis_pool(), 0.5, None)
        .expect("classifier");

        let mut scores = ContextScores::new();
        scores.insert("a".into(), 0.5);
        scores.insert("b".into(), -0.7);
        scores.insert("c".into(), 0.9);
        let active = classifier.active_contexts(&scores);
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].context_type, "b");
        assert_eq!(active[0].polarity, Polarity::Mitigating);
        assert_eq!(active[1].context_type, "c");
        assert_eq!(active[1].polarity, Polarity::Graphic);
    }

    #[test]
    fn test_backend_errors_are_returned() {
        let classifier = SemanticContextClassifier::new(&store(), axis_pool(), 0.1, None)
        .expect("classifier");
        assert!(matches!(
            classifier.classify("fail", None),
            Err(EmbedError::Backend(_))
        ));
        assert!(matches!(
            classifier.classify("wide", None),
            Err(EmbedError::DimensionMismatch {
                expected: 3,
                actual: 5
            })
        ));
    }

    #[test]
    fn test_exemplar_failure_is_fatal() {
        let mut config = RatingConfig::default();
        let mut by_lang = BTreeMap::new();
        by_lang.insert(
            "en".to_string(),
            TemplateSet {
                graphic: vec!["fail".into()],
                mitigating: vec!["brutal".into()],
            },
        );
        config.templates.insert("broken".into(), by_lang);
        let store = ContextTemplateStore::from_config(&config).expect("templates");
        assert!(SemanticContextClassifier::new(&store, axis_pool(), 0.1, None).is_err());
    }

    #[test]
    fn test_builtin_stylized_action_with_hashing() {
        let config = RatingConfig::builtin().expect("builtin profile");
        let store = ContextTemplateStore::from_config(&config).expect("templates");
        let classifier = SemanticContextClassifier::new(
            &store,
            EmbeddingPool::new(Arc::new(HashingEmbedder::default()), 1).expect("pool"),
            config.classifier.activation_threshold,
            None,
        )
        .expect("classifier");

        let scores = classifier
            .classify("The hero punches the villain in a comic-book battle", None)
            .expect("classify");
        let active = classifier.active_contexts(&scores);
        let stylized = active
            .iter()
            .find(|c| c.context_type == "stylized_action")
            .expect("stylized_action active");
        assert_eq!(stylized.polarity, Polarity::Graphic);
    }
}
