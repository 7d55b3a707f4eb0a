//! Context template store

use crate::config::{ConfigError, ConfigResult, RatingConfig};
use crate::models::Polarity;
use std::collections::BTreeMap;
use tracing::debug;

/// Exemplars of one context type, pooled across languages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextTemplates {
    pub graphic: Vec<String>,
    pub mitigating: Vec<String>,
}

impl ContextTemplates {
    pub fn exemplars(&self, polarity: Polarity) -> &[String] {
        match polarity {
            Polarity::Graphic => &self.graphic,
            Polarity::Mitigating => &self.mitigating,
        }
    }
}

/// Read-only exemplar sets keyed by context type
#[derive(Debug, Clone, Default)]
pub struct ContextTemplateStore {
    contexts: BTreeMap<String, ContextTemplates>,
}

impl ContextTemplateStore {
    /// Build the store from a profile.
    ///
    /// Every context type must provide at least one graphic and one
    /// mitigating exemplar for every language the profile supports, so no
    /// language is classified against a lopsided template set.
    pub fn from_config(config: &RatingConfig) -> ConfigResult<Self> {
        let languages = config.languages();
        let mut contexts = BTreeMap::new();

        for (context_type, by_lang) in &config.templates {
            for language in &languages {
                let set = by_lang.get(language);
                for polarity in [Polarity::Graphic, Polarity::Mitigating] {
                    let present = set.is_some_and(|s| match polarity {
                        Polarity::Graphic => s.graphic.iter().any(|e| !e.trim().is_empty()),
                        Polarity::Mitigating => s.mitigating.iter().any(|e| !e.trim().is_empty()),
                    });
                    if !present {
                        return Err(ConfigError::MissingTemplatePolarity {
                            context_type: context_type.clone(),
                            language: language.clone(),
                            polarity,
                        });
                    }
                }
            }

            let mut pooled = ContextTemplates::default();
            for set in by_lang.values() {
                pooled
                    .graphic
                    .extend(set.graphic.iter().filter(|e| !e.trim().is_empty()).cloned());
                pooled
                    .mitigating
                    .extend(set.mitigating.iter().filter(|e| !e.trim().is_empty()).cloned());
            }
            contexts.insert(context_type.clone(), pooled);
        }

        debug!(
            "Loaded {} context types over {} languages",
            contexts.len(),
            languages.len()
        );
        Ok(Self { contexts })
    }

    pub fn templates(&self, context_type: &str) -> Option<&ContextTemplates> {
        self.contexts.get(context_type)
    }

    /// Context type names in sorted order
    pub fn context_types(&self) -> impl Iterator<Item = &str> {
        self.contexts.keys().map(String::as_str)
    }

    pub fn contains(&self, context_type: &str) -> bool {
        self.contexts.contains_key(context_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContextTemplates)> {
        self.contexts.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
