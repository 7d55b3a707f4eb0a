//! Context multiplier table

use crate::config::{resolve_category, ConfigError, ConfigResult, RatingConfig};
use crate::context::ContextTemplateStore;
use crate::models::{Category, Polarity};
use std::collections::BTreeMap;

/// context type -> pole -> category -> multiplier
///
/// Lookups that hit no entry return 1.0, so a context only touches the
/// categories it names.
#[derive(Debug, Clone, Default)]
pub struct MultiplierTable {
    entries: BTreeMap<String, BTreeMap<Polarity, BTreeMap<Category, f64>>>,
}

impl MultiplierTable {
    pub fn from_config(
        config: &RatingConfig,
        templates: &ContextTemplateStore,
    ) -> ConfigResult<Self> {
        let mut entries = BTreeMap::new();

        for (context_type, poles) in &config.multipliers {
            if !templates.contains(context_type) {
                return Err(ConfigError::UnknownContextType(context_type.clone()));
            }

            let mut by_pole = BTreeMap::new();
            for (polarity, table) in [
                (Polarity::Graphic, &poles.graphic),
                (Polarity::Mitigating, &poles.mitigating),
            ] {
                let mut resolved = BTreeMap::new();
                for (name, &value) in table {
                    let category = resolve_category("multipliers", name)?;
                    if !value.is_finite() || value <= 0.0 {
                        return Err(ConfigError::InvalidMultiplier {
                            context_type: context_type.clone(),
                            polarity,
                            category,
                            value,
                        });
                    }
                    resolved.insert(category, value);
                }
                by_pole.insert(polarity, resolved);
            }
            entries.insert(context_type.clone(), by_pole);
        }

        Ok(Self { entries })
    }

    pub fn multiplier(&self, context_type: &str, polarity: Polarity, category: Category) -> f64 {
        self.entries
            .get(context_type)
            .and_then(|poles| poles.get(&polarity))
            .and_then(|table| table.get(&category))
            .copied()
            .unwrap_or(1.0)
    }

    #[cfg(test)]
    pub(crate) fn insert(
        &mut self,
        context_type: &str,
        polarity: Polarity,
        category: Category,
        value: f64,
    ) {
        self.entries
            .entry(context_type.to_string())
            .or_default()
            .entry(polarity)
            .or_default()
            .insert(category, value);
    }
}
