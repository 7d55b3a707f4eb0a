//! Profile problems must stop engine construction

mod common;

use agerating::config::{load_rating_config, ConfigError, RatingConfig, ThresholdRule};
use agerating::engine::{EngineError, RatingEngine};
use agerating::models::{Category, Rating};
use common::{fixture_config, ConceptEmbedder};
use std::sync::Arc;

fn build(config: &RatingConfig) -> Result<RatingEngine, EngineError> {
    RatingEngine::new(config, Arc::new(ConceptEmbedder))
}

fn config_error(config: &RatingConfig) -> ConfigError {
    match build(config) {
        Err(EngineError::Config(e)) => e,
        Err(other) => panic!("expected a config error, got {}", other),
        Ok(_) => panic!("expected engine construction to fail"),
    }
}

#[test]
fn test_fixture_builds() {
    assert!(build(&fixture_config()).is_ok());
}

#[test]
fn test_non_monotonic_thresholds() {
    let mut config = fixture_config();
    let twelve = config
        .thresholds
        .iter_mut()
        .find(|t| t.rating == Rating::TwelvePlus)
        .expect("12+ tier");
    twelve.rules[0] = ThresholdRule {
        category: Category::Violence,
        threshold: 0.3,
    };

    match config_error(&config) {
        ConfigError::NonMonotonicThresholds {
            category,
            lower,
            higher,
            ..
        } => {
            assert_eq!(category, Category::Violence);
            assert_eq!(lower, Rating::TwelvePlus);
            assert_eq!(higher, Rating::SixteenPlus);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_empty_category() {
    let mut config = fixture_config();
    config.lexicon.remove("nudity");
    assert!(matches!(
        config_error(&config),
        ConfigError::EmptyCategory(Category::Nudity)
    ));
}

#[test]
fn test_malformed_pattern() {
    let mut config = fixture_config();
    config
        .lexicon
        .get_mut("drugs")
        .and_then(|by_lang| by_lang.get_mut("en"))
        .expect("drugs/en")
        .push("vod(ka".to_string());

    match config_error(&config) {
        ConfigError::MalformedPattern {
            category, language, ..
        } => {
            assert_eq!(category, Category::Drugs);
            assert_eq!(language, "en");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_missing_template_polarity() {
    let mut config = fixture_config();
    config
        .templates
        .get_mut("stylized_action")
        .and_then(|by_lang| by_lang.get_mut("ru"))
        .expect("stylized_action/ru")
        .mitigating
        .clear();

    assert!(matches!(
        config_error(&config),
        ConfigError::MissingTemplatePolarity { .. }
    ));
}

#[test]
fn test_unknown_context_type_in_multipliers() {
    let mut config = fixture_config();
    let entry = config
        .multipliers
        .get("stylized_action")
        .cloned()
        .expect("stylized_action multipliers");
    config.multipliers.insert("dream_sequence".to_string(), entry);

    match config_error(&config) {
        ConfigError::UnknownContextType(name) => assert_eq!(name, "dream_sequence"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_unknown_category_in_lexicon() {
    let mut config = fixture_config();
    let patterns = config.lexicon["gore"].clone();
    config.lexicon.insert("weapons".to_string(), patterns);
    assert!(matches!(
        config_error(&config),
        ConfigError::UnknownCategory { .. }
    ));
}

#[test]
fn test_duplicate_tier() {
    let mut config = fixture_config();
    let sixteen = config.thresholds[0].clone();
    config.thresholds.push(sixteen);
    assert!(matches!(
        config_error(&config),
        ConfigError::DuplicateTier(Rating::SixteenPlus)
    ));
}

#[test]
fn test_load_profile_from_json_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("profile.json");
    let json = serde_json::to_string(&fixture_config()).expect("serialize profile");
    std::fs::write(&path, json).expect("write profile");

    let loaded = load_rating_config(&path).expect("json profile loads");
    assert_eq!(loaded.fingerprint(), fixture_config().fingerprint());
}

#[test]
fn test_load_profile_rejects_unknown_extension() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("profile.yaml");
    std::fs::write(&path, "name: x").expect("write profile");
    assert!(matches!(
        load_rating_config(&path),
        Err(ConfigError::UnsupportedFormat(_))
    ));
}
