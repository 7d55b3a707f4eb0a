use super::*;

#[test]
fn test_builtin_profile_parses() {
    let config = RatingConfig::builtin().expect("builtin profile");
    assert_eq!(config.display_name(), "default");
    assert_eq!(config.lexicon.len(), Category::ALL.len());
    assert_eq!(config.aggregation, AggregationPolicy::Max);
    assert!(config.templates.contains_key("stylized_action"));
    assert!(config.templates.contains_key("kidnapping_violence"));
    config.validate_settings().expect("builtin settings valid");
}

#[test]
fn test_builtin_profile_is_bilingual() {
    let config = RatingConfig::builtin().expect("builtin profile");
    let langs = config.languages();
    assert!(langs.contains("en"));
    assert!(langs.contains("ru"));
    for (category, by_lang) in &config.lexicon {
        assert!(by_lang.contains_key("en"), "{} lacks English patterns", category);
        assert!(by_lang.contains_key("ru"), "{} lacks Russian patterns", category);
    }
}

#[test]
fn test_parse_toml_profile() {
    let toml_content = r#"
name = "strict"

[scanner]
window_tokens = 4

[lexicon.violence]
en = ['knife']

[classifier]
activation_threshold = 0.2

[aggregation]
policy = "percentile"
percentile = 80.0

[[thresholds]]
rating = "12+"
rules = [{ category = "violence", threshold = 0.05 }]
"#;

    let config = RatingConfig::from_toml_str(toml_content).expect("parse profile");
    assert_eq!(config.display_name(), "strict");
    assert_eq!(config.scanner.window_tokens, 4);
    assert_eq!(config.scanner.max_evidence, 5);
    assert!((config.classifier.activation_threshold - 0.2).abs() < 1e-9);
    assert_eq!(
        config.aggregation,
        AggregationPolicy::Percentile { percentile: 80.0 }
    );
    assert_eq!(config.thresholds.len(), 1);
    assert_eq!(config.thresholds[0].rating, Rating::TwelvePlus);
    assert_eq!(config.thresholds[0].rules[0].category, Category::Violence);
}

#[test]
fn test_parse_weighted_mean_policy() {
    let config = RatingConfig::from_toml_str("[aggregation]\npolicy = \"weighted_mean\"\n")
        .expect("parse profile");
    assert_eq!(config.aggregation, AggregationPolicy::WeightedMean);
}

#[test]
fn test_parse_error_is_reported() {
    let err = RatingConfig::from_toml_str("[scanner\nwindow_tokens = 3").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_invalid_settings() {
    let mut config = RatingConfig::default();
    config.scanner.window_tokens = 0;
    assert!(matches!(
        config.validate_settings(),
        Err(ConfigError::InvalidSetting { .. })
    ));

    let mut config = RatingConfig::default();
    config.classifier.activation_threshold = 1.5;
    assert!(config.validate_settings().is_err());

    let mut config = RatingConfig::default();
    config.aggregation = AggregationPolicy::Percentile { percentile: 140.0 };
    assert!(config.validate_settings().is_err());

    let mut config = RatingConfig::default();
    config.ranking.weights.insert("weapons".into(), 1.0);
    assert!(matches!(
        config.validate_settings(),
        Err(ConfigError::UnknownCategory { .. })
    ));
}

#[test]
fn test_fingerprint_is_stable_and_sensitive() {
    let a = RatingConfig::builtin().expect("builtin profile");
    let b = RatingConfig::builtin().expect("builtin profile");
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.fingerprint().len(), 64);

    let mut c = a.clone();
    c.classifier.activation_threshold = 0.3;
    assert_ne!(a.fingerprint(), c.fingerprint());
}

#[test]
fn test_load_from_files() {
    let dir = tempfile::tempdir().expect("temp dir");

    let toml_path = dir.path().join("profile.toml");
    std::fs::write(&toml_path, "name = \"from-toml\"\n").expect("write toml");
    let config = load_rating_config(&toml_path).expect("load toml");
    assert_eq!(config.display_name(), "from-toml");

    let json_path = dir.path().join("profile.json");
    std::fs::write(&json_path, r#"{"name": "from-json"}"#).expect("write json");
    let config = load_rating_config(&json_path).expect("load json");
    assert_eq!(config.display_name(), "from-json");

    let yaml_path = dir.path().join("profile.yaml");
    std::fs::write(&yaml_path, "name: nope\n").expect("write yaml");
    assert!(matches!(
        load_rating_config(&yaml_path),
        Err(ConfigError::UnsupportedFormat(_))
    ));

    assert!(matches!(
        load_rating_config(&dir.path().join("missing.toml")),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn test_ranking_weight_lookup() {
    let config = RatingConfig::default();
    assert!((config.ranking_weight(Category::Gore) - 0.8).abs() < 1e-9);

    let mut config = RatingConfig::default();
    config.ranking.weights.remove("gore");
    assert_eq!(config.ranking_weight(Category::Gore), 0.0);
}
