//! Shared fixtures for integration tests
#![allow(dead_code)]

use agerating::context::{EmbedError, Embedder};
use agerating::RatingConfig;
use std::time::Duration;

/// A small bilingual profile whose numbers are easy to reason about.
///
/// One hit in any 8-token window scores exactly 1/8 = 0.125, the 16+
/// violence threshold.
pub const FIXTURE_PROFILE: &str = r#"
name = "fixture"

[scanner]
window_tokens = 8

[lexicon.violence]
en = ['knife', 'stab\w*']
ru = ['нож', 'ударил\w*']

[lexicon.gore]
en = ['blood']
ru = ['кровь']

[lexicon.profanity]
en = ['damn']
ru = ['блин']

[lexicon.drugs]
en = ['vodka']
ru = ['водка']

[lexicon.child_mentions]
en = ['kid']
ru = ['малыш']

[lexicon.nudity]
en = ['naked']
ru = ['голый']

[lexicon.sexual_content]
en = ['sex']
ru = ['секс']

[exclusions.violence]
en = ['knife edge']
ru = ['на острие ножа']

[templates.stylized_action.en]
graphic = ["cartoon"]
mitigating = ["brutal"]

[templates.stylized_action.ru]
graphic = ["мультик"]
mitigating = ["жестокий"]

[multipliers.stylized_action.graphic]
violence = 0.5

[multipliers.stylized_action.mitigating]
violence = 1.5

[[thresholds]]
rating = "16+"
rules = [{ category = "violence", threshold = 0.125 }]

[[thresholds]]
rating = "12+"
rules = [
    { category = "violence", threshold = 0.05 },
    { category = "gore", threshold = 0.05 },
]
"#;

pub fn fixture_config() -> RatingConfig {
    RatingConfig::from_toml_str(FIXTURE_PROFILE).expect("fixture profile parses")
}

/// Maps translation pairs onto the same axis; every other word lands on a
/// shared neutral axis.
pub struct ConceptEmbedder;

impl ConceptEmbedder {
    fn axis(word: &str) -> usize {
        match word {
            "cartoon" | "мультик" => 0,
            "brutal" | "жестокий" => 1,
            _ => 2,
        }
    }
}

impl Embedder for ConceptEmbedder {
    fn name(&self) -> &str {
        "concept"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut v = vec![0.0f32; 3];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            v[Self::axis(&word.to_lowercase())] += 1.0;
        }
        Ok(v)
    }
}

/// Behaves like [`ConceptEmbedder`] but stalls on units mentioning "slow"
/// and fails on units mentioning "offline"
pub struct FlakyEmbedder {
    pub stall: Duration,
}

impl Embedder for FlakyEmbedder {
    fn name(&self) -> &str {
        "flaky"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.contains("slow") {
            std::thread::sleep(self.stall);
        }
        if text.contains("offline") {
            return Err(EmbedError::Backend("connection refused".into()));
        }
        ConceptEmbedder.embed(text)
    }
}
