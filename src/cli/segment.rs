//! Minimal scene splitter for plain-text screenplays

use agerating::models::{Document, TextUnit};
use regex::Regex;
use std::sync::OnceLock;

/// Scenes shorter than this (trimmed chars) are dropped
const MIN_SCENE_CHARS: usize = 20;

/// With fewer scenes than this the script is rated as one unit
const MIN_SCENES: usize = 3;

fn scene_heading() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*(?:INT\./EXT\.|INT\.|EXT\.|I/E\.|ИНТ\.|НАТ\.|SCENE HEADING:)")
            .expect("valid regex")
    })
}

/// Split a script into scene units on heading markers
pub fn split_scenes(id: &str, text: &str) -> Document {
    let starts: Vec<usize> = scene_heading().find_iter(text).map(|m| m.start()).collect();

    let mut bounds = Vec::with_capacity(starts.len() + 1);
    let mut prev = 0;
    for &start in &starts {
        if start > prev {
            bounds.push((prev, start));
        }
        prev = start;
    }
    bounds.push((prev, text.len()));

    let scenes: Vec<&str> = bounds
        .iter()
        .map(|&(s, e)| text[s..e].trim())
        .filter(|scene| scene.chars().count() >= MIN_SCENE_CHARS)
        .collect();

    if scenes.len() < MIN_SCENES {
        let whole = text.trim();
        let units = if whole.is_empty() {
            Vec::new()
        } else {
            vec![TextUnit::new(0, whole)]
        };
        return Document::new(id, units);
    }

    let units = scenes
        .into_iter()
        .enumerate()
        .map(|(index, scene)| {
            let unit = TextUnit::new(index, scene);
            if scene_heading().is_match(scene) {
                let heading = scene.lines().next().unwrap_or_default().trim();
                unit.with_heading(heading)
            } else {
                unit
            }
        })
        .collect();
    Document::new(id, units)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_splits_on_headings() {
        let script = "\
INT. KITCHEN - NIGHT
Mom makes tea while the kettle whistles loudly.

EXT. STREET - DAY
A car drives past the bakery slowly and stops.

INT. BASEMENT - NIGHT
He pulled out a knife and stabbed him twice.
";
        let doc = split_scenes("script.txt", script);
        assert_eq!(doc.units.len(), 3);
        assert_eq!(doc.units[0].heading.as_deref(), Some("INT. KITCHEN - NIGHT"));
        assert_eq!(doc.units[2].index, 2);
        assert!(doc.units[2].text.contains("knife"));
    }

    #[test]
    fn test_few_scenes_become_one_unit() {
        let script = "INT. ROOM - DAY\nTwo friends talk quietly about the weather.\n";
        let doc = split_scenes("short.txt", script);
        assert_eq!(doc.units.len(), 1);
        assert!(doc.units[0].heading.is_none());
        assert!(doc.units[0].text.starts_with("INT. ROOM"));
    }

    #[test]
    fn test_short_fragments_are_dropped() {
        let script = "\
INT. A
x
INT. HALL - DAY
The guests arrive and take their coats off.
ИНТ. КУХНЯ - НОЧЬ
Мама заваривает чай, пока кипит чайник.
SCENE HEADING: ROOFTOP
The detectives watch the city lights below.
";
        let doc = split_scenes("mixed.txt", script);
        assert_eq!(doc.units.len(), 3);
        assert_eq!(doc.units[1].heading.as_deref(), Some("ИНТ. КУХНЯ - НОЧЬ"));
    }

    #[test]
    fn test_empty_script_has_no_units() {
        assert!(split_scenes("empty.txt", "  \n\t").units.is_empty());
    }
}
