//! CLI flag contract tests
//!
//! Verifies that `analyze` (--format, --output, --fail-on, --config) and
//! `profile` behave as documented.

use std::path::Path;
use std::process::Command;

fn agerating_bin() -> String {
    env!("CARGO_BIN_EXE_agerating").to_string()
}

const KNIFE_SCRIPT: &str = "He pulled out a knife and stabbed him twice, blood everywhere\n";
const GARDEN_SCRIPT: &str =
    "Anna waters the flowers on the balcony while the radio plays softly.\n";

fn setup_scripts() -> tempfile::TempDir {
    let dir = tempfile::Builder::new()
        .prefix("scripts")
        .tempdir()
        .unwrap();
    std::fs::write(dir.path().join("alley.txt"), KNIFE_SCRIPT).unwrap();
    std::fs::write(dir.path().join("garden.txt"), GARDEN_SCRIPT).unwrap();
    dir
}

/// Run the binary with a config home that has no user profile
fn run(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(agerating_bin())
        .args(args)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("AGERATING_PROFILE")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to run agerating");
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (output.status.code().unwrap_or(-1), stdout, stderr)
}

fn parse_decisions(json_str: &str) -> Vec<serde_json::Value> {
    let v: serde_json::Value = serde_json::from_str(json_str).expect("Invalid JSON");
    v.as_array().expect("JSON array of decisions").clone()
}

// ============================================================================
// --format json
// ============================================================================

#[test]
fn test_json_output_for_directory() {
    let dir = setup_scripts();
    let (code, stdout, _) = run(
        dir.path(),
        &["analyze", dir.path().to_str().unwrap(), "--format", "json"],
    );
    assert_eq!(code, 0);

    let decisions = parse_decisions(&stdout);
    assert_eq!(decisions.len(), 2);

    // Files are rated in sorted path order
    assert!(decisions[0]["document_id"]
        .as_str()
        .unwrap()
        .ends_with("alley.txt"));
    assert_eq!(decisions[0]["rating"], "16+");
    assert_eq!(decisions[0]["triggering_category"], "violence");
    assert_eq!(decisions[1]["rating"], "0+");
}

#[test]
fn test_text_output_names_the_rating() {
    let dir = setup_scripts();
    let script = dir.path().join("alley.txt");
    let (code, stdout, _) = run(dir.path(), &["analyze", script.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("16+"), "text report should name the rating:\n{}", stdout);
    assert!(stdout.contains("violence"));
}

// ============================================================================
// --fail-on
// ============================================================================

#[test]
fn test_fail_on_exits_nonzero_at_tier() {
    let dir = setup_scripts();
    let script = dir.path().join("alley.txt");
    let (code, _, stderr) = run(
        dir.path(),
        &["analyze", script.to_str().unwrap(), "--fail-on", "16+"],
    );
    assert_eq!(code, 1, "--fail-on 16+ should exit 1 for a 16+ script");
    assert!(stderr.contains("--fail-on=16+"));
}

#[test]
fn test_fail_on_exits_zero_below_tier() {
    let dir = setup_scripts();
    let script = dir.path().join("alley.txt");
    let (code, _, _) = run(
        dir.path(),
        &["analyze", script.to_str().unwrap(), "--fail-on", "18+"],
    );
    assert_eq!(code, 0);
}

#[test]
fn test_fail_on_rejects_unknown_tier() {
    let dir = setup_scripts();
    let (code, _, stderr) = run(
        dir.path(),
        &["analyze", dir.path().to_str().unwrap(), "--fail-on", "21+"],
    );
    assert_eq!(code, 2, "clap usage errors exit with 2");
    assert!(stderr.contains("unknown rating"));
}

// ============================================================================
// --output
// ============================================================================

#[test]
fn test_output_writes_file() {
    let dir = setup_scripts();
    let out = dir.path().join("report.json");
    let script = dir.path().join("alley.txt");
    let (code, stdout, _) = run(
        dir.path(),
        &[
            "analyze",
            script.to_str().unwrap(),
            "--format",
            "json",
            "--output",
            out.to_str().unwrap(),
        ],
    );
    assert_eq!(code, 0);
    assert!(stdout.is_empty(), "report should go to the file, not stdout");

    let written = std::fs::read_to_string(&out).unwrap();
    let decisions = parse_decisions(&written);
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0]["rating"], "16+");
}

// ============================================================================
// --config
// ============================================================================

#[test]
fn test_custom_profile_changes_rating() {
    let dir = setup_scripts();
    let profile = dir.path().join("lenient.toml");

    // Builtin profile with the 16+ and 18+ tiers removed
    let (code, dumped, _) = run(dir.path(), &["profile", "--dump"]);
    assert_eq!(code, 0);
    let mut config: toml::Value = toml::from_str(&dumped).expect("dump is valid TOML");
    let tiers = config["thresholds"].as_array_mut().unwrap();
    tiers.retain(|t| {
        let rating = t["rating"].as_str().unwrap();
        rating != "16+" && rating != "18+"
    });
    std::fs::write(&profile, toml::to_string(&config).unwrap()).unwrap();

    let script = dir.path().join("alley.txt");
    let (code, stdout, _) = run(
        dir.path(),
        &[
            "analyze",
            script.to_str().unwrap(),
            "--config",
            profile.to_str().unwrap(),
            "--format",
            "json",
        ],
    );
    assert_eq!(code, 0);
    assert_eq!(parse_decisions(&stdout)[0]["rating"], "12+");
}

#[test]
fn test_invalid_profile_fails() {
    let dir = setup_scripts();
    let profile = dir.path().join("broken.toml");
    std::fs::write(&profile, "[lexicon.violence]\nen = ['kni(fe']\n").unwrap();

    let (code, _, stderr) = run(
        dir.path(),
        &["profile", "--config", profile.to_str().unwrap()],
    );
    assert_ne!(code, 0);
    assert!(stderr.contains("Profile is invalid"), "stderr:\n{}", stderr);
}

// ============================================================================
// profile
// ============================================================================

#[test]
fn test_profile_summary() {
    let dir = setup_scripts();
    let (code, stdout, _) = run(dir.path(), &["profile"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Profile: default"));
    assert!(stdout.contains("THRESHOLDS"));
    assert!(stdout.contains("en, ru"));
}

#[test]
fn test_missing_path_fails() {
    let dir = setup_scripts();
    let missing = dir.path().join("nope.txt");
    let (code, _, _) = run(dir.path(), &["analyze", missing.to_str().unwrap()]);
    assert_ne!(code, 0);
}
