//! Text (terminal) reporter with colors and formatting

use crate::models::{Rating, RatingDecision};
use anyhow::Result;

/// Rating colors (ANSI escape codes)
fn rating_color(rating: Rating) -> &'static str {
    match rating {
        Rating::ZeroPlus => "\x1b[32m",     // Green
        Rating::SixPlus => "\x1b[92m",      // Light green
        Rating::TwelvePlus => "\x1b[33m",   // Yellow
        Rating::SixteenPlus => "\x1b[91m",  // Light red
        Rating::EighteenPlus => "\x1b[31m", // Red
    }
}

/// Reset ANSI color
const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const YELLOW: &str = "\x1b[33m";

/// Render decisions as formatted terminal output
pub fn render(decisions: &[RatingDecision]) -> Result<String> {
    let mut out = String::new();
    for decision in decisions {
        render_decision(decision, &mut out);
    }
    if decisions.len() > 1 {
        out.push_str(&summary(decisions));
    }
    Ok(out)
}

fn render_decision(decision: &RatingDecision, out: &mut String) {
    let color = rating_color(decision.rating);
    out.push_str(&format!("\n{BOLD}{}{RESET}\n", decision.document_id));
    out.push_str(&format!(
        "{DIM}──────────────────────────────────────{RESET}\n"
    ));
    out.push_str(&format!(
        "Rating: {color}{BOLD}{}{RESET}  Units: {}  {DIM}profile {}{RESET}\n",
        decision.rating,
        decision.units_analyzed,
        short_fingerprint(&decision.profile_fingerprint)
    ));
    out.push_str(&format!("{DIM}{}{RESET}\n\n", decision.rationale));

    // Category table
    out.push_str(&format!("{BOLD}CATEGORIES{RESET}\n"));
    out.push_str(&format!(
        "{DIM}  CATEGORY          RAW      ×ADJ    SCORE   CONTEXTS{RESET}\n"
    ));
    for score in &decision.per_category {
        let marker = if decision.triggering_category == Some(score.category) {
            format!(" {color}◀{RESET}")
        } else {
            String::new()
        };
        let line = format!(
            "  {:<16}  {:>6.4}  {:>6.2}  {:>6.4}   {}",
            score.category.as_str(),
            score.raw_density,
            score.context_adjustment,
            score.adjusted_score,
            score.active_contexts.join(", ")
        );
        if score.adjusted_score > 0.0 {
            out.push_str(&format!("{}{}\n", line.trim_end(), marker));
        } else {
            out.push_str(&format!("{DIM}{}{RESET}\n", line.trim_end()));
        }
    }
    out.push('\n');

    if !decision.fired_rules.is_empty() {
        out.push_str(&format!("{BOLD}FIRED RULES{RESET} ({})\n", decision.rating));
        for rule in &decision.fired_rules {
            out.push_str(&format!(
                "  {} {:.4} >= {:.4}  {DIM}{}{RESET}\n",
                rule.category, rule.score, rule.threshold, rule.reason
            ));
        }
        out.push('\n');
    }

    if !decision.top_units.is_empty() {
        out.push_str(&format!("{BOLD}TOP UNITS{RESET}\n"));
        for unit in &decision.top_units {
            let heading = unit.heading.as_deref().unwrap_or("");
            out.push_str(&format!(
                "  {DIM}#{:<4}{RESET} {:<40} weight {:.3}\n",
                unit.unit_index,
                truncate(heading, 40),
                unit.weight
            ));
            out.push_str(&format!("        {DIM}{}{RESET}\n", truncate(&unit.preview, 100)));
        }
        out.push('\n');
    }

    if !decision.evidence.is_empty() {
        out.push_str(&format!("{BOLD}EVIDENCE{RESET}\n"));
        for (category, excerpts) in &decision.evidence {
            for excerpt in excerpts.iter().take(3) {
                out.push_str(&format!(
                    "  {:<16}  {DIM}\"{}\"{RESET}\n",
                    category.as_str(),
                    truncate(excerpt, 90)
                ));
            }
        }
        out.push('\n');
    }

    if !decision.warnings.is_empty() {
        out.push_str(&format!(
            "{YELLOW}{BOLD}WARNINGS{RESET} ({})\n",
            decision.warnings.len()
        ));
        for warning in &decision.warnings {
            out.push_str(&format!(
                "  {YELLOW}unit {}{RESET}: {}\n",
                warning.unit_index, warning.message
            ));
        }
        out.push('\n');
    }
}

fn summary(decisions: &[RatingDecision]) -> String {
    let highest = decisions
        .iter()
        .map(|d| d.rating)
        .max()
        .unwrap_or_default();
    format!(
        "{BOLD}SUMMARY{RESET}  {} documents, highest rating {}{BOLD}{}{RESET}\n",
        decisions.len(),
        rating_color(highest),
        highest
    )
}

fn short_fingerprint(fingerprint: &str) -> &str {
    match fingerprint.char_indices().nth(12) {
        Some((i, _)) => &fingerprint[..i],
        None => fingerprint,
    }
}

/// Truncate on char boundaries
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let cut: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut)
}
