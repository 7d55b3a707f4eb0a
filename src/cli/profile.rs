//! `agerating profile`

use agerating::config::RatingConfig;
use agerating::engine::validate_profile;
use agerating::models::{Category, Rating};
use anyhow::{Context, Result};
use console::style;

pub(super) fn run(config: &RatingConfig, dump: bool) -> Result<()> {
    validate_profile(config).context("Profile is invalid")?;

    if dump {
        print!("{}", toml::to_string_pretty(config)?);
        return Ok(());
    }

    println!("\n{}", style(format!("Profile: {}", config.display_name())).bold());
    println!("{}", style("──────────────────────────────────────").dim());
    println!("Fingerprint: {}", style(config.fingerprint()).dim());
    println!(
        "Languages:   {}",
        config.languages().into_iter().collect::<Vec<_>>().join(", ")
    );
    println!("Aggregation: {:?}", config.aggregation);
    println!(
        "Activation:  |polarity| > {}",
        config.classifier.activation_threshold
    );
    println!(
        "Contexts:    {}",
        config.templates.keys().cloned().collect::<Vec<_>>().join(", ")
    );

    println!("\n{}", style("THRESHOLDS").bold());
    let mut header = format!("  {:<16}", "CATEGORY");
    let tiers = [
        Rating::SixPlus,
        Rating::TwelvePlus,
        Rating::SixteenPlus,
        Rating::EighteenPlus,
    ];
    for tier in tiers {
        header.push_str(&format!("{:>8}", tier.as_str()));
    }
    println!("{}", style(header).dim());

    for category in Category::ALL {
        let mut row = format!("  {:<16}", category.as_str());
        for tier in tiers {
            let cell = config
                .thresholds
                .iter()
                .find(|t| t.rating == tier)
                .and_then(|t| t.rules.iter().find(|r| r.category == category))
                .map(|r| format!("{:.3}", r.threshold))
                .unwrap_or_else(|| "-".to_string());
            row.push_str(&format!("{:>8}", cell));
        }
        let patterns: usize = config
            .lexicon
            .get(category.as_str())
            .map(|by_lang| by_lang.values().map(Vec::len).sum())
            .unwrap_or(0);
        println!("{}  {}", row, style(format!("{} patterns", patterns)).dim());
    }
    println!();
    Ok(())
}
