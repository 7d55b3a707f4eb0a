//! `agerating analyze`

use super::segment::split_scenes;
use agerating::config::RatingConfig;
use agerating::context::{Embedder, HashingEmbedder, OllamaEmbedder};
use agerating::engine::RatingEngine;
use agerating::models::{Rating, RatingDecision};
use agerating::reporters::{self, OutputFormat};
use anyhow::{bail, Context, Result};
use console::style;
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Extensions picked up when walking a directory
const SCRIPT_EXTENSIONS: &[&str] = &["txt", "fountain"];

#[derive(Debug)]
pub(super) enum EmbedderChoice {
    Hashing,
    Ollama { url: String, model: String },
}

impl EmbedderChoice {
    pub(super) fn parse(name: &str, url: String, model: String) -> Result<Self> {
        match name {
            "hashing" => Ok(Self::Hashing),
            "ollama" => Ok(Self::Ollama { url, model }),
            other => bail!("Unknown embedder '{}'. Valid embedders: hashing, ollama", other),
        }
    }

    /// HTTP requests share the engine's embedding deadline
    fn build(&self, timeout: Option<Duration>) -> Arc<dyn Embedder> {
        match self {
            Self::Hashing => Arc::new(HashingEmbedder::default()),
            Self::Ollama { url, model } => Arc::new(OllamaEmbedder::with_request_timeout(
                url.clone(),
                model.clone(),
                timeout,
            )),
        }
    }
}

pub(super) struct AnalyzeOptions {
    pub config: RatingConfig,
    pub paths: Vec<PathBuf>,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub embedder: EmbedderChoice,
    pub embed_timeout_ms: u64,
    pub workers: usize,
    pub fail_on: Option<Rating>,
}

pub(super) fn run(options: AnalyzeOptions) -> Result<()> {
    let files = collect_scripts(&options.paths)?;
    if files.is_empty() {
        bail!("No scripts found (looked for .txt and .fountain files)");
    }
    info!("Rating {} script(s)", files.len());

    let timeout = (options.embed_timeout_ms > 0)
        .then(|| Duration::from_millis(options.embed_timeout_ms));
    let engine = RatingEngine::new(&options.config, options.embedder.build(timeout))
        .context("Failed to initialize rating engine")?
        .with_workers(options.workers)
        .context("Failed to start worker threads")?
        .with_embed_timeout(timeout);
    debug!("Using {} worker thread(s)", engine.workers());

    let bar = if files.len() > 1 {
        let bar = ProgressBar::new(files.len() as u64);
        bar.set_style(create_bar_style());
        Some(bar)
    } else {
        None
    };

    let mut decisions: Vec<RatingDecision> = Vec::with_capacity(files.len());
    for path in &files {
        if let Some(ref bar) = bar {
            bar.set_message(path.display().to_string());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let document = split_scenes(&path.display().to_string(), &text);
        debug!("{}: {} unit(s)", path.display(), document.units.len());
        decisions.push(engine.analyze(&document)?);
        if let Some(ref bar) = bar {
            bar.inc(1);
        }
    }
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let rendered = reporters::report(&decisions, options.format)?;
    match &options.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}Wrote {} decision(s) to {}",
                style("✓ ").green(),
                style(decisions.len()).cyan(),
                path.display()
            );
        }
        None => print!("{}", rendered),
    }

    check_fail_threshold(options.fail_on, &decisions);
    Ok(())
}

/// Exit with code 1 if any decision is at or above `fail_on`
fn check_fail_threshold(fail_on: Option<Rating>, decisions: &[RatingDecision]) {
    let Some(threshold) = fail_on else {
        return;
    };
    if let Some(worst) = decisions.iter().map(|d| d.rating).max() {
        if worst >= threshold {
            eprintln!("Failing due to --fail-on={} (highest rating {})", threshold, worst);
            std::process::exit(1);
        }
    }
}

/// Files are taken as given; directories are walked respecting .gitignore
fn collect_scripts(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            files.extend(walk_dir(path));
        } else {
            bail!("No such file or directory: {}", path.display());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk_dir(root: &Path) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .add_custom_ignore_filename(".ageratingignore");

    builder
        .build()
        .flatten()
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .map(|e| SCRIPT_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect()
}

fn create_bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .expect("valid template")
        .progress_chars("█▓▒░  ")
}
