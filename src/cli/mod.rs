//! CLI command definitions and handlers

mod analyze;
mod profile;
mod segment;

use agerating::config::{load_rating_config, user_profile_path, RatingConfig};
use agerating::context::OllamaEmbedder;
use agerating::models::Rating;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parse and validate workers count (0 = auto, otherwise 1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

fn parse_rating(s: &str) -> Result<Rating, String> {
    s.parse()
}

/// agerating - age ratings for screenplays
#[derive(Parser, Debug)]
#[command(name = "agerating")]
#[command(
    version,
    about = "Age-rate screenplays (0+/6+/12+/16+/18+) from lexical evidence and semantic context",
    long_about = "agerating scans each scene of a screenplay for violence, gore, profanity, \
drugs, child endangerment, nudity and sexual content, adjusts the scores by the \
context the scene is presented in, and maps the result to an age tier.\n\n\
English and Russian are supported by the built-in profile.",
    after_help = "\
Examples:
  agerating analyze script.txt                  Rate one script
  agerating analyze scripts/ --format json      JSON output for scripting
  agerating analyze script.txt --fail-on 16+    Exit code 1 if rated 16+ or higher
  agerating profile                             Show the effective profile"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(
        long,
        global = true,
        default_value = "warn",
        value_parser = ["error", "warn", "info", "debug", "trace"]
    )]
    pub log_level: String,

    /// Number of parallel workers (0 = one per CPU, up to 16; at most 64)
    #[arg(long, global = true, default_value = "0", value_parser = parse_workers)]
    pub workers: usize,

    /// Rating profile (.toml or .json); defaults to the user profile, then the built-in
    /// one
    #[arg(long, short = 'c', global = true, env = "AGERATING_PROFILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rate screenplay files or directories of .txt scripts
    Analyze {
        /// Files or directories to rate
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Output format: text, json
        #[arg(long, short = 'f', default_value = "text", value_parser = ["text", "json"])]
        format: String,

        /// Output file path (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Embedding backend
        #[arg(long, default_value = "hashing", value_parser = ["hashing", "ollama"])]
        embedder: String,

        /// Ollama server URL
        #[arg(long, env = "OLLAMA_HOST", default_value = OllamaEmbedder::DEFAULT_URL)]
        ollama_url: String,

        /// Ollama embedding model
        #[arg(long, env = "AGERATING_EMBED_MODEL", default_value = OllamaEmbedder::DEFAULT_MODEL)]
        ollama_model: String,

        /// Per-scene embedding deadline in milliseconds (0 = wait indefinitely)
        #[arg(long, default_value = "10000")]
        embed_timeout_ms: u64,

        /// Exit with code 1 if any script is rated at this tier or higher
        #[arg(long, value_parser = parse_rating)]
        fail_on: Option<Rating>,
    },

    /// Validate and print the effective rating profile
    Profile {
        /// Print the full profile as TOML
        #[arg(long)]
        dump: bool,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = resolve_profile(cli.config.as_deref())?;
    match cli.command {
        Commands::Analyze {
            paths,
            format,
            output,
            embedder,
            ollama_url,
            ollama_model,
            embed_timeout_ms,
            fail_on,
        } => analyze::run(analyze::AnalyzeOptions {
            config,
            paths,
            format: format.parse()?,
            output,
            embedder: analyze::EmbedderChoice::parse(&embedder, ollama_url, ollama_model)?,
            embed_timeout_ms,
            workers: cli.workers,
            fail_on,
        }),
        Commands::Profile { dump } => profile::run(&config, dump),
    }
}

/// `--config` path, else the user profile if present, else the built-in profile
fn resolve_profile(explicit: Option<&Path>) -> Result<RatingConfig> {
    if let Some(path) = explicit {
        return load_rating_config(path)
            .with_context(|| format!("Failed to load profile {}", path.display()));
    }
    if let Some(user) = user_profile_path().filter(|p| p.is_file()) {
        debug!("Using user profile {}", user.display());
        return load_rating_config(&user)
            .with_context(|| format!("Failed to load user profile {}", user.display()));
    }
    Ok(RatingConfig::builtin()?)
}
