//! agerating - age-rating engine for screenplays
//!
//! Scores each text unit of a document for seven content categories,
//! adjusts the scores by the semantic context the unit is presented in,
//! and maps the aggregated scores to a tier through a configurable
//! threshold table.
//!
//! # Example
//!
//! ```rust,no_run
//! use agerating::config::RatingConfig;
//! use agerating::context::HashingEmbedder;
//! use agerating::engine::RatingEngine;
//! use agerating::models::{Document, TextUnit};
//! use std::sync::Arc;
//!
//! let config = RatingConfig::builtin()?;
//! let engine = RatingEngine::new(&config, Arc::new(HashingEmbedder::default()))?;
//! let doc = Document::new("scene-1", vec![TextUnit::new(0, "He pulled out a knife.")]);
//! let decision = engine.analyze(&doc)?;
//! println!("{} ({})", decision.rating, decision.rationale);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod context;
pub mod engine;
pub mod lexicon;
pub mod models;
pub mod rating;
pub mod reporters;
pub mod scoring;

pub use config::RatingConfig;
pub use engine::{EngineError, RatingEngine};
pub use models::{Category, Document, Rating, RatingDecision, TextUnit};
