//! Semantic context classification
//!
//! Lexical hits say *what* is on the page; context types say *how* it is
//! presented. Each context type has two exemplar sets per language, a
//! graphic pole and a mitigating pole. A unit's polarity score for a
//! context is its best similarity to the graphic pole minus its best
//! similarity to the mitigating pole.
//!
//! The embedding backend is an opaque [`Embedder`]. The classifier never
//! fails a unit: a backend error or timeout degrades that unit to "no
//! active context" and is reported as a warning by the engine.

mod classifier;
mod embedding;
mod templates;

pub use classifier::{ContextScores, SemanticContextClassifier};
pub use embedding::{
    cosine_similarity, Embedder, EmbeddingCache, EmbeddingPool, HashingEmbedder, OllamaEmbedder,
    DEFAULT_HASHING_DIM,
};
pub use templates::{ContextTemplateStore, ContextTemplates};

use thiserror::Error;

/// Errors from an embedding backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbedError {
    #[error("Embedding timed out after {after_ms} ms")]
    Timeout { after_ms: u128 },

    #[error("Embedding backend error: {0}")]
    Backend(String),

    #[error("Embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Embedding backend returned an empty vector")]
    Empty,
}

pub type EmbedResult<T> = Result<T, EmbedError>;
