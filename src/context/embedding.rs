//! Embedding backends, the exemplar cache, and the embedding worker pool

use super::{EmbedError, EmbedResult};
use crate::lexicon::{fold_text, tokenize};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Dimensionality of [`HashingEmbedder`] vectors unless configured otherwise
pub const DEFAULT_HASHING_DIM: usize = 2048;

/// Maps text to a fixed-size vector
///
/// Implementations must be deterministic for the engine's output to be
/// reproducible, and safe to call from several threads at once.
pub trait Embedder: Send + Sync {
    /// Backend name, for logs and reports
    fn name(&self) -> &str;

    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>>;
}

type Reply = crossbeam_channel::Sender<EmbedResult<Vec<f32>>>;

struct EmbedJob {
    text: String,
    deadline: Instant,
    reply: Reply,
}

/// Fixed set of embedding threads fed through a bounded queue
///
/// Callers wait on their own reply channel with a deadline. A call that
/// times out is abandoned, but it keeps occupying one of the pool's
/// threads until the backend returns, so a stalled backend never holds
/// more than `workers` calls at once. Queued jobs whose caller already
/// gave up are skipped.
pub struct EmbeddingPool {
    embedder: Arc<dyn Embedder>,
    // Dropping the sender closes the queue; workers exit after their current call
    jobs: crossbeam_channel::Sender<EmbedJob>,
    workers: usize,
}

impl EmbeddingPool {
    pub fn new(embedder: Arc<dyn Embedder>, workers: usize) -> EmbedResult<Self> {
        let workers = workers.max(1);
        let (tx, rx) = crossbeam_channel::bounded::<EmbedJob>(workers);

        for i in 0..workers {
            let rx = rx.clone();
            let backend = Arc::clone(&embedder);
            std::thread::Builder::new()
                .name(format!("embed-{}", i))
                .spawn(move || {
                    for job in rx.iter() {
                        if Instant::now() >= job.deadline {
                            continue;
                        }
                        // Receiver may be gone after a timeout
                        let _ = job.reply.send(backend.embed(&job.text));
                    }
                })
                .map_err(|e| {
                    EmbedError::Backend(format!("failed to spawn embedding worker: {}", e))
                })?;
        }
        debug!("Started {} embedding workers for '{}'", workers, embedder.name());

        Ok(Self {
            embedder,
            jobs: tx,
            workers,
        })
    }

    pub fn embedder_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        Arc::clone(&self.embedder)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Embed `text`, giving up after `timeout`
    ///
    /// Without a timeout the backend is called on the current thread.
    pub fn embed(&self, text: &str, timeout: Option<Duration>) -> EmbedResult<Vec<f32>> {
        let Some(timeout) = timeout else {
            return self.embedder.embed(text);
        };
        let timed_out = || EmbedError::Timeout {
            after_ms: timeout.as_millis(),
        };
        let deadline = Instant::now() + timeout;

        let (reply, rx) = crossbeam_channel::bounded(1);
        let job = EmbedJob {
            text: text.to_string(),
            deadline,
            reply,
        };
        match self.jobs.send_timeout(job, timeout) {
            Ok(()) => {}
            Err(crossbeam_channel::SendTimeoutError::Timeout(_)) => return Err(timed_out()),
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => {
                return Err(EmbedError::Backend("embedding workers have exited".to_string()))
            }
        }

        match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(result) => result,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => Err(timed_out()),
            // Dropped unanswered: the job expired in the queue
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => Err(timed_out()),
        }
    }
}

/// Cosine similarity; 0.0 when either vector has zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
}

/// Thread-safe cache of embeddings keyed by exact text
#[derive(Clone, Default)]
pub struct EmbeddingCache {
    entries: Arc<DashMap<String, Arc<Vec<f32>>>>,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, text: &str) -> Option<Arc<Vec<f32>>> {
        self.entries.get(text).map(|e| Arc::clone(e.value()))
    }

    /// Return the cached vector or compute and store it
    pub fn get_or_embed(
        &self,
        pool: &EmbeddingPool,
        text: &str,
        timeout: Option<Duration>,
    ) -> EmbedResult<Arc<Vec<f32>>> {
        if let Some(hit) = self.get(text) {
            return Ok(hit);
        }
        let vector = Arc::new(pool.embed(text, timeout)?);
        self.entries.insert(text.to_string(), Arc::clone(&vector));
        Ok(vector)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const STOPWORDS_EN: &str = "a an the and or but of in on at to for with without from by as is \
    are was were be been it its he she him her his they them their we you i me my our your this \
    that these those there here into onto up out over under then than so not no yes do does did \
    has have had will would can could just also very";

const STOPWORDS_RU: &str = "и в во не на с со что как а но к ко у о об от по за из для до же ли \
    бы он она оно они его ее их мы вы я ты мне меня это этот эта эти то там тут где когда уже еще \
    так вот";

fn stopwords() -> &'static HashSet<&'static str> {
    static STOPWORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOPWORDS.get_or_init(|| {
        STOPWORDS_EN
            .split_whitespace()
            .chain(STOPWORDS_RU.split_whitespace())
            .collect()
    })
}

/// Offline bag-of-words embedder using signed feature hashing
///
/// Each folded content token is hashed with SHA-256; the low 64 bits pick a
/// bucket and the top bit a sign. Lexically close sentences land close in
/// cosine space. No model download, fully deterministic.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIM)
    }
}

impl Embedder for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let folded = fold_text(text);
        let stop = stopwords();
        let mut vector = vec![0.0f32; self.dim];

        for token in tokenize(&folded) {
            if token.chars().count() < 2 || stop.contains(token) {
                continue;
            }
            let digest = Sha256::digest(token.as_bytes());
            let mut low = [0u8; 8];
            low.copy_from_slice(&digest[..8]);
            let h = u64::from_le_bytes(low);
            let bucket = (h % self.dim as u64) as usize;
            vector[bucket] += if h >> 63 == 1 { -1.0 } else { 1.0 };
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut vector {
                *x /= norm;
            }
        }
        Ok(vector)
    }
}

/// Embedder backed by a local Ollama server (`POST /api/embeddings`)
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    agent: ureq::Agent,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    pub const DEFAULT_URL: &'static str = "http://localhost:11434";
    pub const DEFAULT_MODEL: &'static str = "nomic-embed-text";

    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_request_timeout(base_url, model, Some(Duration::from_secs(30)))
    }

    /// HTTP deadline per request; `None` waits indefinitely
    pub fn with_request_timeout(
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Self {
        let agent = ureq::config::Config::builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            agent,
        }
    }
}

impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let body = OllamaRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .agent
            .post(&url)
            .header("Content-Type", "application/json")
            .send_json(&body)
            .map_err(|e| EmbedError::Backend(e.to_string()))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let error_text = response.into_body().read_to_string().unwrap_or_default();
            return Err(EmbedError::Backend(format!("HTTP {}: {}", status, error_text)));
        }

        let parsed: OllamaResponse = response
            .into_body()
            .read_json()
            .map_err(|e| EmbedError::Backend(format!("invalid response: {}", e)))?;

        if parsed.embedding.is_empty() {
            return Err(EmbedError::Empty);
        }
        debug!("ollama embedded {} chars -> {} dims", text.len(), parsed.embedding.len());
        Ok(parsed.embedding)
    }
}
