//! Embedding providers
//!
//! - [`HashingEmbedder`]: deterministic feature hashing. No model, no network;
//!   texts sharing words land close together, which is enough for duplicate
//!   detection and small local collections.
//! - `FastEmbedder` (feature `fastembed`): local all-MiniLM-L6-v2 inference,
//!   loaded lazily on first use.

use async_trait::async_trait;
use memgate_core::{EmbeddingProvider, Error, Result};
use sha2::{Digest, Sha256};

/// Feature-hashing embedder over word unigrams and bigrams.
///
/// Each feature is hashed with SHA-256; the first eight bytes pick the bucket
/// and the ninth picks the sign. Text without any word (emoji, punctuation)
/// falls back to character unigrams and bigrams, so only blank text embeds to
/// the zero vector. The result is L2-normalized.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::Config("embedding.dimensions must be greater than 0".into()));
        }
        Ok(Self { dimensions })
    }

    /// Embed synchronously
    pub fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];

        for feature in features(text) {
            let digest = Sha256::digest(feature.as_bytes());
            let mut bucket = [0u8; 8];
            bucket.copy_from_slice(&digest[..8]);
            let index = (u64::from_le_bytes(bucket) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }
}

/// Word unigrams and bigrams, or character ones when the text has no words
fn features(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    if !tokens.is_empty() {
        let unigrams = tokens.iter().map(|t| format!("u:{t}"));
        let bigrams = tokens.windows(2).map(|w| format!("b:{} {}", w[0], w[1]));
        return unigrams.chain(bigrams).collect();
    }

    let chars: Vec<char> = text.chars().filter(|c| !c.is_whitespace()).collect();
    let unigrams = chars.iter().map(|c| format!("c:{c}"));
    let bigrams = chars.windows(2).map(|w| format!("cb:{}{}", w[0], w[1]));
    unigrams.chain(bigrams).collect()
}

/// Lowercased alphanumeric words; apostrophes inside words are kept
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2018}', '\u{2019}'], "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(feature = "fastembed")]
pub use local::FastEmbedder;

#[cfg(feature = "fastembed")]
mod local {
    use std::sync::Arc;

    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use memgate_core::{EmbeddingProvider, Error, Result};
    use tokio::sync::RwLock;

    /// Output size of every supported model
    pub const FASTEMBED_DIMENSIONS: usize = 384;

    /// Local sentence-embedding model, loaded on first use
    pub struct FastEmbedder {
        model_name: EmbeddingModel,
        model: Arc<RwLock<Option<TextEmbedding>>>,
    }

    impl FastEmbedder {
        /// `model` accepts "all-minilm-l6-v2" (default) or "bge-small-en-v1.5"
        pub fn new(model: Option<&str>) -> Result<Self> {
            let model_name = match model.map(|m| m.trim().to_ascii_lowercase()).as_deref() {
                None | Some("all-minilm-l6-v2") => EmbeddingModel::AllMiniLML6V2,
                Some("bge-small-en-v1.5") => EmbeddingModel::BGESmallENV15,
                Some(other) => {
                    return Err(Error::unsupported_provider(
                        "fastembed model",
                        other,
                        &["all-minilm-l6-v2", "bge-small-en-v1.5"],
                    ));
                }
            };

            Ok(Self {
                model_name,
                model: Arc::new(RwLock::new(None)),
            })
        }

        async fn ensure_model(&self) -> Result<()> {
            if self.model.read().await.is_some() {
                return Ok(());
            }

            let mut guard = self.model.write().await;
            if guard.is_some() {
                return Ok(());
            }

            tracing::info!("Loading embedding model: {:?}", self.model_name);
            let start = std::time::Instant::now();

            let mut init_options = InitOptions::default();
            init_options.model_name = self.model_name.clone();
            init_options.show_download_progress = false;

            let model = TextEmbedding::try_new(init_options)
                .map_err(|e| Error::Embedding(format!("Failed to load embedding model: {}", e)))?;

            tracing::info!("Embedding model loaded in {:?}", start.elapsed());
            *guard = Some(model);
            Ok(())
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FastEmbedder {
        fn name(&self) -> &str {
            "fastembed"
        }

        fn dimensions(&self) -> usize {
            FASTEMBED_DIMENSIONS
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut vectors = self.embed_many(&[text]).await?;
            vectors
                .pop()
                .ok_or_else(|| Error::Embedding("No embedding generated".into()))
        }

        async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }

            self.ensure_model().await?;

            let guard = self.model.read().await;
            let model = guard
                .as_ref()
                .ok_or_else(|| Error::Embedding("Embedding model not initialized".into()))?;

            model
                .embed(texts.to_vec(), None)
                .map_err(|e| Error::Embedding(format!("Failed to generate embeddings: {}", e)))
        }
    }
}
