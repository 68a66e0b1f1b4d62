//! Gate configuration.
//!
//! Supplied by the caller (typically deserialized from the `[gate]` table of
//! the memgate config file). Defaults follow the conversational deployment the
//! gate was tuned for.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Thresholds and phrase lists consumed by [`MemoryGate`](crate::MemoryGate)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Cosine similarity at or above which a candidate is a duplicate (default: 0.90)
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Minimum top classifier confidence to keep a memory (default: 0.3)
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Minimum trimmed content length in characters (default: 10)
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    /// Acknowledgements that are never worth remembering
    #[serde(default)]
    pub skip_words: Vec<String>,

    /// Phrases that force a memory to be kept
    #[serde(default)]
    pub keep_phrases: Vec<String>,

    /// Capacity of the recent-embedding cache (default: 50)
    #[serde(default = "default_max_recent_embeddings")]
    pub max_recent_embeddings: usize,

    /// Expected embedding dimensionality; pinned by the first acceptance when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dim: Option<usize>,
}

fn default_similarity_threshold() -> f64 {
    0.90
}

fn default_confidence_threshold() -> f64 {
    0.3
}

fn default_min_content_length() -> usize {
    10
}

fn default_max_recent_embeddings() -> usize {
    50
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: default_similarity_threshold(),
            confidence_threshold: default_confidence_threshold(),
            min_content_length: default_min_content_length(),
            skip_words: Vec::new(),
            keep_phrases: Vec::new(),
            max_recent_embeddings: default_max_recent_embeddings(),
            embedding_dim: None,
        }
    }
}

impl GateConfig {
    /// Defaults plus the phrase lists used for chat transcripts
    pub fn conversational() -> Self {
        Self {
            skip_words: ["ok", "I see", "thanks", "thank you", "got it", "sure"]
                .into_iter()
                .map(String::from)
                .collect(),
            keep_phrases: [
                "remember",
                "important",
                "note",
                "don't forget",
                "my name is",
                "I am",
                "I'm",
                "I like",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            ..Self::default()
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f64) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_confidence_threshold(mut self, threshold: f64) -> Self {
        self.confidence_threshold = threshold;
        self
    }

    pub fn with_min_content_length(mut self, length: usize) -> Self {
        self.min_content_length = length;
        self
    }

    pub fn with_skip_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keep_phrases<I, S>(mut self, phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keep_phrases = phrases.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_recent_embeddings(mut self, capacity: usize) -> Self {
        self.max_recent_embeddings = capacity;
        self
    }

    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = Some(dim);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(Error::Config(
                "gate.similarity_threshold must be between 0 and 1".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(Error::Config(
                "gate.confidence_threshold must be between 0 and 1".into(),
            ));
        }

        if self.max_recent_embeddings == 0 {
            return Err(Error::Config(
                "gate.max_recent_embeddings must be greater than 0".into(),
            ));
        }

        if self.embedding_dim == Some(0) {
            return Err(Error::Config(
                "gate.embedding_dim must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
