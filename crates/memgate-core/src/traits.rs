//! Provider traits defining the interface to embedding, classification and
//! storage backends.
//!
//! Concrete backends live outside the core; the orchestrator only sees these
//! contracts.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Classification, MemoryRecord, Metadata, NewMemoryRecord, SearchResult};

/// Maps text to a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Name of the provider (for logging/debugging).
    fn name(&self) -> &str;

    /// Dimensionality of every vector this provider returns.
    fn dimensions(&self) -> usize;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts, preserving order.
    async fn embed_many(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }
}

/// Maps text to category → confidence scores.
#[async_trait]
pub trait ClassifierProvider: Send + Sync {
    /// Name of the provider (for logging/debugging).
    fn name(&self) -> &str;

    /// Classify a text. Confidences are in [0, 1].
    async fn classify(&self, text: &str) -> Result<Classification>;
}

/// Persists memory records and retrieves nearest matches.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Name of the backend (for logging/debugging).
    fn name(&self) -> &str;

    /// Persist a record and return its assigned identifier.
    async fn upsert(&self, record: NewMemoryRecord) -> Result<String>;

    /// Up to `top_k` records with similarity ≥ `min_score`, best first.
    async fn search(&self, vector: &[f32], top_k: usize, min_score: f32) -> Result<Vec<SearchResult>>;

    /// Fetch a record by identifier.
    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>>;

    /// Merge `metadata` into an existing record. Returns false if `id` is unknown.
    async fn augment_metadata(&self, id: &str, metadata: Metadata) -> Result<bool>;

    /// Up to `limit` records, most recently stored first.
    async fn recent(&self, limit: usize) -> Result<Vec<MemoryRecord>>;

    /// Number of stored records.
    async fn count(&self) -> Result<usize>;
}
