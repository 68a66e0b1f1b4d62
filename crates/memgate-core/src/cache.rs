//! Recent-embedding cache.
//!
//! A bounded, insertion-ordered history of embeddings the gate has accepted.
//! Used only for duplicate detection; never persisted.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::similarity::cosine_similarity;

/// An accepted embedding and when it was accepted
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEmbedding {
    pub vector: Vec<f32>,
    pub accepted_at: DateTime<Utc>,
}

/// FIFO cache of recently accepted embeddings.
///
/// The first accepted vector pins the dimensionality unless one was given up
/// front; every later vector must match it.
#[derive(Debug, Clone)]
pub struct RecentEmbeddingCache {
    entries: VecDeque<CachedEmbedding>,
    capacity: usize,
    dimension: Option<usize>,
}

impl RecentEmbeddingCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            dimension: None,
        }
    }

    pub fn with_dimension(capacity: usize, dimension: usize) -> Self {
        Self {
            dimension: Some(dimension),
            ..Self::new(capacity)
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pinned dimensionality, if any
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Reject vectors whose dimensionality cannot belong to this collection
    pub fn check_dimension(&self, vector: &[f32]) -> Result<()> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(Error::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ if vector.is_empty() => Err(Error::DimensionMismatch {
                expected: self.dimension.unwrap_or(1),
                actual: 0,
            }),
            _ => Ok(()),
        }
    }

    /// Highest cosine similarity between `vector` and any cached entry
    pub fn max_similarity(&self, vector: &[f32]) -> Option<f32> {
        self.entries
            .iter()
            .map(|entry| cosine_similarity(&entry.vector, vector))
            .reduce(f32::max)
    }

    /// Append an accepted vector, returning the evicted entry when over capacity
    pub fn push(&mut self, vector: Vec<f32>, accepted_at: DateTime<Utc>) -> Option<CachedEmbedding> {
        if self.dimension.is_none() {
            self.dimension = Some(vector.len());
        }

        self.entries.push_back(CachedEmbedding { vector, accepted_at });

        if self.entries.len() > self.capacity {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Cached entries, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &CachedEmbedding> {
        self.entries.iter()
    }

    /// Drop all cached entries; the pinned dimension is kept
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
