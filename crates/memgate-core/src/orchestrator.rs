//! Memory orchestrator.
//!
//! Coordinates ingestion and retrieval for one collection:
//!
//! - `add_memory`: embed → classify (optional) → gate → persist on accept
//! - `search_memory`: embed query → store search → filter, order, truncate
//!
//! Provider calls are awaited without holding the gate's lock; the gate is
//! only entered for its in-memory decision.

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::gate::MemoryGate;
use crate::traits::{ClassifierProvider, EmbeddingProvider, VectorStore};
use crate::types::{
    GateDecision, MemoryRecord, MemorySource, Metadata, NewMemoryRecord, SearchQuery, SearchResult,
};

/// Result of an `add_memory` call
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Content was blank; nothing was embedded or evaluated
    Skipped,
    /// The gate rejected the content; nothing was stored
    Rejected { decision: GateDecision },
    /// The gate accepted the content and the store assigned `id`
    Stored { id: String, decision: GateDecision },
}

impl AddOutcome {
    /// Identifier of the stored memory, if one was stored
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Stored { id, .. } => Some(id),
            _ => None,
        }
    }

    /// The gate decision, if the gate was consulted
    pub fn decision(&self) -> Option<&GateDecision> {
        match self {
            Self::Skipped => None,
            Self::Rejected { decision } | Self::Stored { decision, .. } => Some(decision),
        }
    }

    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Orchestrates providers and the gate for one collection.
pub struct MemoryOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    classifier: Option<Arc<dyn ClassifierProvider>>,
    store: Arc<dyn VectorStore>,
    gate: MemoryGate,
}

impl MemoryOrchestrator {
    /// Create an orchestrator without a classifier
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, store: Arc<dyn VectorStore>, gate: MemoryGate) -> Self {
        Self {
            embedder,
            classifier: None,
            store,
            gate,
        }
    }

    /// Attach a classifier; its confidence then drives gate rule 5
    pub fn with_classifier(mut self, classifier: Arc<dyn ClassifierProvider>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn gate(&self) -> &MemoryGate {
        &self.gate
    }

    pub fn store(&self) -> &dyn VectorStore {
        self.store.as_ref()
    }

    pub fn has_classifier(&self) -> bool {
        self.classifier.is_some()
    }

    /// Run `content` through the gate and persist it if accepted.
    ///
    /// Provider failures are returned as errors. A storage failure after
    /// acceptance is returned as [`Error::NotPersisted`]; the gate has already
    /// cached the embedding at that point.
    pub async fn add_memory(
        &self,
        content: &str,
        source: MemorySource,
        metadata: Metadata,
    ) -> Result<AddOutcome> {
        if content.trim().is_empty() {
            return Ok(AddOutcome::Skipped);
        }

        let embedding = self.embedder.embed(content).await?;

        let classification = match &self.classifier {
            Some(classifier) => Some(classifier.classify(content).await?),
            None => None,
        };

        let decision = self
            .gate
            .evaluate(content, &embedding, classification.as_ref())?;

        if !decision.accepted {
            debug!(reason = %decision.reason, source = %source, "Memory rejected");
            return Ok(AddOutcome::Rejected { decision });
        }

        let record = NewMemoryRecord {
            content: content.to_string(),
            embedding,
            source,
            metadata,
            created_at: Utc::now(),
        };

        match self.store.upsert(record).await {
            Ok(id) => {
                info!(id = %id, reason = %decision.reason, source = %source, "Stored memory");
                Ok(AddOutcome::Stored { id, decision })
            }
            Err(e) => {
                warn!(
                    reason = %decision.reason,
                    store = self.store.name(),
                    "Accepted memory could not be persisted: {}",
                    e
                );
                Err(Error::not_persisted(decision.reason, e))
            }
        }
    }

    /// Ingest several texts in order, stopping at the first error
    pub async fn add_many<I, S>(&self, items: I) -> Result<Vec<AddOutcome>>
    where
        I: IntoIterator<Item = (S, MemorySource, Metadata)>,
        S: AsRef<str>,
    {
        let mut outcomes = Vec::new();
        for (content, source, metadata) in items {
            outcomes.push(self.add_memory(content.as_ref(), source, metadata).await?);
        }
        Ok(outcomes)
    }

    /// Retrieve the memories most similar to `query.query`.
    ///
    /// Results are ordered by score descending (ties keep the store's order),
    /// every score is ≥ `query.min_score`, and at most `query.top_k` are returned.
    pub async fn search_memory(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        if query.top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = self.embedder.embed(&query.query).await?;

        let mut results = self
            .store
            .search(&vector, query.top_k, query.min_score)
            .await?;

        results.retain(|r| r.score >= query.min_score);
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        results.truncate(query.top_k);

        debug!(
            top_k = query.top_k,
            min_score = query.min_score,
            found = results.len(),
            "Memory search"
        );

        Ok(results)
    }

    /// Up to `limit` stored memories, most recent first
    pub async fn recent_memories(&self, limit: usize) -> Result<Vec<MemoryRecord>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.store.recent(limit).await
    }
}
