//! Shared types for memgate-core.
//!
//! These types are used by the gate, the orchestrator and every provider.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Free-form metadata attached to a memory (e.g. timestamp, session id).
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Classifier output: category → confidence in [0, 1].
pub type Classification = BTreeMap<String, f32>;

// ─────────────────────────────────────────────────────────────────────────────
// Memory Records
// ─────────────────────────────────────────────────────────────────────────────

/// Who produced the content of a memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    User,
    System,
    Assistant,
}

impl MemorySource {
    /// Convert from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "system" => Some(Self::System),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::System => "system",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MemorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A persisted memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Identifier assigned by the vector store
    pub id: String,
    pub content: String,
    pub embedding: Vec<f32>,
    pub source: MemorySource,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

/// A memory that passed the gate and has not been persisted yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMemoryRecord {
    pub content: String,
    pub embedding: Vec<f32>,
    pub source: MemorySource,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
}

impl NewMemoryRecord {
    /// Attach the store-assigned identifier
    pub fn into_record(self, id: impl Into<String>) -> MemoryRecord {
        MemoryRecord {
            id: id.into(),
            content: self.content,
            embedding: self.embedding,
            source: self.source,
            metadata: self.metadata,
            created_at: self.created_at,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Search
// ─────────────────────────────────────────────────────────────────────────────

/// Similarity search request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub query: String,
    /// Maximum number of results; zero yields no results
    pub top_k: usize,
    /// Similarity floor in [0, 1]
    #[serde(default)]
    pub min_score: f32,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, top_k: usize) -> Self {
        Self {
            query: query.into(),
            top_k,
            min_score: 0.0,
        }
    }

    pub fn with_min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score.clamp(0.0, 1.0);
        self
    }
}

/// A memory paired with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub memory: MemoryRecord,
    pub score: f32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Gate Decisions
// ─────────────────────────────────────────────────────────────────────────────

/// Why the gate accepted or rejected a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// Content contains a keep-phrase
    ForcedKeep,
    /// Trimmed content is shorter than `min_content_length`
    TooShort,
    /// Content is a skip phrase or a short acknowledgement
    SkipPhrase,
    /// Too similar to a recently accepted memory
    Duplicate,
    /// Classifier confidence below `confidence_threshold`
    LowConfidence,
    /// Classifier confidence at or above `confidence_threshold`
    ClassifiedKeep,
    /// No classifier configured and no rule rejected
    DefaultKeep,
}

impl DecisionReason {
    /// Whether this reason implies acceptance
    pub fn is_accept(&self) -> bool {
        matches!(self, Self::ForcedKeep | Self::ClassifiedKeep | Self::DefaultKeep)
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForcedKeep => "forced_keep",
            Self::TooShort => "too_short",
            Self::SkipPhrase => "skip_phrase",
            Self::Duplicate => "duplicate",
            Self::LowConfidence => "low_confidence",
            Self::ClassifiedKeep => "classified_keep",
            Self::DefaultKeep => "default_keep",
        }
    }
}

impl std::fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a single gate evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GateDecision {
    pub accepted: bool,
    pub reason: DecisionReason,
    /// Highest similarity against the recent-embedding cache, if the duplicate rule ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_similarity: Option<f32>,
    /// Highest classifier confidence, if a classification was inspected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl GateDecision {
    pub fn new(reason: DecisionReason) -> Self {
        Self {
            accepted: reason.is_accept(),
            reason,
            max_similarity: None,
            confidence: None,
        }
    }

    pub fn with_similarity(mut self, similarity: Option<f32>) -> Self {
        self.max_similarity = similarity;
        self
    }

    pub fn with_confidence(mut self, confidence: Option<f32>) -> Self {
        self.confidence = confidence;
        self
    }
}

/// Highest confidence in a classification; an empty classification scores 0.0
pub fn top_confidence(classification: &Classification) -> f32 {
    classification
        .values()
        .copied()
        .fold(0.0_f32, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_roundtrip() {
        for source in [MemorySource::User, MemorySource::System, MemorySource::Assistant] {
            assert_eq!(MemorySource::from_str(source.as_str()), Some(source));
        }
        assert_eq!(MemorySource::from_str("robot"), None);
    }

    #[test]
    fn test_decision_reason_acceptance() {
        assert!(DecisionReason::ForcedKeep.is_accept());
        assert!(DecisionReason::ClassifiedKeep.is_accept());
        assert!(DecisionReason::DefaultKeep.is_accept());
        assert!(!DecisionReason::TooShort.is_accept());
        assert!(!DecisionReason::SkipPhrase.is_accept());
        assert!(!DecisionReason::Duplicate.is_accept());
        assert!(!DecisionReason::LowConfidence.is_accept());

        let decision = GateDecision::new(DecisionReason::Duplicate);
        assert!(!decision.accepted);
    }

    #[test]
    fn test_decision_serializes_snake_case() {
        let decision = GateDecision::new(DecisionReason::LowConfidence).with_confidence(Some(0.1));
        let json = serde_json::to_value(decision).unwrap();
        assert_eq!(json["reason"], "low_confidence");
        assert_eq!(json["accepted"], false);
        assert!(json.get("max_similarity").is_none());
    }

    #[test]
    fn test_search_query_clamps_min_score() {
        assert_eq!(SearchQuery::new("q", 3).with_min_score(1.5).min_score, 1.0);
        assert_eq!(SearchQuery::new("q", 3).with_min_score(-0.2).min_score, 0.0);
    }

    #[test]
    fn test_top_confidence() {
        let mut classification = Classification::new();
        assert_eq!(top_confidence(&classification), 0.0);

        classification.insert("preference".into(), 0.5);
        classification.insert("task".into(), 0.75);
        assert_eq!(top_confidence(&classification), 0.75);
    }
}
