//! Memory gate.
//!
//! Turns (content, embedding, classification) into an accept/reject decision
//! using a fixed rule cascade. The first matching rule wins:
//!
//! ```text
//! ┌──────────────┐   keep-phrase    ┌──────────────┐
//! │ 1 forced keep│ ───────────────▶ │    ACCEPT    │
//! └──────┬───────┘                  └──────────────┘
//!        ▼
//! ┌──────────────┐   too short      ┌──────────────┐
//! │ 2 length     │ ───────────────▶ │    REJECT    │
//! ├──────────────┤   skip phrase    │              │
//! │ 3 skip words │ ───────────────▶ │              │
//! ├──────────────┤   similar        │              │
//! │ 4 duplicate  │ ───────────────▶ │              │
//! ├──────────────┤   low confidence │              │
//! │ 5 classifier │ ───────────────▶ │              │
//! └──────┬───────┘                  └──────────────┘
//!        ▼
//!  classified_keep / default_keep
//! ```
//!
//! Accepted embeddings enter the recent-embedding cache; rejected ones never do.

use std::sync::Mutex;

use chrono::Utc;
use tracing::debug;

use crate::cache::RecentEmbeddingCache;
use crate::config::GateConfig;
use crate::error::{Error, Result};
use crate::types::{top_confidence, Classification, DecisionReason, GateDecision};

/// Longest input (in words) still treated as an acknowledgement when it
/// merely starts or ends with a skip phrase.
pub const ACK_MAX_WORDS: usize = 4;

/// Stateful admission gate for one collection.
///
/// Safe to share across sessions: the cache scan and the cache update for a
/// single evaluation happen under one lock, so two concurrent near-duplicates
/// cannot both be accepted.
pub struct MemoryGate {
    config: GateConfig,
    keep_phrases: Vec<String>,
    skip_phrases: Vec<Vec<String>>,
    cache: Mutex<RecentEmbeddingCache>,
}

impl MemoryGate {
    /// Create a gate, validating the configuration first
    pub fn new(config: GateConfig) -> Result<Self> {
        config.validate()?;

        let keep_phrases = config
            .keep_phrases
            .iter()
            .map(|p| normalize_for_matching(p))
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>();

        let skip_phrases = config
            .skip_words
            .iter()
            .map(|p| normalize_for_matching(p))
            .filter(|p| !p.is_empty())
            .map(|p| p.split(' ').map(String::from).collect::<Vec<_>>())
            .collect::<Vec<_>>();

        let cache = match config.embedding_dim {
            Some(dim) => RecentEmbeddingCache::with_dimension(config.max_recent_embeddings, dim),
            None => RecentEmbeddingCache::new(config.max_recent_embeddings),
        };

        Ok(Self {
            config,
            keep_phrases,
            skip_phrases,
            cache: Mutex::new(cache),
        })
    }

    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Decide whether `content` should become a memory.
    ///
    /// `classification` is `None` when no classifier is configured. An
    /// embedding whose dimensionality does not match the collection is an
    /// error, not a rejection.
    pub fn evaluate(
        &self,
        content: &str,
        embedding: &[f32],
        classification: Option<&Classification>,
    ) -> Result<GateDecision> {
        let normalized = normalize_for_matching(content);

        let mut cache = self.cache.lock().map_err(|_| Error::LockPoisoned)?;
        cache.check_dimension(embedding)?;

        let decision = self.decide(content, &normalized, embedding, classification, &cache);

        if decision.accepted {
            if let Some(evicted) = cache.push(embedding.to_vec(), Utc::now()) {
                debug!(
                    accepted_at = %evicted.accepted_at,
                    "Evicted oldest embedding from recent cache"
                );
            }
        }
        drop(cache);

        debug!(
            accepted = decision.accepted,
            reason = %decision.reason,
            max_similarity = ?decision.max_similarity,
            confidence = ?decision.confidence,
            "Gate decision"
        );

        Ok(decision)
    }

    /// The rule cascade. Pure over its arguments.
    fn decide(
        &self,
        content: &str,
        normalized: &str,
        embedding: &[f32],
        classification: Option<&Classification>,
        cache: &RecentEmbeddingCache,
    ) -> GateDecision {
        // 1. Forced keep
        if self.keep_phrases.iter().any(|p| normalized.contains(p.as_str())) {
            return GateDecision::new(DecisionReason::ForcedKeep);
        }

        // 2. Too short
        if content.trim().chars().count() < self.config.min_content_length {
            return GateDecision::new(DecisionReason::TooShort);
        }

        // 3. Skip phrase
        if self.is_skip_phrase(normalized) {
            return GateDecision::new(DecisionReason::SkipPhrase);
        }

        // 4. Duplicate
        let max_similarity = cache.max_similarity(embedding);
        if max_similarity.is_some_and(|s| s >= self.config.similarity_threshold as f32) {
            return GateDecision::new(DecisionReason::Duplicate).with_similarity(max_similarity);
        }

        // 5. Classifier confidence
        if let Some(classification) = classification {
            let confidence = top_confidence(classification);
            let reason = if confidence < self.config.confidence_threshold as f32 {
                DecisionReason::LowConfidence
            } else {
                DecisionReason::ClassifiedKeep
            };
            return GateDecision::new(reason)
                .with_similarity(max_similarity)
                .with_confidence(Some(confidence));
        }

        // 6. Default keep
        GateDecision::new(DecisionReason::DefaultKeep).with_similarity(max_similarity)
    }

    fn is_skip_phrase(&self, normalized: &str) -> bool {
        let words: Vec<&str> = normalized.split(' ').filter(|w| !w.is_empty()).collect();

        self.skip_phrases.iter().any(|phrase| {
            if words.len() == phrase.len() && has_prefix(&words, phrase) {
                return true;
            }
            words.len() <= ACK_MAX_WORDS && (has_prefix(&words, phrase) || has_suffix(&words, phrase))
        })
    }

    /// Number of embeddings currently cached
    pub fn recent_len(&self) -> Result<usize> {
        Ok(self.cache.lock().map_err(|_| Error::LockPoisoned)?.len())
    }

    /// Snapshot of cached embeddings, oldest first
    pub fn recent_embeddings(&self) -> Result<Vec<Vec<f32>>> {
        let cache = self.cache.lock().map_err(|_| Error::LockPoisoned)?;
        Ok(cache.iter().map(|e| e.vector.clone()).collect())
    }

    /// Dimensionality pinned for this collection, if known yet
    pub fn dimension(&self) -> Result<Option<usize>> {
        Ok(self.cache.lock().map_err(|_| Error::LockPoisoned)?.dimension())
    }

    /// Forget all recently accepted embeddings
    pub fn clear(&self) -> Result<()> {
        self.cache.lock().map_err(|_| Error::LockPoisoned)?.clear();
        Ok(())
    }
}

fn has_prefix(words: &[&str], phrase: &[String]) -> bool {
    phrase.len() <= words.len() && words.iter().zip(phrase).all(|(w, p)| *w == p.as_str())
}

fn has_suffix(words: &[&str], phrase: &[String]) -> bool {
    phrase.len() <= words.len() && has_prefix(&words[words.len() - phrase.len()..], phrase)
}

/// Lowercase, fold typographic apostrophes, strip punctuation from token
/// edges and collapse whitespace. Used for keep/skip phrase matching only.
pub fn normalize_for_matching(text: &str) -> String {
    text.split_whitespace()
        .map(|token| token.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'"))
        .map(|token| token.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(confidence: f32) -> Classification {
        let mut c = Classification::new();
        c.insert("fact".into(), confidence);
        c
    }

    fn gate(config: GateConfig) -> MemoryGate {
        MemoryGate::new(config).unwrap()
    }

    #[test]
    fn test_normalize_for_matching() {
        assert_eq!(normalize_for_matching("  Hi there,  my NAME is Sam! "), "hi there my name is sam");
        assert_eq!(normalize_for_matching("I\u{2019}m here"), "i'm here");
        assert_eq!(normalize_for_matching("...!!"), "");
    }

    #[test]
    fn test_too_short_checked_before_skip_words() {
        // "ok" is 2 chars < 10: the length rule fires first
        let gate = gate(GateConfig::default().with_skip_words(["ok"]));
        let decision = gate.evaluate("ok", &[1.0, 0.0], None).unwrap();
        assert!(!decision.accepted);
        assert_eq!(decision.reason, DecisionReason::TooShort);
    }

    #[test]
    fn test_keep_phrase_overrides_low_confidence() {
        let gate = gate(GateConfig::default().with_keep_phrases(["my name is"]));
        let decision = gate
            .evaluate("Hi there, my name is Sam", &[1.0, 0.0], Some(&classification(0.05)))
            .unwrap();
        assert!(decision.accepted);
        assert_eq!(decision.reason, DecisionReason::ForcedKeep);
    }

    #[test]
    fn test_keep_phrase_overrides_length_and_zero_confidence() {
        let gate = gate(GateConfig::default().with_keep_phrases(["Remember"]));
        let decision = gate
            .evaluate("REMEMBER", &[1.0, 0.0], Some(&classification(0.0)))
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::ForcedKeep);
    }

    #[test]
    fn test_too_short_for_any_inputs() {
        let gate = gate(GateConfig::default());
        for content in ["", "   ", "short", " nine char "] {
            let decision = gate.evaluate(content, &[0.3, 0.7], Some(&classification(1.0))).unwrap();
            assert_eq!(decision.reason, DecisionReason::TooShort, "content: {content:?}");
        }
        assert_eq!(gate.recent_len().unwrap(), 0);
    }

    #[test]
    fn test_skip_phrases() {
        let gate = gate(
            GateConfig::default()
                .with_min_content_length(3)
                .with_skip_words(["ok", "thank you", "got it"]),
        );

        for content in ["Thank you!", "ok, got it", "thank you so much", "Got it, thanks"] {
            let decision = gate.evaluate(content, &[1.0, 0.0], None).unwrap();
            assert_eq!(decision.reason, DecisionReason::SkipPhrase, "content: {content:?}");
        }

        let decision = gate
            .evaluate("ok so my flight to Lisbon leaves on Friday", &[1.0, 0.0], None)
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::DefaultKeep);
    }

    #[test]
    fn test_skip_phrase_requires_word_boundary() {
        let gate = gate(GateConfig::default().with_min_content_length(3).with_skip_words(["ok"]));
        let decision = gate.evaluate("okra soup", &[1.0, 0.0], None).unwrap();
        assert_eq!(decision.reason, DecisionReason::DefaultKeep);
    }

    #[test]
    fn test_duplicate_rejected() {
        let gate = gate(GateConfig::default().with_similarity_threshold(0.9));
        let a = [1.0, 0.0];
        let b = [0.95, (1.0_f32 - 0.95 * 0.95).sqrt()];

        let first = gate.evaluate("I moved to Berlin last spring", &a, None).unwrap();
        assert!(first.accepted);

        let second = gate.evaluate("Last spring I moved to Berlin", &b, None).unwrap();
        assert!(!second.accepted);
        assert_eq!(second.reason, DecisionReason::Duplicate);
        assert!(second.max_similarity.unwrap() >= 0.9);
    }

    #[test]
    fn test_classified_keep() {
        let gate = gate(GateConfig::default());
        let decision = gate
            .evaluate("Dentist appointment Tue", &[0.0, 1.0], Some(&classification(0.5)))
            .unwrap();
        assert!(decision.accepted);
        assert_eq!(decision.reason, DecisionReason::ClassifiedKeep);
        assert_eq!(decision.confidence, Some(0.5));
    }

    #[test]
    fn test_low_confidence() {
        let gate = gate(GateConfig::default());
        let decision = gate
            .evaluate("the weather is quite nice", &[0.0, 1.0], Some(&classification(0.29)))
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::LowConfidence);

        let empty = Classification::new();
        let decision = gate.evaluate("the weather is quite nice", &[0.0, 1.0], Some(&empty)).unwrap();
        assert_eq!(decision.reason, DecisionReason::LowConfidence);
        assert_eq!(gate.recent_len().unwrap(), 0);
    }

    #[test]
    fn test_default_keep_without_classifier() {
        let gate = gate(GateConfig::default());
        let decision = gate.evaluate("the weather is quite nice", &[0.0, 1.0], None).unwrap();
        assert!(decision.accepted);
        assert_eq!(decision.reason, DecisionReason::DefaultKeep);
    }

    #[test]
    fn test_fifo_eviction() {
        let gate = gate(GateConfig::default().with_max_recent_embeddings(2));
        let vectors = [vec![1.0, 0.0, 0.0], vec![0.0, 1.0, 0.0], vec![0.0, 0.0, 1.0]];

        for (i, v) in vectors.iter().enumerate() {
            let decision = gate.evaluate(&format!("distinct memory number {i}"), v, None).unwrap();
            assert!(decision.accepted);
            assert!(gate.recent_len().unwrap() <= 2);
        }

        assert_eq!(gate.recent_embeddings().unwrap(), vec![vectors[1].clone(), vectors[2].clone()]);
    }

    #[test]
    fn test_rejections_do_not_mutate_cache() {
        let gate = gate(
            GateConfig::default()
                .with_skip_words(["thank you"])
                .with_max_recent_embeddings(3),
        );
        gate.evaluate("my sister lives in Oslo", &[1.0, 0.0, 0.0], None).unwrap();
        let before = gate.recent_embeddings().unwrap();

        let rejections = [
            gate.evaluate("tiny", &[0.0, 1.0, 0.0], None).unwrap(),
            gate.evaluate("thank you very much", &[0.0, 0.0, 1.0], None).unwrap(),
            gate.evaluate("my sister lives in Oslo!", &[1.0, 0.0, 0.0], None).unwrap(),
            gate.evaluate("some idle chatter here", &[0.0, 1.0, 1.0], Some(&classification(0.1))).unwrap(),
        ];

        assert!(rejections.iter().all(|d| !d.accepted));
        assert_eq!(gate.recent_embeddings().unwrap(), before);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let gate = gate(GateConfig::default());
        gate.evaluate("first accepted memory", &[1.0, 0.0, 0.0], None).unwrap();

        // Even content that would be rejected as too short must surface the defect
        let result = gate.evaluate("ok", &[1.0, 0.0], None);
        assert!(matches!(result, Err(Error::DimensionMismatch { expected: 3, actual: 2 })));
        assert_eq!(gate.recent_len().unwrap(), 1);
    }

    #[test]
    fn test_configured_dimension_enforced_before_first_acceptance() {
        let gate = gate(GateConfig::default().with_embedding_dim(4));
        let result = gate.evaluate("a perfectly fine memory", &[1.0, 0.0], None);
        assert!(matches!(result, Err(Error::DimensionMismatch { expected: 4, actual: 2 })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(MemoryGate::new(GateConfig::default().with_max_recent_embeddings(0)).is_err());
    }

    #[test]
    fn test_concurrent_duplicates_accept_once() {
        let gate = gate(GateConfig::default());
        let embedding = [0.6, 0.8];

        let accepted: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    scope.spawn(|| {
                        gate.evaluate("we adopted a cat named Miso", &embedding, None)
                            .unwrap()
                            .accepted
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|accepted| *accepted)
                .count()
        });

        assert_eq!(accepted, 1);
        assert_eq!(gate.recent_len().unwrap(), 1);
    }

    #[test]
    fn test_clear_keeps_dimension() {
        let gate = gate(GateConfig::default());
        gate.evaluate("first accepted memory", &[1.0, 0.0], None).unwrap();
        gate.clear().unwrap();
        assert_eq!(gate.recent_len().unwrap(), 0);
        assert_eq!(gate.dimension().unwrap(), Some(2));

        // The same content is no longer a duplicate
        let decision = gate.evaluate("first accepted memory", &[1.0, 0.0], None).unwrap();
        assert!(decision.accepted);
    }
}
