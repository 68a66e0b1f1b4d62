//! Classifiers
//!
//! - [`KeywordClassifier`]: rule-based. Each category owns a keyword list and
//!   its confidence grows with the number of distinct keywords found in the
//!   text (`1 - 0.5^hits`). One hit gives 0.5, two give 0.75, none give 0.
//! - [`EmbeddingClassifier`]: model-based. A category's confidence is the best
//!   cosine similarity between the text and that category's seed phrases,
//!   using the engine's embedding provider.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use memgate_core::{
    cosine_similarity, Classification, ClassifierProvider, EmbeddingProvider, Error, Result,
};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    categories: BTreeMap<String, Vec<String>>,
}

impl KeywordClassifier {
    pub fn new(categories: BTreeMap<String, Vec<String>>) -> Self {
        let categories = categories
            .into_iter()
            .map(|(name, keywords)| {
                let mut keywords: Vec<String> = keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                keywords.sort();
                keywords.dedup();
                (name, keywords)
            })
            .collect();
        Self { categories }
    }

    /// Category names, sorted
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn score(&self, text: &str) -> Classification {
        let text = text.to_lowercase();
        self.categories
            .iter()
            .map(|(name, keywords)| {
                let hits = keywords.iter().filter(|k| text.contains(k.as_str())).count();
                (name.clone(), 1.0 - 0.5f32.powi(hits as i32))
            })
            .collect()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        let categories = [
            (
                "personal",
                &[
                    "my name", "i live", "born", "birthday", "family", "sister", "brother",
                    "mother", "father", "wife", "husband", "friend", "work as",
                ][..],
            ),
            (
                "preference",
                &["like", "love", "prefer", "favorite", "favourite", "hate", "enjoy", "allergic"][..],
            ),
            (
                "task",
                &["need to", "have to", "todo", "remind", "deadline", "finish", "must"][..],
            ),
            (
                "event",
                &[
                    "meeting", "appointment", "tomorrow", "tonight", "next week", "flight",
                    "party", "trip", "monday", "tuesday", "wednesday", "thursday", "friday",
                    "saturday", "sunday",
                ][..],
            ),
        ]
        .into_iter()
        .map(|(name, keywords)| {
            (
                name.to_string(),
                keywords.iter().map(|k| k.to_string()).collect(),
            )
        })
        .collect();

        Self::new(categories)
    }
}

#[async_trait]
impl ClassifierProvider for KeywordClassifier {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn classify(&self, text: &str) -> Result<Classification> {
        Ok(self.score(text))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding classifier
// ─────────────────────────────────────────────────────────────────────────────

type SeedVectors = Vec<(String, Vec<Vec<f32>>)>;

/// Scores categories by similarity to example phrases.
///
/// Seed phrases are embedded on first use and reused afterwards. Negative
/// similarities count as 0.
pub struct EmbeddingClassifier {
    embedder: Arc<dyn EmbeddingProvider>,
    seeds: BTreeMap<String, Vec<String>>,
    seed_vectors: OnceLock<SeedVectors>,
}

impl EmbeddingClassifier {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, seeds: BTreeMap<String, Vec<String>>) -> Self {
        let seeds = seeds
            .into_iter()
            .map(|(name, phrases)| {
                let phrases: Vec<String> = phrases
                    .iter()
                    .map(|p| p.trim().to_string())
                    .filter(|p| !p.is_empty())
                    .collect();
                (name, phrases)
            })
            .filter(|(_, phrases)| !phrases.is_empty())
            .collect();

        Self {
            embedder,
            seeds,
            seed_vectors: OnceLock::new(),
        }
    }

    /// Built-in seed phrases for `personal`, `preference`, `task` and `event`
    pub fn with_default_seeds(embedder: Arc<dyn EmbeddingProvider>) -> Self {
        let seeds = [
            (
                "personal",
                &[
                    "my name is", "I live in", "my sister", "my brother", "my family",
                    "I work as", "my birthday is",
                ][..],
            ),
            (
                "preference",
                &["I like", "I love", "I prefer", "my favourite", "I hate", "I enjoy", "I am allergic to"][..],
            ),
            (
                "task",
                &["I need to", "I have to", "remind me to", "the deadline is", "I must finish"][..],
            ),
            (
                "event",
                &[
                    "I have a meeting", "my appointment is", "tomorrow", "next week", "my flight is",
                    "the party is on",
                ][..],
            ),
        ]
        .into_iter()
        .map(|(name, phrases)| {
            (
                name.to_string(),
                phrases.iter().map(|p| p.to_string()).collect(),
            )
        })
        .collect();

        Self::new(embedder, seeds)
    }

    /// Category names, sorted
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.seeds.keys().map(String::as_str)
    }

    async fn seed_vectors(&self) -> Result<&SeedVectors> {
        if let Some(vectors) = self.seed_vectors.get() {
            return Ok(vectors);
        }

        let mut computed = Vec::with_capacity(self.seeds.len());
        for (category, phrases) in &self.seeds {
            let phrases: Vec<&str> = phrases.iter().map(String::as_str).collect();
            let vectors = self.embedder.embed_many(&phrases).await.map_err(|e| {
                Error::Classification(format!("Failed to embed seeds for {}: {}", category, e))
            })?;
            computed.push((category.clone(), vectors));
        }
        debug!(
            embedder = self.embedder.name(),
            categories = computed.len(),
            "Embedded classifier seed phrases"
        );

        Ok(self.seed_vectors.get_or_init(|| computed))
    }
}

#[async_trait]
impl ClassifierProvider for EmbeddingClassifier {
    fn name(&self) -> &str {
        "embedding"
    }

    async fn classify(&self, text: &str) -> Result<Classification> {
        let vector = self
            .embedder
            .embed(text)
            .await
            .map_err(|e| Error::Classification(format!("Failed to embed text: {}", e)))?;
        let seeds = self.seed_vectors().await?;

        Ok(seeds
            .iter()
            .map(|(category, vectors)| {
                let best = vectors
                    .iter()
                    .map(|seed| cosine_similarity(&vector, seed))
                    .fold(0.0f32, f32::max);
                (category.clone(), best.min(1.0))
            })
            .collect())
    }
}
