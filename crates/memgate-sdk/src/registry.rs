//! Provider registry
//!
//! Maps the provider names found in configuration to concrete backends. The
//! set of names is closed: parsing happens once at engine construction and an
//! unknown (or not compiled-in) name fails immediately with the list of
//! supported names.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use memgate_core::{ClassifierProvider, EmbeddingProvider, Error, Result, VectorStore};
use tracing::debug;

use crate::classifier::{EmbeddingClassifier, KeywordClassifier};
use crate::config::{ClassifierSettings, EmbeddingSettings, StoreSettings};
use crate::embeddings::HashingEmbedder;
use crate::store::{InMemoryVectorStore, SqliteVectorStore};

/// Available embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProviderKind {
    /// Deterministic feature hashing, no model required
    Hashing,
    /// Local ONNX model via fastembed
    FastEmbed,
}

impl EmbeddingProviderKind {
    /// Names accepted by this build
    pub fn supported() -> &'static [&'static str] {
        if cfg!(feature = "fastembed") {
            &["hashing", "fastembed"]
        } else {
            &["hashing"]
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hashing => "hashing",
            Self::FastEmbed => "fastembed",
        }
    }
}

impl FromStr for EmbeddingProviderKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hashing" => Ok(Self::Hashing),
            "fastembed" if cfg!(feature = "fastembed") => Ok(Self::FastEmbed),
            _ => Err(Error::unsupported_provider("embedding", s, Self::supported())),
        }
    }
}

impl fmt::Display for EmbeddingProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Available classifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierKind {
    /// Keyword lists per category
    Keyword,
    /// Similarity to seed phrases under the engine's embedder
    Embedding,
}

impl ClassifierKind {
    pub const SUPPORTED: &'static [&'static str] = &["keyword", "embedding"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Keyword => "keyword",
            Self::Embedding => "embedding",
        }
    }
}

impl FromStr for ClassifierKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "embedding" | "ml" => Ok(Self::Embedding),
            _ => Err(Error::unsupported_provider("classifier", s, Self::SUPPORTED)),
        }
    }
}

impl fmt::Display for ClassifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Available vector stores
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    /// Process-local, lost on exit
    Memory,
    /// SQLite file shared by all collections
    Sqlite,
}

impl StoreKind {
    pub const SUPPORTED: &'static [&'static str] = &["memory", "sqlite"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Sqlite => "sqlite",
        }
    }
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(Error::unsupported_provider("vector store", s, Self::SUPPORTED)),
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Parsed provider selection for a whole engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderSelection {
    pub embedding: EmbeddingProviderKind,
    pub classifier: Option<ClassifierKind>,
    pub store: StoreKind,
}

impl ProviderSelection {
    /// Resolve every provider name, failing on the first unknown one
    pub fn resolve(
        embedding: &EmbeddingSettings,
        classifier: &ClassifierSettings,
        store: &StoreSettings,
    ) -> Result<Self> {
        let selection = Self {
            embedding: embedding.provider.parse()?,
            classifier: classifier
                .provider
                .as_deref()
                .map(str::parse::<ClassifierKind>)
                .transpose()?,
            store: store.provider.parse()?,
        };
        debug!(?selection, "Resolved providers");
        Ok(selection)
    }
}

/// Construct the configured embedding provider
pub fn build_embedder(
    kind: EmbeddingProviderKind,
    settings: &EmbeddingSettings,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match kind {
        EmbeddingProviderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(settings.dimensions)?)),
        #[cfg(feature = "fastembed")]
        EmbeddingProviderKind::FastEmbed => Ok(Arc::new(crate::embeddings::FastEmbedder::new(
            settings.model.as_deref(),
        )?)),
        #[cfg(not(feature = "fastembed"))]
        EmbeddingProviderKind::FastEmbed => Err(Error::unsupported_provider(
            "embedding",
            kind.as_str(),
            EmbeddingProviderKind::supported(),
        )),
    }
}

/// Construct the configured classifier, if any.
///
/// `settings.categories` holds keywords for the keyword classifier and seed
/// phrases for the embedding classifier; empty selects the built-ins.
pub fn build_classifier(
    kind: Option<ClassifierKind>,
    settings: &ClassifierSettings,
    embedder: &Arc<dyn EmbeddingProvider>,
) -> Result<Option<Arc<dyn ClassifierProvider>>> {
    match kind {
        None => Ok(None),
        Some(ClassifierKind::Keyword) => {
            let classifier = if settings.categories.is_empty() {
                KeywordClassifier::default()
            } else {
                KeywordClassifier::new(settings.categories.clone())
            };
            Ok(Some(Arc::new(classifier)))
        }
        Some(ClassifierKind::Embedding) => {
            let embedder = Arc::clone(embedder);
            let classifier = if settings.categories.is_empty() {
                EmbeddingClassifier::with_default_seeds(embedder)
            } else {
                EmbeddingClassifier::new(embedder, settings.categories.clone())
            };
            Ok(Some(Arc::new(classifier)))
        }
    }
}

/// Construct a store handle scoped to `collection`
pub fn build_store(
    kind: StoreKind,
    settings: &StoreSettings,
    collection: &str,
) -> Result<Arc<dyn VectorStore>> {
    match kind {
        StoreKind::Memory => Ok(Arc::new(InMemoryVectorStore::new())),
        StoreKind::Sqlite => Ok(Arc::new(SqliteVectorStore::open(&settings.path, collection)?)),
    }
}
