//! Engine entry point
//!
//! [`Memgate`] turns a [`MemgateConfig`] into live providers once and hands out
//! one shared [`MemoryOrchestrator`] per collection.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use memgate_core::{ClassifierProvider, EmbeddingProvider, Error, MemoryGate, MemoryOrchestrator, Result};
use tracing::info;

use crate::config::MemgateConfig;
use crate::registry::{build_classifier, build_embedder, build_store, ProviderSelection};
use crate::session::Session;

/// memgate engine
///
/// # Example
///
/// ```rust,no_run
/// use memgate_core::{MemorySource, Metadata, SearchQuery};
/// use memgate_sdk::{Memgate, MemgateConfig};
///
/// async fn example() -> memgate_core::Result<()> {
///     let memgate = Memgate::new(MemgateConfig::load()?)?;
///     let memories = memgate.default_collection()?;
///
///     memories
///         .add_memory("My sister lives in Oslo", MemorySource::User, Metadata::new())
///         .await?;
///
///     let hits = memories
///         .search_memory(&SearchQuery::new("where does my sister live", 3))
///         .await?;
///     Ok(())
/// }
/// ```
pub struct Memgate {
    config: MemgateConfig,
    providers: ProviderSelection,
    embedder: Arc<dyn EmbeddingProvider>,
    classifier: Option<Arc<dyn ClassifierProvider>>,
    collections: Mutex<HashMap<String, Arc<MemoryOrchestrator>>>,
}

impl Memgate {
    /// Validate the config and construct every provider.
    ///
    /// # Errors
    ///
    /// - `Error::Config` for invalid values
    /// - `Error::UnsupportedProvider` for unknown provider names
    pub fn new(config: MemgateConfig) -> Result<Self> {
        config.validate()?;

        let providers =
            ProviderSelection::resolve(&config.embedding, &config.classifier, &config.store)?;
        let embedder = build_embedder(providers.embedding, &config.embedding)?;
        let classifier = build_classifier(providers.classifier, &config.classifier, &embedder)?;

        if let Some(dim) = config.gate.embedding_dim {
            if dim != embedder.dimensions() {
                return Err(Error::Config(format!(
                    "gate.embedding_dim is {} but the {} provider produces {} dimensions",
                    dim,
                    embedder.name(),
                    embedder.dimensions()
                )));
            }
        }

        info!(
            embedding = %providers.embedding,
            classifier = providers.classifier.map(|c| c.as_str()).unwrap_or("none"),
            store = %providers.store,
            "memgate engine ready"
        );

        Ok(Self {
            config,
            providers,
            embedder,
            classifier,
            collections: Mutex::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &MemgateConfig {
        &self.config
    }

    pub fn providers(&self) -> ProviderSelection {
        self.providers
    }

    /// Orchestrator for `name`, created on first use
    pub fn collection(&self, name: &str) -> Result<Arc<MemoryOrchestrator>> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Config("collection name must not be empty".into()));
        }

        let mut collections = self.collections.lock().map_err(|_| Error::LockPoisoned)?;
        if let Some(existing) = collections.get(name) {
            return Ok(Arc::clone(existing));
        }

        let orchestrator = Arc::new(self.build_orchestrator(name)?);
        collections.insert(name.to_string(), Arc::clone(&orchestrator));
        info!(collection = name, "Opened collection");
        Ok(orchestrator)
    }

    /// Orchestrator for `store.default_collection`
    pub fn default_collection(&self) -> Result<Arc<MemoryOrchestrator>> {
        self.collection(&self.config.store.default_collection)
    }

    /// Start a conversation against `collection` (default collection if `None`)
    pub fn session(&self, collection: Option<&str>) -> Result<Session> {
        let name = collection.unwrap_or(&self.config.store.default_collection);
        Ok(Session::new(name, self.collection(name)?))
    }

    /// Names of collections opened so far
    pub fn open_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.lock().map_err(|_| Error::LockPoisoned)?;
        let mut names: Vec<String> = collections.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    fn build_orchestrator(&self, collection: &str) -> Result<MemoryOrchestrator> {
        let mut gate_config = self.config.gate.clone();
        gate_config.embedding_dim.get_or_insert(self.embedder.dimensions());

        let gate = MemoryGate::new(gate_config)?;
        let store = build_store(self.providers.store, &self.config.store, collection)?;

        let orchestrator = MemoryOrchestrator::new(Arc::clone(&self.embedder), store, gate);
        Ok(match &self.classifier {
            Some(classifier) => orchestrator.with_classifier(Arc::clone(classifier)),
            None => orchestrator,
        })
    }
}
