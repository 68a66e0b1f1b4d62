//! memgate SDK
//!
//! Everything needed to run the memory gate end to end on top of
//! `memgate-core`:
//!
//! - **config** - TOML configuration (`MemgateConfig`) and its lookup order
//! - **registry** - provider names → concrete backends
//! - **embeddings** - hashing embedder, optional local fastembed model
//! - **classifier** - keyword and embedding (seed phrase) classifiers
//! - **store** - in-memory and SQLite vector stores
//! - **engine** - `Memgate`, one orchestrator per collection
//! - **session** - per-conversation context and history
//!
//! # Example
//!
//! ```rust,no_run
//! use memgate_core::MemorySource;
//! use memgate_sdk::{Memgate, MemgateConfig};
//!
//! async fn example() -> memgate_core::Result<()> {
//!     let memgate = Memgate::new(MemgateConfig::load()?)?;
//!     let mut session = memgate.session(None)?;
//!
//!     session.record(MemorySource::User, "Remember that I'm allergic to peanuts").await?;
//!     let context = session.relevant_memories("what food should I avoid", 3).await?;
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod embeddings;
pub mod engine;
pub mod migrations;
pub mod registry;
pub mod session;
pub mod store;

pub use classifier::{EmbeddingClassifier, KeywordClassifier};
pub use config::{
    ClassifierSettings, ConfigValidationError, EmbeddingSettings, MemgateConfig, StoreSettings,
};
pub use embeddings::HashingEmbedder;
#[cfg(feature = "fastembed")]
pub use embeddings::FastEmbedder;
pub use engine::Memgate;
pub use registry::{ClassifierKind, EmbeddingProviderKind, ProviderSelection, StoreKind};
pub use session::{Session, Turn};
pub use store::{InMemoryVectorStore, SqliteVectorStore};
