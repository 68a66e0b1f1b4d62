//! memgate-core - Memory admission and orchestration engine
//!
//! Decides whether a piece of conversational text should become a persisted
//! long-term memory, and coordinates the embedding, classification,
//! deduplication and storage steps around that decision:
//!
//! - **types**: Memory records, search queries/results, gate decisions
//! - **config**: Gate thresholds and phrase lists
//! - **cache**: Bounded FIFO cache of recently accepted embeddings
//! - **gate**: The rule cascade producing accept/reject decisions
//! - **traits**: Embedding, classifier and vector store contracts
//! - **orchestrator**: `add_memory` / `search_memory` coordination
//!
//! ## Data flow
//!
//! ```text
//! add_memory(content)
//!     │
//!     ├─▶ EmbeddingProvider::embed
//!     ├─▶ ClassifierProvider::classify   (optional)
//!     ├─▶ MemoryGate::evaluate ──▶ reject ──▶ nothing stored
//!     │                        └─▶ accept ──▶ VectorStore::upsert
//!     ▼
//! AddOutcome
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gate;
pub mod orchestrator;
pub mod similarity;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use cache::{CachedEmbedding, RecentEmbeddingCache};
pub use config::GateConfig;
pub use error::{Error, Result};
pub use gate::MemoryGate;
pub use orchestrator::{AddOutcome, MemoryOrchestrator};
pub use similarity::cosine_similarity;
pub use traits::{ClassifierProvider, EmbeddingProvider, VectorStore};
pub use types::{
    Classification, DecisionReason, GateDecision, MemoryRecord, MemorySource, Metadata,
    NewMemoryRecord, SearchQuery, SearchResult,
};
