//! Conversation sessions
//!
//! A [`Session`] is the explicit per-conversation context: it owns the recent
//! turn history and stamps every ingested turn with `{ts, session_id, role}`
//! metadata before handing it to the collection's orchestrator.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use memgate_core::{AddOutcome, MemoryOrchestrator, MemorySource, Metadata, Result, SearchQuery};
use serde_json::Value;
use uuid::Uuid;

/// Turns kept in the rolling history
pub const DEFAULT_HISTORY_WINDOW: usize = 8;

/// Similarity floor for memories recalled into a conversation
pub const RELEVANCE_MIN_SCORE: f32 = 0.7;

/// One message in the conversation
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: MemorySource,
    pub content: String,
    pub at: DateTime<Utc>,
}

pub struct Session {
    id: String,
    collection: String,
    orchestrator: Arc<MemoryOrchestrator>,
    history: VecDeque<Turn>,
    window: usize,
}

impl Session {
    pub fn new(collection: impl Into<String>, orchestrator: Arc<MemoryOrchestrator>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            collection: collection.into(),
            orchestrator,
            history: VecDeque::with_capacity(DEFAULT_HISTORY_WINDOW),
            window: DEFAULT_HISTORY_WINDOW,
        }
    }

    /// Keep at most `window` turns (minimum 1)
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Append a turn to the history and offer it to the gate
    pub async fn record(&mut self, role: MemorySource, text: &str) -> Result<AddOutcome> {
        let now = Utc::now();

        if !text.trim().is_empty() {
            self.history.push_back(Turn {
                role,
                content: text.to_string(),
                at: now,
            });
            if self.history.len() > self.window {
                self.history.pop_front();
            }
        }

        let mut metadata = Metadata::new();
        metadata.insert("ts".into(), Value::String(now.to_rfc3339()));
        metadata.insert("session_id".into(), Value::String(self.id.clone()));
        metadata.insert("role".into(), Value::String(role.as_str().to_string()));

        self.orchestrator.add_memory(text, role, metadata).await
    }

    /// Contents of stored memories relevant to `query`, best first
    pub async fn relevant_memories(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let query = SearchQuery::new(query, limit).with_min_score(RELEVANCE_MIN_SCORE);
        let results = self.orchestrator.search_memory(&query).await?;
        Ok(results.into_iter().map(|r| r.memory.content).collect())
    }

    /// History, oldest first
    pub fn recent_turns(&self) -> impl Iterator<Item = &Turn> {
        self.history.iter()
    }

    pub fn orchestrator(&self) -> &Arc<MemoryOrchestrator> {
        &self.orchestrator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Memgate, MemgateConfig};
    use memgate_core::{DecisionReason, GateConfig, VectorStore};

    fn engine() -> Memgate {
        Memgate::new(MemgateConfig::default().with_gate(GateConfig::conversational())).unwrap()
    }

    #[tokio::test]
    async fn test_record_stamps_metadata() {
        let memgate = engine();
        let mut session = memgate.session(None).unwrap();
        assert_eq!(session.collection(), "default");

        let outcome = session
            .record(MemorySource::User, "remember my dentist is Dr. Lee")
            .await
            .unwrap();
        assert_eq!(outcome.decision().unwrap().reason, DecisionReason::ForcedKeep);

        let stored = session
            .orchestrator()
            .store()
            .get(outcome.id().unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.metadata["session_id"], session.id());
        assert_eq!(stored.metadata["role"], "user");
        assert!(stored.metadata["ts"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_history_window() {
        let memgate = engine();
        let mut session = memgate.session(Some("chat")).unwrap().with_window(2);

        session.record(MemorySource::User, "ok").await.unwrap();
        session.record(MemorySource::Assistant, "Noted, anything else?").await.unwrap();
        session.record(MemorySource::User, "   ").await.unwrap();
        session.record(MemorySource::User, "I like green tea in the morning").await.unwrap();

        let turns: Vec<_> = session.recent_turns().map(|t| t.content.as_str()).collect();
        assert_eq!(turns, vec!["Noted, anything else?", "I like green tea in the morning"]);
    }

    #[tokio::test]
    async fn test_relevant_memories() {
        let memgate = engine();
        let mut session = memgate.session(None).unwrap();

        session
            .record(MemorySource::User, "My favourite hiking trail is in the Dolomites")
            .await
            .unwrap();
        session
            .record(MemorySource::User, "The quarterly report is due at the end of March")
            .await
            .unwrap();

        let memories = session
            .relevant_memories("My favourite hiking trail is in the Dolomites", 3)
            .await
            .unwrap();
        assert_eq!(memories, vec!["My favourite hiking trail is in the Dolomites".to_string()]);

        assert!(session.relevant_memories("anything", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sessions_share_collection_gate() {
        let memgate = engine();
        let mut first = memgate.session(None).unwrap();
        let mut second = memgate.session(None).unwrap();
        assert_ne!(first.id(), second.id());

        let text = "My sister lives in Oslo with her two cats";
        assert!(first.record(MemorySource::User, text).await.unwrap().is_stored());

        let outcome = second.record(MemorySource::User, text).await.unwrap();
        assert_eq!(outcome.decision().unwrap().reason, DecisionReason::Duplicate);
    }
}
