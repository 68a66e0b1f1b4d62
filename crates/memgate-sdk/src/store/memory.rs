//! Process-local vector store

use std::sync::RwLock;

use async_trait::async_trait;
use memgate_core::{Error, MemoryRecord, Metadata, NewMemoryRecord, Result, SearchResult, VectorStore};
use uuid::Uuid;

use super::{content_hash, merge_metadata, rank};

struct StoredRecord {
    hash: String,
    record: MemoryRecord,
}

/// Keeps records in insertion order for the life of the process
#[derive(Default)]
pub struct InMemoryVectorStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upsert(&self, record: NewMemoryRecord) -> Result<String> {
        let hash = content_hash(&record.content);
        let mut records = self.records.write().map_err(|_| Error::LockPoisoned)?;

        if let Some(existing) = records.iter_mut().find(|r| r.hash == hash) {
            merge_metadata(&mut existing.record.metadata, record.metadata);
            return Ok(existing.record.id.clone());
        }

        let id = Uuid::new_v4().to_string();
        records.push(StoredRecord {
            hash,
            record: record.into_record(id.clone()),
        });
        Ok(id)
    }

    async fn search(&self, vector: &[f32], top_k: usize, min_score: f32) -> Result<Vec<SearchResult>> {
        let records = self.records.read().map_err(|_| Error::LockPoisoned)?;
        Ok(rank(
            records
                .iter()
                .map(|r| &r.record)
                .filter(|r| r.embedding.len() == vector.len()),
            vector,
            top_k,
            min_score,
        ))
    }

    async fn get(&self, id: &str) -> Result<Option<MemoryRecord>> {
        let records = self.records.read().map_err(|_| Error::LockPoisoned)?;
        Ok(records.iter().find(|r| r.record.id == id).map(|r| r.record.clone()))
    }

    async fn augment_metadata(&self, id: &str, metadata: Metadata) -> Result<bool> {
        let mut records = self.records.write().map_err(|_| Error::LockPoisoned)?;
        match records.iter_mut().find(|r| r.record.id == id) {
            Some(existing) => {
                merge_metadata(&mut existing.record.metadata, metadata);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn recent(&self, limit: usize) -> Result<Vec<MemoryRecord>> {
        let records = self.records.read().map_err(|_| Error::LockPoisoned)?;
        Ok(records.iter().rev().take(limit).map(|r| r.record.clone()).collect())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().map_err(|_| Error::LockPoisoned)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use memgate_core::MemorySource;
    use serde_json::json;

    fn new_record(content: &str, embedding: Vec<f32>) -> NewMemoryRecord {
        NewMemoryRecord {
            content: content.into(),
            embedding,
            source: MemorySource::User,
            metadata: Metadata::new(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let store = InMemoryVectorStore::new();
        let id = store.upsert(new_record("my sister lives in Oslo", vec![1.0, 0.0])).await.unwrap();

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.content, "my sister lives in Oslo");
        assert_eq!(store.count().await.unwrap(), 1);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_content_returns_existing_id() {
        let store = InMemoryVectorStore::new();
        let first = store.upsert(new_record("remember my name is Ada", vec![1.0, 0.0])).await.unwrap();

        let mut again = new_record("remember my name is Ada", vec![1.0, 0.0]);
        again.metadata.insert("session_id".into(), json!("s-2"));
        let second = store.upsert(again).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.count().await.unwrap(), 1);
        let record = store.get(&first).await.unwrap().unwrap();
        assert_eq!(record.metadata["session_id"], "s-2");
    }

    #[tokio::test]
    async fn test_search_ranks_by_similarity() {
        let store = InMemoryVectorStore::new();
        store.upsert(new_record("a", vec![0.0, 1.0])).await.unwrap();
        store.upsert(new_record("b", vec![1.0, 0.1])).await.unwrap();
        store.upsert(new_record("c", vec![1.0, 1.0])).await.unwrap();

        let results = store.search(&[1.0, 0.0], 2, 0.0).await.unwrap();
        let contents: Vec<_> = results.iter().map(|r| r.memory.content.as_str()).collect();
        assert_eq!(contents, vec!["b", "c"]);
        assert!(results[0].score > results[1].score);

        let filtered = store.search(&[1.0, 0.0], 5, 0.9).await.unwrap();
        assert_eq!(filtered.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_is_newest_first() {
        let store = InMemoryVectorStore::new();
        for content in ["first memory", "second memory", "third memory"] {
            store.upsert(new_record(content, vec![1.0, 0.0])).await.unwrap();
        }
        // re-storing identical content keeps its original position
        store.upsert(new_record("first memory", vec![1.0, 0.0])).await.unwrap();

        let recent = store.recent(2).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|r| r.content.as_str()).collect();
        assert_eq!(contents, vec!["third memory", "second memory"]);
        assert!(store.recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_augment_metadata() {
        let store = InMemoryVectorStore::new();
        let id = store.upsert(new_record("a memory", vec![1.0])).await.unwrap();

        let mut extra = Metadata::new();
        extra.insert("topic".into(), json!("travel"));
        assert!(store.augment_metadata(&id, extra.clone()).await.unwrap());
        assert!(!store.augment_metadata("missing", extra).await.unwrap());

        let record = store.get(&id).await.unwrap().unwrap();
        assert_eq!(record.metadata["topic"], "travel");
    }
}
