//! Vector store backends
//!
//! Both backends score candidates by brute-force cosine similarity over the
//! records of one collection. Re-adding content that is already stored in the
//! collection (same SHA-256 content hash) returns the existing id and merges
//! the new metadata into it.

mod memory;
mod sqlite;

pub use memory::InMemoryVectorStore;
pub use sqlite::SqliteVectorStore;

use std::cmp::Ordering;

use memgate_core::{cosine_similarity, Error, MemoryRecord, Metadata, SearchResult};
use sha2::{Digest, Sha256};

/// SHA-256 of the content as lowercase hex
pub fn content_hash(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

pub(crate) fn db_error(err: rusqlite::Error) -> Error {
    Error::Store(format!("sqlite: {}", err))
}

/// Score `records` against `vector`, keep those ≥ `min_score`, best first.
/// Equal scores keep iteration order.
pub(crate) fn rank<'a>(
    records: impl Iterator<Item = &'a MemoryRecord>,
    vector: &[f32],
    top_k: usize,
    min_score: f32,
) -> Vec<SearchResult> {
    if top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(&MemoryRecord, f32)> = records
        .map(|record| (record, cosine_similarity(&record.embedding, vector)))
        .filter(|(_, score)| *score >= min_score)
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);

    scored
        .into_iter()
        .map(|(record, score)| SearchResult {
            memory: record.clone(),
            score,
        })
        .collect()
}

/// Overwrite keys of `target` with those of `update`
pub(crate) fn merge_metadata(target: &mut Metadata, update: Metadata) {
    for (key, value) in update {
        target.insert(key, value);
    }
}
