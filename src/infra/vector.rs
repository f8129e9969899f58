//! Vector similarity index boundary.
//!
//! The core only consumes ranked `(id, score, metadata)` triples; embedding
//! generation and nearest-neighbour search live behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Mutex;

use crate::error::Result;

/// One ranked match from the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorMatch {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Query for the `top_k` closest matches, optionally filtered on
    /// metadata equality.
    async fn query(
        &self,
        vector: &[f32],
        filter: Option<&Map<String, Value>>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>>;
}

/// In-memory index holding pre-ranked matches, for local runs and tests.
#[derive(Default)]
pub struct MemoryIndex {
    entries: Mutex<Vec<VectorMatch>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, entry: VectorMatch) {
        self.entries.lock().unwrap().push(entry);
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn query(
        &self,
        _vector: &[f32],
        filter: Option<&Map<String, Value>>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        let entries = self.entries.lock().unwrap();

        let mut matches: Vec<VectorMatch> = entries
            .iter()
            .filter(|m| match filter {
                Some(filter) => filter
                    .iter()
                    .all(|(k, v)| m.metadata.get(k) == Some(v)),
                None => true,
            })
            .cloned()
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(id: &str, score: f64, category: &str) -> VectorMatch {
        let mut metadata = Map::new();
        metadata.insert("category".to_string(), json!(category));
        VectorMatch {
            id: id.to_string(),
            score,
            metadata,
        }
    }

    #[tokio::test]
    async fn test_query_ranks_and_truncates() {
        let index = MemoryIndex::new();
        index.insert(entry("a", 0.5, "tech"));
        index.insert(entry("b", 0.9, "tech"));
        index.insert(entry("c", 0.7, "sports"));

        let matches = index.query(&[], None, 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "b");
        assert_eq!(matches[1].id, "c");
    }

    #[tokio::test]
    async fn test_query_filters_on_metadata() {
        let index = MemoryIndex::new();
        index.insert(entry("a", 0.5, "tech"));
        index.insert(entry("b", 0.9, "sports"));

        let mut filter = Map::new();
        filter.insert("category".to_string(), json!("tech"));

        let matches = index.query(&[], Some(&filter), 10).await.unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].id, "a");
    }
}
