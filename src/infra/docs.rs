//! Document store boundary: get-by-id for user records.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a record by id.
    async fn get(&self, id: &str) -> Result<Option<Value>>;
}

/// In-memory document store for local runs and tests.
#[derive(Default)]
pub struct MemoryDocs {
    docs: Mutex<HashMap<String, Value>>,
}

impl MemoryDocs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: impl Into<String>, doc: Value) {
        self.docs.lock().unwrap().insert(id.into(), doc);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocs {
    async fn get(&self, id: &str) -> Result<Option<Value>> {
        Ok(self.docs.lock().unwrap().get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_by_id() {
        let docs = MemoryDocs::new();
        docs.insert("user_1", json!({"user_id": "user_1", "interests": ["music"]}));

        assert!(docs.get("user_1").await.unwrap().is_some());
        assert!(docs.get("user_2").await.unwrap().is_none());
    }
}
