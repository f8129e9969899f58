//! Key-value store boundary: `SET key value EX seconds`, `GET`, `DEL`.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::Result;

/// Key-value store with per-key expiry.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Store a value under a key with a TTL in seconds.
    async fn set_ex(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()>;

    /// Fetch a value. Expired keys read as absent.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn del(&self, key: &str) -> Result<()>;
}

/// In-memory store with real expiry, for local runs and tests.
#[derive(Default)]
pub struct MemoryKv {
    entries: Mutex<HashMap<String, (Value, Instant)>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn set_ex(&self, key: &str, value: Value, ttl_seconds: u64) -> Result<()> {
        let deadline = Instant::now() + Duration::from_secs(ttl_seconds);
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), (value, deadline));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.entries.lock().unwrap();

        let expired = matches!(entries.get(key), Some((_, deadline)) if *deadline <= Instant::now());
        if expired {
            entries.remove(key);
            return Ok(None);
        }

        Ok(entries.get(key).map(|(value, _)| value.clone()))
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_set_get_del() {
        let kv = MemoryKv::new();

        kv.set_ex("k", json!({"a": 1}), 60).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some(json!({"a": 1})));

        kv.del("k").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), None);

        // deleting again is fine
        kv.del("k").await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry() {
        let kv = MemoryKv::new();

        kv.set_ex("k", json!("v"), 60).await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;
        assert!(kv.get("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(kv.get("k").await.unwrap().is_none());
    }
}
