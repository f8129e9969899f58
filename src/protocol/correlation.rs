//! Request/response correlation between agents.
//!
//! A request is published on the recipient's topic; the responder stores its
//! reply in the shared key-value store under `response:{correlation_id}` with
//! a 60-second expiry. The requester waits on a promise registered per
//! correlation id, fulfilled by the first matching response and cancelled at
//! the 30-second cap. The key contract is unchanged: the first successful
//! read deletes the key (at-most-once consumption), and a reply that lands
//! after the timeout is orphaned until its own TTL expires. A timeout is not
//! an error: the caller must treat `None` as "unknown", never as failure.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Map, Value};
use tokio::sync::oneshot;

use crate::config::CollaborationConfig;
use crate::error::Result;
use crate::infra::{Broker, KvStore};

use super::message::{response_key, AgentMessage};

/// Correlation hub shared by every agent in the process.
pub struct CollaborationHub {
    kv: Arc<dyn KvStore>,
    broker: Arc<dyn Broker>,
    waiters: Mutex<HashMap<String, oneshot::Sender<()>>>,
    response_timeout: Duration,
    response_ttl_seconds: u64,
}

impl CollaborationHub {
    pub fn new(kv: Arc<dyn KvStore>, broker: Arc<dyn Broker>, config: &CollaborationConfig) -> Self {
        Self {
            kv,
            broker,
            waiters: Mutex::new(HashMap::new()),
            response_timeout: Duration::from_secs(config.response_timeout_seconds),
            response_ttl_seconds: config.response_ttl_seconds,
        }
    }

    /// Publish a correlated request to another agent. Returns the
    /// correlation id to wait on.
    pub async fn send(
        &self,
        sender: &str,
        receiver: &str,
        message_type: &str,
        content: Map<String, Value>,
    ) -> Result<String> {
        let message = AgentMessage::request(sender, receiver, message_type, content);
        let correlation_id = message
            .correlation_id
            .clone()
            .ok_or_else(|| crate::error::Error::Other("request without correlation id".into()))?;

        self.publish(&message).await?;
        Ok(correlation_id)
    }

    /// Publish a message on the recipient's topic. Fire-and-forget beyond
    /// broker delivery.
    pub async fn publish(&self, message: &AgentMessage) -> Result<()> {
        self.broker
            .publish(&message.topic(), serde_json::to_value(message)?)
            .await
    }

    /// Wait for the response to a correlation id, up to the configured cap.
    pub async fn await_response(&self, correlation_id: &str) -> Result<Option<Map<String, Value>>> {
        self.await_response_for(correlation_id, self.response_timeout)
            .await
    }

    /// Wait for the response to a correlation id with an explicit timeout.
    pub async fn await_response_for(
        &self,
        correlation_id: &str,
        timeout: Duration,
    ) -> Result<Option<Map<String, Value>>> {
        let key = response_key(correlation_id);

        // The reply may have landed before we started waiting.
        if let Some(found) = self.consume(&key).await? {
            return Ok(Some(found));
        }

        let (tx, rx) = oneshot::channel();
        self.waiters
            .lock()
            .unwrap()
            .insert(correlation_id.to_string(), tx);

        let outcome = tokio::time::timeout(timeout, rx).await;
        self.waiters.lock().unwrap().remove(correlation_id);

        match outcome {
            Ok(_) => self.consume(&key).await,
            // Late replies stay in the store until TTL expiry; the requester
            // drops them silently.
            Err(_) => {
                tracing::debug!(correlation_id, "response wait timed out");
                Ok(None)
            }
        }
    }

    /// Send a request and wait for its response. The collaboration
    /// primitive agents use for cross-role questions; `None` means the
    /// peer did not answer in time.
    pub async fn collaborate(
        &self,
        sender: &str,
        receiver: &str,
        message_type: &str,
        content: Map<String, Value>,
    ) -> Result<Option<Map<String, Value>>> {
        let correlation_id = self.send(sender, receiver, message_type, content).await?;
        self.await_response(&correlation_id).await
    }

    /// Store a response under `response:{correlation_id}` and wake the
    /// waiter, if one is registered.
    pub async fn fulfill(&self, correlation_id: &str, response: &Map<String, Value>) -> Result<()> {
        let key = response_key(correlation_id);
        self.kv
            .set_ex(&key, Value::Object(response.clone()), self.response_ttl_seconds)
            .await?;

        if let Some(tx) = self.waiters.lock().unwrap().remove(correlation_id) {
            let _ = tx.send(());
        }
        Ok(())
    }

    /// First successful read deletes the key.
    async fn consume(&self, key: &str) -> Result<Option<Map<String, Value>>> {
        match self.kv.get(key).await? {
            Some(value) => {
                self.kv.del(key).await?;
                Ok(value.as_object().cloned())
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{MemoryBroker, MemoryKv};
    use serde_json::json;

    fn hub() -> Arc<CollaborationHub> {
        Arc::new(CollaborationHub::new(
            Arc::new(MemoryKv::new()),
            Arc::new(MemoryBroker::new()),
            &CollaborationConfig::default(),
        ))
    }

    fn reply(status: &str) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("status".to_string(), json!(status));
        map
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_returns_none() {
        let hub = hub();

        // Nothing ever fulfills this id; the wait gives up at the 30s cap.
        let got = hub.await_response("moderator_engine_none").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_response_is_consumed_once() {
        let hub = hub();

        hub.fulfill("id-1", &reply("ok")).await.unwrap();

        let first = hub.await_response("id-1").await.unwrap();
        assert_eq!(first.unwrap().get("status"), Some(&json!("ok")));

        // The slot was deleted on read.
        let kv_left = hub.kv.get(&response_key("id-1")).await.unwrap();
        assert!(kv_left.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fulfill_wakes_waiter() {
        let hub = hub();

        let waiter = {
            let hub = hub.clone();
            tokio::spawn(async move { hub.await_response("id-2").await })
        };
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(5)).await;
        hub.fulfill("id-2", &reply("done")).await.unwrap();

        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.unwrap().get("status"), Some(&json!("done")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_is_orphaned() {
        let hub = hub();

        let got = hub.await_response("id-3").await.unwrap();
        assert!(got.is_none());

        // A reply landing after the cap is left for TTL expiry.
        hub.fulfill("id-3", &reply("late")).await.unwrap();
        assert!(hub.kv.get(&response_key("id-3")).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(hub.kv.get(&response_key("id-3")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_send_publishes_on_receiver_topic() {
        let kv = Arc::new(MemoryKv::new());
        let broker = Arc::new(MemoryBroker::new());
        let hub = CollaborationHub::new(kv, broker.clone(), &CollaborationConfig::default());

        let mut sub = broker.subscribe("agent-engine", "engine-group").await.unwrap();

        let correlation_id = hub
            .send("moderator", "engine", "generate_recommendations", Map::new())
            .await
            .unwrap();

        let delivered = sub.recv().await.unwrap();
        let message: AgentMessage = serde_json::from_value(delivered).unwrap();
        assert_eq!(message.correlation_id, Some(correlation_id));
        assert_eq!(message.receiver, "engine");
    }
}
