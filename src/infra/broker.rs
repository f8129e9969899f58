//! Publish/consume broker boundary with consumer-group semantics.
//!
//! Topic per agent identity, at-least-once delivery assumed, no ordering
//! guarantee across topics. Each consumer group sees every message on its
//! topic once; a group has exactly one active member.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::error::{Error, Result};

/// Queue depth per consumer group before publishers start erroring.
const CHANNEL_CAPACITY: usize = 256;

/// A consumer-group membership on a topic.
pub struct Subscription {
    rx: mpsc::Receiver<Value>,
}

impl Subscription {
    /// Receive the next message. Returns `None` when the broker is gone.
    pub async fn recv(&mut self) -> Option<Value> {
        self.rx.recv().await
    }
}

/// Message broker boundary.
#[async_trait]
pub trait Broker: Send + Sync {
    /// Publish a payload on a topic. Fire-and-forget beyond broker delivery.
    async fn publish(&self, topic: &str, payload: Value) -> Result<()>;

    /// Join a consumer group on a topic. Subscribing a second member to the
    /// same group is an error: mailboxes are single-consumer.
    async fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription>;
}

/// In-process broker for local runs and tests.
///
/// Delivery starts at subscription time; messages published to a topic with
/// no groups are dropped.
#[derive(Default)]
pub struct MemoryBroker {
    // topic -> group -> sender
    topics: Mutex<HashMap<String, HashMap<String, mpsc::Sender<Value>>>>,
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Broker for MemoryBroker {
    async fn publish(&self, topic: &str, payload: Value) -> Result<()> {
        let senders: Vec<mpsc::Sender<Value>> = {
            let topics = self.topics.lock().unwrap();
            match topics.get(topic) {
                Some(groups) => groups.values().cloned().collect(),
                None => Vec::new(),
            }
        };

        if senders.is_empty() {
            tracing::debug!(topic, "no consumer groups, message dropped");
            return Ok(());
        }

        for sender in senders {
            sender
                .send(payload.clone())
                .await
                .map_err(|_| Error::Broker(format!("consumer for topic '{}' is gone", topic)))?;
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str, group: &str) -> Result<Subscription> {
        let mut topics = self.topics.lock().unwrap();
        let groups = topics.entry(topic.to_string()).or_default();

        if groups.contains_key(group) {
            return Err(Error::Broker(format!(
                "group '{}' already has a consumer on topic '{}'",
                group, topic
            )));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        groups.insert(group.to_string(), tx);
        tracing::debug!(topic, group, "consumer group joined");

        Ok(Subscription { rx })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_publish_and_consume() {
        let broker = MemoryBroker::new();
        let mut sub = broker.subscribe("agent-coder", "coder-group").await.unwrap();

        broker.publish("agent-coder", json!({"n": 1})).await.unwrap();
        broker.publish("agent-coder", json!({"n": 2})).await.unwrap();

        assert_eq!(sub.recv().await, Some(json!({"n": 1})));
        assert_eq!(sub.recv().await, Some(json!({"n": 2})));
    }

    #[tokio::test]
    async fn test_single_consumer_per_group() {
        let broker = MemoryBroker::new();
        let _sub = broker.subscribe("agent-coder", "coder-group").await.unwrap();

        let second = broker.subscribe("agent-coder", "coder-group").await;
        assert!(second.is_err());
    }

    #[tokio::test]
    async fn test_each_group_sees_every_message() {
        let broker = MemoryBroker::new();
        let mut a = broker.subscribe("agent-coder", "group-a").await.unwrap();
        let mut b = broker.subscribe("agent-coder", "group-b").await.unwrap();

        broker.publish("agent-coder", json!("hello")).await.unwrap();

        assert_eq!(a.recv().await, Some(json!("hello")));
        assert_eq!(b.recv().await, Some(json!("hello")));
    }

    #[tokio::test]
    async fn test_publish_without_consumers_is_dropped() {
        let broker = MemoryBroker::new();
        broker.publish("agent-nobody", json!(1)).await.unwrap();
    }
}
