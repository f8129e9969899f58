//! Message envelope for inter-agent communication.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::{SystemTime, UNIX_EPOCH};

/// Well-known message types. The set is open: agents ignore types they do
/// not recognize.
pub mod message_type {
    pub const MODERATE_CONTENT: &str = "moderate_content";
    pub const UPDATE_THRESHOLDS: &str = "update_thresholds";
    pub const GET_STATISTICS: &str = "get_statistics";
    pub const GENERATE_RECOMMENDATIONS: &str = "generate_recommendations";
}

/// Message format for inter-agent communication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Sender agent ID
    pub sender: String,
    /// Recipient agent ID
    pub receiver: String,
    /// Message type (enum-like string)
    pub message_type: String,
    /// Message payload
    pub content: Map<String, Value>,
    /// Send time, fractional seconds since the epoch
    pub timestamp: f64,
    /// Correlation ID for request/response chains
    pub correlation_id: Option<String>,
}

impl AgentMessage {
    /// Create a fire-and-forget message.
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        message_type: impl Into<String>,
        content: Map<String, Value>,
    ) -> Self {
        Self {
            sender: sender.into(),
            receiver: receiver.into(),
            message_type: message_type.into(),
            content,
            timestamp: unix_timestamp(),
            correlation_id: None,
        }
    }

    /// Create a request expecting a correlated response. Concurrent requests
    /// between the same pair of agents get distinct correlation ids.
    pub fn request(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        message_type: impl Into<String>,
        content: Map<String, Value>,
    ) -> Self {
        let sender = sender.into();
        let receiver = receiver.into();
        let correlation_id = format!("{}_{}_{}", sender, receiver, uuid::Uuid::new_v4());

        Self {
            sender,
            receiver,
            message_type: message_type.into(),
            content,
            timestamp: unix_timestamp(),
            correlation_id: Some(correlation_id),
        }
    }

    /// Topic this message is published on.
    pub fn topic(&self) -> String {
        agent_topic(&self.receiver)
    }
}

/// Topic carrying messages addressed to an agent.
pub fn agent_topic(agent_id: &str) -> String {
    format!("agent-{}", agent_id)
}

/// Consumer group for an agent's mailbox. One active member per group.
pub fn consumer_group(agent_id: &str) -> String {
    format!("{}-group", agent_id)
}

/// Key-value slot a responder writes its reply into.
pub fn response_key(correlation_id: &str) -> String {
    format!("response:{}", correlation_id)
}

fn unix_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}
