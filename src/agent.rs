//! Agent runtime: mailbox loop and message dispatch.
//!
//! Each agent drains its own topic with single-consumer-group semantics.
//! A handler failure is isolated to its message: it is logged, reported on
//! the structured failure channel, and the loop keeps draining. Broker and
//! store failures are not caught here; they end the loop.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::mpsc;

use crate::error::Result;
use crate::infra::Broker;
use crate::protocol::{agent_topic, consumer_group, AgentMessage, CollaborationHub};

/// Role-specific message handler.
///
/// A handler maps an inbound message to an optional response record. An
/// unrecognized `message_type` yields no response and no error.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Agent identity; also names the topic and consumer group.
    fn name(&self) -> &str;

    /// Agent role, for logging and transcript bucketing.
    fn role(&self) -> &str;

    async fn handle(&self, message: &AgentMessage) -> Result<Option<Map<String, Value>>>;
}

/// One isolated per-message failure, observable by a harness.
#[derive(Debug, Clone)]
pub struct HandlerFailure {
    pub agent: String,
    pub message_type: String,
    pub correlation_id: Option<String>,
    pub error: String,
    pub timestamp: f64,
}

/// Mailbox loop for one agent.
pub struct AgentRuntime {
    handler: Arc<dyn MessageHandler>,
    broker: Arc<dyn Broker>,
    hub: Arc<CollaborationHub>,
    failures: mpsc::UnboundedSender<HandlerFailure>,
}

impl AgentRuntime {
    /// Create a runtime and the receiving end of its failure channel.
    pub fn new(
        handler: Arc<dyn MessageHandler>,
        broker: Arc<dyn Broker>,
        hub: Arc<CollaborationHub>,
    ) -> (Self, mpsc::UnboundedReceiver<HandlerFailure>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                handler,
                broker,
                hub,
                failures: tx,
            },
            rx,
        )
    }

    /// Drain the agent's mailbox until the broker goes away.
    ///
    /// Subscribing and response publishing are infrastructure: their errors
    /// propagate and are fatal to this loop.
    pub async fn run(&self) -> Result<()> {
        let topic = agent_topic(self.handler.name());
        let group = consumer_group(self.handler.name());
        let mut subscription = self.broker.subscribe(&topic, &group).await?;

        tracing::info!(agent = %self.handler.name(), role = %self.handler.role(), "mailbox loop started");

        while let Some(payload) = subscription.recv().await {
            self.dispatch(payload).await?;
        }

        tracing::info!(agent = %self.handler.name(), "mailbox loop ended");
        Ok(())
    }

    /// Handle one inbound payload. Only infrastructure errors bubble up.
    async fn dispatch(&self, payload: Value) -> Result<()> {
        let message: AgentMessage = match serde_json::from_value(payload) {
            Ok(message) => message,
            Err(e) => {
                self.report_failure("<decode>", None, &e.to_string());
                return Ok(());
            }
        };

        match self.handler.handle(&message).await {
            Ok(Some(response)) => {
                if let Some(correlation_id) = &message.correlation_id {
                    self.hub.fulfill(correlation_id, &response).await?;
                }
            }
            Ok(None) => {
                tracing::debug!(
                    agent = %self.handler.name(),
                    message_type = %message.message_type,
                    "message produced no response"
                );
            }
            Err(e) => {
                self.report_failure(
                    &message.message_type,
                    message.correlation_id.as_deref(),
                    &e.to_string(),
                );
            }
        }
        Ok(())
    }

    fn report_failure(&self, message_type: &str, correlation_id: Option<&str>, error: &str) {
        tracing::error!(
            agent = %self.handler.name(),
            message_type,
            error,
            "message handling failed"
        );
        let _ = self.failures.send(HandlerFailure {
            agent: self.handler.name().to_string(),
            message_type: message_type.to_string(),
            correlation_id: correlation_id.map(String::from),
            error: error.to_string(),
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0),
        });
    }
}
