//! Service assembly: wires infrastructure, agents and the orchestrator,
//! and runs the background loops.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::sleep;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::infra::{
    Broker, ChatCompletion, HttpCompletion, LlmClassifier, MemoryBroker, MemoryDocs, MemoryIndex,
    MemoryKv,
};
use crate::moderation::ModerationAgent;
use crate::orchestrator::report::StaticTelemetry;
use crate::orchestrator::Orchestrator;
use crate::personalization::{PersonalizationAgent, UserProfiler};
use crate::protocol::CollaborationHub;
use crate::agent::AgentRuntime;

/// Retry delay after a failed background cycle.
const RETRY_DELAY: Duration = Duration::from_secs(3600);

/// The assembled agent service.
pub struct AgentSystem {
    settings: Settings,
    broker: Arc<dyn Broker>,
    hub: Arc<CollaborationHub>,
    moderator: Arc<ModerationAgent>,
    engine: Arc<PersonalizationAgent>,
    orchestrator: Arc<Orchestrator>,
}

impl AgentSystem {
    /// Build the system against the configured HTTP completion provider.
    pub fn new(settings: Settings) -> Result<Self> {
        let completion: Arc<dyn ChatCompletion> = Arc::new(HttpCompletion::new(&settings.llm)?);
        Ok(Self::with_completion(settings, completion))
    }

    /// Build the system with an injected completion provider.
    pub fn with_completion(settings: Settings, completion: Arc<dyn ChatCompletion>) -> Self {
        let kv = Arc::new(MemoryKv::new());
        let broker: Arc<dyn Broker> = Arc::new(MemoryBroker::new());
        let hub = Arc::new(CollaborationHub::new(
            kv.clone(),
            broker.clone(),
            &settings.collaboration,
        ));

        let classifiers = Arc::new(LlmClassifier::new(completion.clone()));
        let moderator = Arc::new(ModerationAgent::new(
            classifiers,
            completion.clone(),
            settings.thresholds,
        ));

        let engine = Arc::new(PersonalizationAgent::new(
            UserProfiler::new(kv, settings.profiles.clone()),
            Arc::new(MemoryIndex::new()),
            Arc::new(MemoryDocs::new()),
            completion.clone(),
        ));

        let orchestrator = Arc::new(Orchestrator::new(
            completion,
            Arc::new(StaticTelemetry),
            settings.conversation.clone(),
        ));

        Self {
            settings,
            broker,
            hub,
            moderator,
            engine,
            orchestrator,
        }
    }

    pub fn hub(&self) -> Arc<CollaborationHub> {
        self.hub.clone()
    }

    pub fn moderator(&self) -> Arc<ModerationAgent> {
        self.moderator.clone()
    }

    pub fn engine(&self) -> Arc<PersonalizationAgent> {
        self.engine.clone()
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator> {
        self.orchestrator.clone()
    }

    /// Run the service until ctrl-c.
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting ConnectSphere agent system");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        self.spawn_runtime(self.moderator.clone())?;
        self.spawn_runtime(self.engine.clone())?;

        let monitoring = self.settings.monitoring.clone();

        // Health monitor.
        {
            let moderator = self.moderator.clone();
            let mut shutdown = shutdown_rx.clone();
            let interval = Duration::from_secs(monitoring.health_interval_seconds);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = sleep(interval) => {
                            let stats = moderator.stats();
                            tracing::info!(
                                analyzed = stats.total_analyzed,
                                approved = stats.approved,
                                flagged = stats.flagged,
                                rejected = stats.rejected,
                                "system health check"
                            );
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            });
        }

        // Periodic daily report.
        {
            let orchestrator = self.orchestrator.clone();
            let mut shutdown = shutdown_rx.clone();
            let interval = Duration::from_secs(monitoring.report_interval_seconds);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = sleep(interval) => {
                            match orchestrator.daily_report().await {
                                Ok(report) => {
                                    tracing::info!(summary = %report.executive_summary, "daily report generated");
                                }
                                Err(e) => {
                                    tracing::error!("daily report failed: {}", e);
                                    sleep(RETRY_DELAY).await;
                                }
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            });
        }

        // Periodic platform optimization.
        {
            let orchestrator = self.orchestrator.clone();
            let mut shutdown = shutdown_rx.clone();
            let interval = Duration::from_secs(monitoring.optimize_interval_seconds);
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = sleep(interval) => {
                            match orchestrator.optimize_platform().await {
                                Ok(outcome) => {
                                    for action in &outcome.actions {
                                        tracing::info!(kind = %action.kind, status = %action.status, "applying optimization action");
                                    }
                                }
                                Err(e) => {
                                    tracing::error!("platform optimization failed: {}", e);
                                    sleep(RETRY_DELAY).await;
                                }
                            }
                        }
                        _ = shutdown.changed() => break,
                    }
                }
            });
        }

        tracing::info!("Agent system is running");
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| Error::Other(format!("signal handler failed: {}", e)))?;

        tracing::info!("Shutting down agent system");
        let _ = shutdown_tx.send(true);
        Ok(())
    }

    /// Spawn an agent's mailbox loop and a drain for its failure channel.
    fn spawn_runtime(&self, handler: Arc<dyn crate::agent::MessageHandler>) -> Result<()> {
        let name = handler.name().to_string();
        let (runtime, mut failures) = AgentRuntime::new(handler, self.broker.clone(), self.hub.clone());

        tokio::spawn(async move {
            while let Some(failure) = failures.recv().await {
                tracing::warn!(
                    agent = %failure.agent,
                    message_type = %failure.message_type,
                    error = %failure.error,
                    "handler failure"
                );
            }
        });

        tokio::spawn(async move {
            if let Err(e) = runtime.run().await {
                tracing::error!(agent = %name, "mailbox loop died: {}", e);
            }
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::llm::testing::ScriptedCompletion;
    use serde_json::{json, Map};

    #[tokio::test]
    async fn test_system_wires_agents_end_to_end() {
        let completion = Arc::new(ScriptedCompletion::new(vec![r#"{"toxicity_score": 0.0}"#]));
        let system = AgentSystem::with_completion(Settings::default(), completion);

        system.spawn_runtime(system.moderator()).unwrap();
        tokio::task::yield_now().await;

        let mut content = Map::new();
        content.insert("id".to_string(), json!("c1"));
        content.insert("text".to_string(), json!("a normal post"));

        let correlation_id = system
            .hub()
            .send("caller", "ContentModerator", "moderate_content", content)
            .await
            .unwrap();

        let response = system.hub().await_response(&correlation_id).await.unwrap().unwrap();
        assert_eq!(response.get("content_id"), Some(&json!("c1")));
        assert!(response.contains_key("action"));
    }
}
