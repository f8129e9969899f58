//! Moderation agent: content analysis, threshold updates and statistics.

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::agent::MessageHandler;
use crate::error::Result;
use crate::infra::{ChatCompletion, ClassifierSuite};
use crate::parse::{self, RoleDefault};
use crate::protocol::message::message_type;
use crate::protocol::AgentMessage;

use super::analysis::{categorize, sentiment_of, ContentAnalysis, Sentiment};
use super::policy::{Action, DecisionPolicy, ModerationThresholds};

pub const AGENT_NAME: &str = "ContentModerator";
const ROLE: &str = "Content Safety and Moderation Specialist";

const MODERATOR_SYSTEM: &str = "You are a content safety and moderation specialist \
for the ConnectSphere platform. You analyze user-generated content for toxicity, \
misinformation and NSFW material, and give clear reasoning for every decision.";

/// Running moderation counters, served via `get_statistics`.
#[derive(Debug, Clone, Default)]
pub struct ModerationStats {
    pub total_analyzed: u64,
    pub approved: u64,
    pub flagged: u64,
    pub rejected: u64,
    toxicity_sum: f64,
}

impl ModerationStats {
    pub fn average_toxicity(&self) -> f64 {
        if self.total_analyzed == 0 {
            0.0
        } else {
            self.toxicity_sum / self.total_analyzed as f64
        }
    }

    fn record(&mut self, analysis: &ContentAnalysis) {
        self.total_analyzed += 1;
        self.toxicity_sum += analysis.toxicity_score;
        match analysis.action {
            Action::Approve => self.approved += 1,
            Action::Flag => self.flagged += 1,
            Action::Reject => self.rejected += 1,
        }
    }
}

/// Agent responsible for content moderation and safety.
pub struct ModerationAgent {
    classifiers: Arc<dyn ClassifierSuite>,
    completion: Arc<dyn ChatCompletion>,
    // Snapshot-swapped on update_thresholds; decisions never see a partial table.
    policy: RwLock<DecisionPolicy>,
    stats: Mutex<ModerationStats>,
}

impl ModerationAgent {
    pub fn new(
        classifiers: Arc<dyn ClassifierSuite>,
        completion: Arc<dyn ChatCompletion>,
        thresholds: ModerationThresholds,
    ) -> Self {
        Self {
            classifiers,
            completion,
            policy: RwLock::new(DecisionPolicy::new(thresholds)),
            stats: Mutex::new(ModerationStats::default()),
        }
    }

    pub fn stats(&self) -> ModerationStats {
        self.stats.lock().unwrap().clone()
    }

    pub fn thresholds(&self) -> ModerationThresholds {
        *self.policy.read().unwrap().thresholds()
    }

    /// Analyze a piece of content. Never fails: classifier or provider
    /// trouble downgrades to a flagged analysis with zeroed scores.
    pub async fn analyze_content(&self, content: &Map<String, Value>) -> ContentAnalysis {
        let content_id = content
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
            .to_string();
        let text = content.get("text").and_then(|v| v.as_str()).unwrap_or("");

        let analysis = match self.try_analyze(&content_id, text).await {
            Ok(analysis) => analysis,
            Err(e) => {
                tracing::error!(content_id = %content_id, "content analysis failed: {}", e);
                ContentAnalysis {
                    content_id,
                    toxicity_score: 0.0,
                    hate_speech_detected: false,
                    misinformation_score: 0.0,
                    nsfw_detected: false,
                    sentiment: Sentiment::Neutral,
                    categories: Vec::new(),
                    action: Action::Flag,
                    reasoning: format!("Error during analysis: {}", e),
                }
            }
        };

        self.stats.lock().unwrap().record(&analysis);
        tracing::info!(
            content_id = %analysis.content_id,
            action = %analysis.action,
            toxicity = analysis.toxicity_score,
            "content analyzed"
        );
        analysis
    }

    async fn try_analyze(&self, content_id: &str, text: &str) -> Result<ContentAnalysis> {
        let toxicity = self.classifiers.toxicity(text).await?;
        let misinformation = self.classifiers.misinformation(text).await?;
        let nsfw = self.classifiers.nsfw(text).await?;

        let prompt = format!(
            "Analyze the following content for moderation:\n\n\
             Content: {}\n\n\
             Signals: toxicity={:.2}, misinformation={:.2}, nsfw={:.2}\n\n\
             Provide detailed reasoning for the appropriate action \
             (approve/flag/reject).",
            text, toxicity.score, misinformation.score, nsfw.score
        );
        let reasoning = self.completion.complete(MODERATOR_SYSTEM, &prompt).await?;

        // A structured FLAGGED verdict in the model's reply (or its keyword
        // fallback) only ever escalates approve to flag; rejects stay a pure
        // function of the scores and the threshold table.
        let verdict = parse::parse_or_default(&reasoning, RoleDefault::Moderation);
        let model_flagged = verdict.get("status").and_then(|v| v.as_str()) == Some("FLAGGED");

        let action = self.policy.read().unwrap().decide(
            toxicity.score,
            misinformation.score,
            nsfw.detected,
            misinformation.needs_review || model_flagged,
        );

        Ok(ContentAnalysis {
            content_id: content_id.to_string(),
            toxicity_score: toxicity.score,
            hate_speech_detected: toxicity.toxic,
            misinformation_score: misinformation.score,
            nsfw_detected: nsfw.detected,
            sentiment: sentiment_of(text),
            categories: categorize(text),
            action,
            reasoning,
        })
    }

    fn update_thresholds(&self, content: &Map<String, Value>) -> Map<String, Value> {
        let updates = content
            .get("thresholds")
            .and_then(|v| v.as_object())
            .cloned()
            .unwrap_or_default();

        let mut policy = self.policy.write().unwrap();
        *policy = policy.with_updates(&updates);
        let thresholds = *policy.thresholds();
        drop(policy);

        tracing::info!(?thresholds, "moderation thresholds updated");

        let mut response = Map::new();
        response.insert("status".to_string(), json!("thresholds_updated"));
        response.insert(
            "new_thresholds".to_string(),
            serde_json::to_value(thresholds).unwrap_or(Value::Null),
        );
        response
    }

    fn statistics(&self) -> Map<String, Value> {
        let stats = self.stats.lock().unwrap().clone();
        let mut response = Map::new();
        response.insert("total_analyzed".to_string(), json!(stats.total_analyzed));
        response.insert("approved".to_string(), json!(stats.approved));
        response.insert("flagged".to_string(), json!(stats.flagged));
        response.insert("rejected".to_string(), json!(stats.rejected));
        response.insert("average_toxicity".to_string(), json!(stats.average_toxicity()));
        response
    }
}

#[async_trait]
impl MessageHandler for ModerationAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    fn role(&self) -> &str {
        ROLE
    }

    async fn handle(&self, message: &AgentMessage) -> Result<Option<Map<String, Value>>> {
        match message.message_type.as_str() {
            message_type::MODERATE_CONTENT => {
                let analysis = self.analyze_content(&message.content).await;
                let value = serde_json::to_value(&analysis)?;
                Ok(value.as_object().cloned())
            }
            message_type::UPDATE_THRESHOLDS => Ok(Some(self.update_thresholds(&message.content))),
            message_type::GET_STATISTICS => Ok(Some(self.statistics())),
            _ => Ok(None),
        }
    }
}
