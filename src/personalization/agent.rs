//! Personalization agent: feed generation over the vector index.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::agent::MessageHandler;
use crate::error::Result;
use crate::infra::{ChatCompletion, DocumentStore, VectorIndex};
use crate::parse::{self, RoleDefault};
use crate::protocol::message::message_type;
use crate::protocol::AgentMessage;

use super::profile::UserProfiler;

pub const AGENT_NAME: &str = "PersonalizationEngine";
const ROLE: &str = "Personalized Content Recommendation Specialist";

const ENGINE_SYSTEM: &str = "You are a personalized content recommendation \
specialist for the ConnectSphere platform. You balance user preferences with \
discovery and explain every recommendation.";

const DEFAULT_FEED_COUNT: usize = 10;
const DEFAULT_ENGAGEMENT: f64 = 0.7;

/// One recommended piece of content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentRecommendation {
    pub content_id: String,
    pub score: f64,
    pub reason: String,
    pub category: String,
    pub predicted_engagement: f64,
}

/// Agent responsible for personalized content recommendations.
pub struct PersonalizationAgent {
    profiler: UserProfiler,
    index: Arc<dyn VectorIndex>,
    docs: Arc<dyn DocumentStore>,
    completion: Arc<dyn ChatCompletion>,
}

impl PersonalizationAgent {
    pub fn new(
        profiler: UserProfiler,
        index: Arc<dyn VectorIndex>,
        docs: Arc<dyn DocumentStore>,
        completion: Arc<dyn ChatCompletion>,
    ) -> Self {
        Self {
            profiler,
            index,
            docs,
            completion,
        }
    }

    pub fn profiler(&self) -> &UserProfiler {
        &self.profiler
    }

    /// Generate a personalized feed for a user.
    pub async fn generate_feed(
        &self,
        user_id: &str,
        page_size: usize,
    ) -> Result<Vec<ContentRecommendation>> {
        let mut profile = self.profiler.load(user_id).await?;

        // Cold profile: seed interests from the user record, if one exists.
        if profile.interests.is_empty() {
            if let Some(record) = self.docs.get(user_id).await? {
                if let Some(interests) = record.get("interests").and_then(|v| v.as_array()) {
                    let seed: Vec<Map<String, Value>> = vec![{
                        let mut map = Map::new();
                        map.insert("categories".to_string(), Value::Array(interests.clone()));
                        map
                    }];
                    profile = self.profiler.update(user_id, seed).await?;
                }
            }
        }

        let vector = profile.embedding.clone().unwrap_or_default();
        let matches = self.index.query(&vector, None, page_size).await?;

        let mut recommendations: Vec<ContentRecommendation> = matches
            .into_iter()
            .map(|m| {
                let category = m
                    .metadata
                    .get("category")
                    .and_then(|v| v.as_str())
                    .unwrap_or("general")
                    .to_string();
                let predicted_engagement = m
                    .metadata
                    .get("predicted_engagement")
                    .and_then(|v| v.as_f64())
                    .unwrap_or(DEFAULT_ENGAGEMENT);
                ContentRecommendation {
                    content_id: m.id,
                    score: m.score,
                    reason: "Based on your interests".to_string(),
                    category,
                    predicted_engagement,
                }
            })
            .collect();

        // The index came up empty: ask the model for candidates and read
        // them back through the lenient extractor.
        if recommendations.is_empty() {
            recommendations = self.feed_from_model(user_id, &profile.interests, page_size).await;
        }

        Ok(recommendations)
    }

    async fn feed_from_model(
        &self,
        user_id: &str,
        interests: &[String],
        page_size: usize,
    ) -> Vec<ContentRecommendation> {
        let prompt = format!(
            "Generate a personalized content feed for user {} with interests [{}]. \
             Reply with a JSON object {{\"recommendations\": [{{\"content_id\", \
             \"score\", \"reason\", \"category\", \"predicted_engagement\"}}]}} \
             with at most {} entries.",
            user_id,
            interests.join(", "),
            page_size
        );

        let reply = match self.completion.complete(ENGINE_SYSTEM, &prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(user_id, "feed completion failed: {}", e);
                return Vec::new();
            }
        };

        let record = parse::parse_or_default(&reply, RoleDefault::Personalization);
        record
            .get("recommendations")
            .and_then(|v| v.as_array())
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| serde_json::from_value(e.clone()).ok())
                    .take(page_size)
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl MessageHandler for PersonalizationAgent {
    fn name(&self) -> &str {
        AGENT_NAME
    }

    fn role(&self) -> &str {
        ROLE
    }

    async fn handle(&self, message: &AgentMessage) -> Result<Option<Map<String, Value>>> {
        match message.message_type.as_str() {
            message_type::GENERATE_RECOMMENDATIONS => {
                let user_id = message
                    .content
                    .get("user_id")
                    .and_then(|v| v.as_str())
                    .unwrap_or("unknown");
                let count = message
                    .content
                    .get("count")
                    .and_then(|v| v.as_u64())
                    .map(|c| c as usize)
                    .unwrap_or(DEFAULT_FEED_COUNT);

                let recommendations = self.generate_feed(user_id, count).await?;

                let mut response = Map::new();
                response.insert(
                    "recommendations".to_string(),
                    serde_json::to_value(&recommendations)?,
                );
                response.insert("generated_at".to_string(), json!(Utc::now().to_rfc3339()));
                Ok(Some(response))
            }
            _ => Ok(None),
        }
    }
}
