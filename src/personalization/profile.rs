//! User profiles and the profiler that maintains them.
//!
//! Profiles are mutated only through the profiler and cached in the
//! key-value store with a 7-day expiry.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::config::ProfileConfig;
use crate::error::Result;
use crate::infra::KvStore;

/// User profile for personalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    /// Ordered, most-recent-biased, capped at the configured limit.
    pub interests: Vec<String>,
    /// Bounded interaction history, oldest entries dropped first.
    pub interaction_history: Vec<Map<String, Value>>,
    pub preferences: Map<String, Value>,
    pub embedding: Option<Vec<f32>>,
    pub last_updated: DateTime<Utc>,
}

impl UserProfile {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            interests: Vec::new(),
            interaction_history: Vec::new(),
            preferences: Map::new(),
            embedding: None,
            last_updated: Utc::now(),
        }
    }
}

fn profile_key(user_id: &str) -> String {
    format!("user_profile:{}", user_id)
}

/// Maintains user profiles in the key-value store.
pub struct UserProfiler {
    kv: Arc<dyn KvStore>,
    config: ProfileConfig,
}

impl UserProfiler {
    pub fn new(kv: Arc<dyn KvStore>, config: ProfileConfig) -> Self {
        Self { kv, config }
    }

    /// Load a cached profile, or a fresh one if the cache is cold.
    pub async fn load(&self, user_id: &str) -> Result<UserProfile> {
        match self.kv.get(&profile_key(user_id)).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(UserProfile::new(user_id)),
        }
    }

    /// Fold recent interactions into the profile and persist it.
    pub async fn update(
        &self,
        user_id: &str,
        recent_interactions: Vec<Map<String, Value>>,
    ) -> Result<UserProfile> {
        let mut profile = self.load(user_id).await?;

        profile.interaction_history.extend(recent_interactions.iter().cloned());
        let overflow = profile
            .interaction_history
            .len()
            .saturating_sub(self.config.history_limit);
        profile.interaction_history.drain(..overflow);

        let new_interests = extract_interests(&recent_interactions);
        profile.interests = merge_interests(
            &profile.interests,
            new_interests,
            self.config.interest_limit,
        );

        profile.preferences = analyze_preferences(&profile.interaction_history);
        profile.last_updated = Utc::now();

        self.save(&profile).await?;
        tracing::debug!(user_id, interests = profile.interests.len(), "profile updated");
        Ok(profile)
    }

    /// Attach an externally computed embedding and persist.
    pub async fn set_embedding(&self, user_id: &str, embedding: Vec<f32>) -> Result<UserProfile> {
        let mut profile = self.load(user_id).await?;
        profile.embedding = Some(embedding);
        profile.last_updated = Utc::now();
        self.save(&profile).await?;
        Ok(profile)
    }

    async fn save(&self, profile: &UserProfile) -> Result<()> {
        self.kv
            .set_ex(
                &profile_key(&profile.user_id),
                serde_json::to_value(profile)?,
                self.config.ttl_seconds,
            )
            .await
    }
}

/// Interests come from interaction categories and tags.
fn extract_interests(interactions: &[Map<String, Value>]) -> Vec<String> {
    let mut interests = Vec::new();
    for interaction in interactions {
        for field in ["categories", "tags"] {
            if let Some(values) = interaction.get(field).and_then(|v| v.as_array()) {
                for value in values {
                    if let Some(s) = value.as_str() {
                        interests.push(s.to_string());
                    }
                }
            }
        }
    }
    interests
}

/// Deduplicate, keeping the most recent occurrence of each interest last,
/// then cap at `limit` (dropping the oldest).
fn merge_interests(existing: &[String], new: Vec<String>, limit: usize) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for interest in existing.iter().chain(new.iter()) {
        merged.retain(|i| i != interest);
        merged.push(interest.clone());
    }
    let overflow = merged.len().saturating_sub(limit);
    merged.drain(..overflow);
    merged
}

/// Derive coarse preferences from the interaction history.
fn analyze_preferences(history: &[Map<String, Value>]) -> Map<String, Value> {
    let mut category_counts: HashMap<String, u64> = HashMap::new();
    for interaction in history {
        if let Some(categories) = interaction.get("categories").and_then(|v| v.as_array()) {
            for category in categories {
                if let Some(s) = category.as_str() {
                    *category_counts.entry(s.to_string()).or_insert(0) += 1;
                }
            }
        }
    }

    let mut ranked: Vec<(String, u64)> = category_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(5);

    let mut preferred = Map::new();
    for (category, count) in ranked {
        preferred.insert(category, json!(count));
    }

    let mut preferences = Map::new();
    preferences.insert("preferred_categories".to_string(), Value::Object(preferred));
    preferences.insert("engagement_times".to_string(), json!({}));
    preferences.insert("content_length_preference".to_string(), json!("medium"));
    preferences.insert("interaction_frequency".to_string(), json!("regular"));
    preferences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::MemoryKv;

    fn interaction(categories: &[&str], tags: &[&str]) -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("categories".to_string(), json!(categories));
        map.insert("tags".to_string(), json!(tags));
        map
    }

    fn profiler() -> UserProfiler {
        UserProfiler::new(Arc::new(MemoryKv::new()), ProfileConfig::default())
    }

    #[tokio::test]
    async fn test_update_builds_profile() {
        let profiler = profiler();

        let profile = profiler
            .update(
                "user_123",
                vec![
                    interaction(&["technology"], &["machine-learning"]),
                    interaction(&["technology"], &["coding"]),
                ],
            )
            .await
            .unwrap();

        assert_eq!(profile.user_id, "user_123");
        assert!(profile.interests.contains(&"technology".to_string()));
        assert!(profile.interests.contains(&"coding".to_string()));
        assert_eq!(profile.interaction_history.len(), 2);

        let preferred = profile
            .preferences
            .get("preferred_categories")
            .and_then(|v| v.as_object())
            .unwrap();
        assert_eq!(preferred.get("technology"), Some(&json!(2)));
    }

    #[tokio::test]
    async fn test_profile_round_trips_through_store() {
        let profiler = profiler();

        profiler
            .update("user_1", vec![interaction(&["music"], &[])])
            .await
            .unwrap();

        let loaded = profiler.load("user_1").await.unwrap();
        assert!(loaded.interests.contains(&"music".to_string()));
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let profiler = profiler();

        let batch: Vec<Map<String, Value>> =
            (0..120).map(|_| interaction(&["tech"], &[])).collect();
        let profile = profiler.update("user_2", batch).await.unwrap();

        assert_eq!(profile.interaction_history.len(), 100);
    }

    #[test]
    fn test_interest_merge_is_recent_biased() {
        let existing: Vec<String> = (0..20).map(|i| format!("old_{}", i)).collect();
        let merged = merge_interests(&existing, vec!["fresh".to_string()], 20);

        assert_eq!(merged.len(), 20);
        assert_eq!(merged.last(), Some(&"fresh".to_string()));
        // The oldest interest fell off.
        assert!(!merged.contains(&"old_0".to_string()));
    }

    #[test]
    fn test_interest_merge_dedupes() {
        let merged = merge_interests(
            &["a".to_string(), "b".to_string()],
            vec!["a".to_string(), "c".to_string()],
            20,
        );

        assert_eq!(merged, vec!["b", "a", "c"]);
    }
}
