//! Platform telemetry boundary and the daily report.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::Result;

use super::insights::{ActionRecord, Insights};
use super::{TaskContext, TaskOutcome};

/// Source of platform metrics, aggregated user data and open issues.
#[async_trait]
pub trait TelemetrySource: Send + Sync {
    async fn platform_metrics(&self) -> Result<Map<String, Value>>;

    async fn user_data(&self) -> Result<Map<String, Value>>;

    async fn current_issues(&self) -> Result<Vec<Value>>;
}

/// Representative fixed telemetry for local runs and tests.
pub struct StaticTelemetry;

#[async_trait]
impl TelemetrySource for StaticTelemetry {
    async fn platform_metrics(&self) -> Result<Map<String, Value>> {
        let mut metrics = Map::new();
        metrics.insert("daily_active_users".to_string(), json!(10000));
        metrics.insert("content_created".to_string(), json!(5000));
        metrics.insert("transactions".to_string(), json!(2500));
        metrics.insert("engagement_rate".to_string(), json!(0.65));
        Ok(metrics)
    }

    async fn user_data(&self) -> Result<Map<String, Value>> {
        let mut data = Map::new();
        data.insert("total_users".to_string(), json!(50000));
        data.insert("new_users_today".to_string(), json!(500));
        data.insert("retention_rate".to_string(), json!(0.75));
        data.insert("average_session_duration".to_string(), json!(1200));
        Ok(data)
    }

    async fn current_issues(&self) -> Result<Vec<Value>> {
        Ok(vec![
            json!({
                "type": "performance",
                "severity": "medium",
                "description": "Increased latency in content loading"
            }),
            json!({
                "type": "moderation",
                "severity": "low",
                "description": "Slight increase in spam content"
            }),
        ])
    }
}

/// Comprehensive daily platform report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyReport {
    pub date: String,
    pub executive_summary: String,
    pub detailed_insights: Insights,
    pub recommended_actions: Vec<ActionRecord>,
    pub metrics: Map<String, Value>,
    pub issues: Vec<Value>,
}

impl DailyReport {
    pub fn from_outcome(outcome: TaskOutcome, context: TaskContext) -> Self {
        Self {
            date: Utc::now().to_rfc3339(),
            executive_summary: executive_summary(&outcome.insights),
            detailed_insights: outcome.insights,
            recommended_actions: outcome.actions,
            metrics: context.metrics,
            issues: context.issues,
        }
    }
}

/// Join the leading 100 characters of the headline insight buckets.
pub fn executive_summary(insights: &Insights) -> String {
    let mut parts = Vec::new();

    if let Some(first) = insights.content_strategy.first() {
        parts.push(format!("Content: {}...", clip(first, 100)));
    }
    if let Some(first) = insights.economic_recommendations.first() {
        parts.push(format!("Economics: {}...", clip(first, 100)));
    }
    if let Some(first) = insights.safety_concerns.first() {
        parts.push(format!("Safety: {}...", clip(first, 100)));
    }

    parts.join(" | ")
}

fn clip(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_executive_summary_joins_headlines() {
        let mut insights = Insights::default();
        insights.content_strategy.push("Video first".to_string());
        insights.safety_concerns.push("Spam wave".to_string());

        let summary = executive_summary(&insights);

        assert!(summary.starts_with("Content: Video first..."));
        assert!(summary.contains(" | Safety: Spam wave..."));
        assert!(!summary.contains("Economics"));
    }

    #[test]
    fn test_summary_clips_long_entries() {
        let mut insights = Insights::default();
        insights.content_strategy.push("x".repeat(300));

        let summary = executive_summary(&insights);
        // "Content: " + 100 chars + "..."
        assert_eq!(summary.len(), 9 + 100 + 3);
    }

    #[tokio::test]
    async fn test_static_telemetry_shapes() {
        let telemetry = StaticTelemetry;

        let metrics = telemetry.platform_metrics().await.unwrap();
        assert!(metrics.contains_key("daily_active_users"));

        let issues = telemetry.current_issues().await.unwrap();
        assert_eq!(issues.len(), 2);
    }
}
