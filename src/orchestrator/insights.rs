//! Insight extraction and action synthesis over conversation transcripts.
//!
//! Action synthesis is substring matching over free text, not semantic
//! understanding. The triggers are deliberately brittle and their exact
//! (mis)matches are load-bearing for downstream consumers; change them only
//! in lockstep with those consumers.

use serde::{Deserialize, Serialize};

use super::round::ChatMessage;

/// Conversation content bucketed by sender role.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Insights {
    pub content_strategy: Vec<String>,
    pub ux_improvements: Vec<String>,
    pub economic_recommendations: Vec<String>,
    pub governance_actions: Vec<String>,
    pub safety_concerns: Vec<String>,
}

/// Coarse action record emitted by keyword triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipients: Option<String>,
}

impl ActionRecord {
    fn new(kind: &str, status: &str) -> Self {
        Self {
            kind: kind.to_string(),
            status: status.to_string(),
            concern: None,
            details: None,
            target: None,
            recipients: None,
        }
    }
}

/// Bucket transcript content by sender role.
pub fn extract_insights(messages: &[ChatMessage]) -> Insights {
    let mut insights = Insights::default();

    for message in messages {
        let content = message.content.clone();
        match message.bucket.as_str() {
            "content_strategy" => insights.content_strategy.push(content),
            "ux_improvements" => insights.ux_improvements.push(content),
            "economic_recommendations" => insights.economic_recommendations.push(content),
            "governance_actions" => insights.governance_actions.push(content),
            "safety_concerns" => insights.safety_concerns.push(content),
            _ => {}
        }
    }

    insights
}

/// Scan bucketed insights for trigger substrings and emit action records.
pub fn synthesize_actions(insights: &Insights) -> Vec<ActionRecord> {
    let mut actions = Vec::new();

    // Safety concerns first.
    for concern in &insights.safety_concerns {
        if concern.to_lowercase().contains("content moderation") {
            let mut action = ActionRecord::new("content_moderation", "initiated");
            action.concern = Some(concern.clone());
            actions.push(action);
        }
    }

    for governance in &insights.governance_actions {
        if governance.to_lowercase().contains("proposal") {
            let mut action = ActionRecord::new("governance_proposal", "drafted");
            action.details = Some(governance.clone());
            actions.push(action);
        }
    }

    actions
}

/// Crisis response plan distilled from the transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CrisisResponsePlan {
    pub immediate_steps: Vec<String>,
    pub mitigation_strategies: Vec<String>,
    pub long_term_solutions: Vec<String>,
    pub risk_assessment: String,
}

/// Bucket each message by its first matching cue.
pub fn extract_crisis_response(messages: &[ChatMessage]) -> CrisisResponsePlan {
    let mut plan = CrisisResponsePlan::default();

    for message in messages {
        let lower = message.content.to_lowercase();

        if lower.contains("immediate") || lower.contains("urgent") {
            plan.immediate_steps.push(message.content.clone());
        } else if lower.contains("mitigation") || lower.contains("reduce") {
            plan.mitigation_strategies.push(message.content.clone());
        } else if lower.contains("long-term") || lower.contains("future") {
            plan.long_term_solutions.push(message.content.clone());
        } else if lower.contains("risk") || lower.contains("assessment") {
            // Last matching message wins.
            plan.risk_assessment = message.content.clone();
        }
    }

    plan
}

/// Immediate crisis actions, one per message with a matching cue.
pub fn crisis_actions(messages: &[ChatMessage]) -> Vec<ActionRecord> {
    let mut actions = Vec::new();

    for message in messages {
        let lower = message.content.to_lowercase();

        if lower.contains("suspend") || lower.contains("pause") {
            let mut action = ActionRecord::new("suspension", "pending_execution");
            action.target = Some("identified_in_message".to_string());
            actions.push(action);
        } else if lower.contains("alert") || lower.contains("notify") {
            let mut action = ActionRecord::new("notification", "queued");
            action.recipients = Some("all_users".to_string());
            actions.push(action);
        } else if lower.contains("moderate") || lower.contains("review") {
            actions.push(ActionRecord::new("enhanced_moderation", "activated"));
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(speaker: &str, bucket: &str, content: &str) -> ChatMessage {
        ChatMessage {
            speaker: speaker.to_string(),
            bucket: bucket.to_string(),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_insight_extraction_buckets_by_role() {
        let messages = vec![
            message("ContentStrategist", "content_strategy", "We should focus on video content"),
            message("SafetyOfficer", "safety_concerns", "Increased spam detected"),
            message("EconomicAnalyst", "economic_recommendations", "Transaction volume is up 20%"),
            message("PlatformAdmin", "admin", "seed task"),
        ];

        let insights = extract_insights(&messages);

        assert_eq!(insights.content_strategy.len(), 1);
        assert_eq!(insights.safety_concerns.len(), 1);
        assert_eq!(insights.economic_recommendations.len(), 1);
        assert!(insights.ux_improvements.is_empty());
    }

    #[test]
    fn test_action_synthesis_triggers() {
        let mut insights = Insights::default();
        insights
            .safety_concerns
            .push("We need a content moderation review".to_string());
        insights
            .governance_actions
            .push("Draft a proposal to cap uploads".to_string());
        insights
            .governance_actions
            .push("No action needed here".to_string());

        let actions = synthesize_actions(&insights);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, "content_moderation");
        assert_eq!(actions[0].status, "initiated");
        assert!(actions[0].concern.is_some());
        assert_eq!(actions[1].kind, "governance_proposal");
        assert_eq!(actions[1].status, "drafted");
    }

    #[test]
    fn test_trigger_is_substring_match_only() {
        // "moderation" alone does not trip the "content moderation" trigger.
        let mut insights = Insights::default();
        insights.safety_concerns.push("moderation required".to_string());

        assert!(synthesize_actions(&insights).is_empty());
    }

    #[test]
    fn test_crisis_response_buckets_by_first_cue() {
        let messages = vec![
            message("SafetyOfficer", "safety_concerns", "Immediate lockdown of uploads"),
            message("UXSpecialist", "ux_improvements", "We can reduce exposure via rate limits"),
            message("ContentStrategist", "content_strategy", "Future work: creator education"),
            message("EconomicAnalyst", "economic_recommendations", "Risk assessment: moderate exposure"),
        ];

        let plan = extract_crisis_response(&messages);

        assert_eq!(plan.immediate_steps.len(), 1);
        assert_eq!(plan.mitigation_strategies.len(), 1);
        assert_eq!(plan.long_term_solutions.len(), 1);
        assert!(plan.risk_assessment.contains("Risk assessment"));
    }

    #[test]
    fn test_crisis_cue_order_within_message() {
        // "urgent" outranks "review" inside the same message.
        let messages = vec![message(
            "SafetyOfficer",
            "safety_concerns",
            "Urgent: review all flagged posts",
        )];

        let plan = extract_crisis_response(&messages);
        assert_eq!(plan.immediate_steps.len(), 1);

        let actions = crisis_actions(&messages);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, "enhanced_moderation");
    }

    #[test]
    fn test_crisis_actions() {
        let messages = vec![
            message("SafetyOfficer", "safety_concerns", "Suspend the offending accounts"),
            message("UXSpecialist", "ux_improvements", "Notify affected users"),
            message("ContentStrategist", "content_strategy", "Nothing actionable"),
        ];

        let actions = crisis_actions(&messages);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, "suspension");
        assert_eq!(actions[0].target.as_deref(), Some("identified_in_message"));
        assert_eq!(actions[1].kind, "notification");
        assert_eq!(actions[1].recipients.as_deref(), Some("all_users"));
    }
}
