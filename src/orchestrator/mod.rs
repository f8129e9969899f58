//! Multi-agent orchestration: a fixed panel of platform specialists in a
//! round-based shared conversation, distilled into insights and actions.

pub mod insights;
pub mod report;
pub mod roster;
pub mod round;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::ConversationConfig;
use crate::error::Result;
use crate::infra::ChatCompletion;

use self::insights::{ActionRecord, CrisisResponsePlan, Insights};
use self::report::{DailyReport, TelemetrySource};
use self::round::{ChatMessage, GroupConversation, SpeakerSelection};

/// Result of a collaborative task run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub task: String,
    pub insights: Insights,
    pub actions: Vec<ActionRecord>,
    pub transcript: Vec<ChatMessage>,
}

/// Result of a coordinated crisis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrisisOutcome {
    pub crisis_type: String,
    pub response_plan: CrisisResponsePlan,
    pub immediate_actions: Vec<ActionRecord>,
    pub transcript: Vec<ChatMessage>,
}

/// Coordinates the specialist panel for complex tasks.
pub struct Orchestrator {
    completion: Arc<dyn ChatCompletion>,
    telemetry: Arc<dyn TelemetrySource>,
    config: ConversationConfig,
}

impl Orchestrator {
    pub fn new(
        completion: Arc<dyn ChatCompletion>,
        telemetry: Arc<dyn TelemetrySource>,
        config: ConversationConfig,
    ) -> Self {
        Self {
            completion,
            telemetry,
            config,
        }
    }

    /// Handle a complex task requiring multi-agent collaboration.
    pub async fn handle_task(&self, task: &str, context: &TaskContext) -> Result<TaskOutcome> {
        self.run_task(task, context, self.config.task_turns).await
    }

    /// Run the standing platform optimization with the extended turn budget.
    pub async fn optimize_platform(&self) -> Result<TaskOutcome> {
        let context = self.gather_context().await?;
        let task = "Analyze the current platform state and provide recommendations for:\n\
                    1. Improving user engagement and retention\n\
                    2. Optimizing content quality and distribution\n\
                    3. Enhancing platform economics\n\
                    4. Strengthening governance and safety";
        self.run_task(task, &context, self.config.extended_turns).await
    }

    /// Handle a crisis with a coordinated round-robin response, so every
    /// role is heard.
    pub async fn handle_crisis(
        &self,
        crisis_type: &str,
        details: &Map<String, Value>,
    ) -> Result<CrisisOutcome> {
        let seed = format!(
            "URGENT: Crisis situation detected\n\
             Type: {}\n\
             Details: {}\n\n\
             Required actions:\n\
             1. Assess the situation and impact\n\
             2. Propose immediate mitigation steps\n\
             3. Plan long-term solutions\n\
             4. Coordinate response across all platform areas",
            crisis_type,
            serde_json::to_string_pretty(details)?
        );

        let mut conversation = GroupConversation::new(
            roster::platform_panel(),
            self.completion.clone(),
            self.config.crisis_turns,
            SpeakerSelection::RoundRobin,
            self.config.termination_token.clone(),
        );
        let transcript = conversation.run(&seed).await?.to_vec();

        Ok(CrisisOutcome {
            crisis_type: crisis_type.to_string(),
            response_plan: insights::extract_crisis_response(&transcript),
            immediate_actions: insights::crisis_actions(&transcript),
            transcript,
        })
    }

    /// Generate the comprehensive daily platform report.
    pub async fn daily_report(&self) -> Result<DailyReport> {
        let context = self.gather_context().await?;
        let task = "Generate a comprehensive daily report covering:\n\
                    1. Platform health and performance\n\
                    2. User engagement and growth\n\
                    3. Content quality and moderation status\n\
                    4. Economic activity and trends\n\
                    5. Governance activities and proposals\n\
                    6. Safety and security status\n\
                    7. Recommendations for tomorrow";

        let outcome = self.run_task(task, &context, self.config.task_turns).await?;
        Ok(DailyReport::from_outcome(outcome, context))
    }

    async fn run_task(
        &self,
        task: &str,
        context: &TaskContext,
        turns: usize,
    ) -> Result<TaskOutcome> {
        let seed = format!(
            "Task: {}\n\n\
             Context:\n\
             - Platform metrics: {}\n\
             - User data: {}\n\
             - Current issues: {}\n\n\
             Please collaborate to provide a comprehensive solution.",
            task,
            serde_json::to_string_pretty(&context.metrics)?,
            serde_json::to_string_pretty(&context.user_data)?,
            serde_json::to_string_pretty(&context.issues)?
        );

        let mut conversation = GroupConversation::new(
            roster::platform_panel(),
            self.completion.clone(),
            turns,
            SpeakerSelection::Auto,
            self.config.termination_token.clone(),
        );
        let transcript = conversation.run(&seed).await?.to_vec();

        let insights = insights::extract_insights(&transcript);
        let actions = insights::synthesize_actions(&insights);

        Ok(TaskOutcome {
            task: task.to_string(),
            insights,
            actions,
            transcript,
        })
    }

    async fn gather_context(&self) -> Result<TaskContext> {
        Ok(TaskContext {
            metrics: self.telemetry.platform_metrics().await?,
            user_data: self.telemetry.user_data().await?,
            issues: self.telemetry.current_issues().await?,
        })
    }
}

/// Platform state folded into conversation seeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskContext {
    pub metrics: Map<String, Value>,
    pub user_data: Map<String, Value>,
    pub issues: Vec<Value>,
}
