//! Configuration loading for the ConnectSphere agent service.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Error;
use crate::moderation::ModerationThresholds;

pub type Result<T> = std::result::Result<T, Error>;

/// Get the service home directory (~/.connectsphere-agents).
pub fn get_home_dir() -> Result<PathBuf> {
    let home = directories::UserDirs::new()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

    Ok(home.home_dir().join(".connectsphere-agents"))
}

/// Get the settings file path.
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_home_dir()?.join("settings.json"))
}

/// Load settings from ~/.connectsphere-agents/settings.json
pub fn load_settings() -> Result<Settings> {
    load_settings_from(&get_settings_path()?)
}

/// Load settings from an explicit path.
pub fn load_settings_from(path: &std::path::Path) -> Result<Settings> {
    if !path.exists() {
        return Err(Error::Config(format!(
            "Settings file not found at {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let settings: Settings = serde_json::from_str(&content)?;

    validate_settings(&settings)?;

    tracing::debug!("Loaded settings from {}", path.display());
    Ok(settings)
}

/// Load settings or return default if not found.
pub fn load_settings_or_default() -> Settings {
    load_settings().unwrap_or_else(|e| {
        tracing::warn!("Failed to load settings: {}, using defaults", e);
        Settings::default()
    })
}

fn validate_settings(settings: &Settings) -> Result<()> {
    if settings.conversation.termination_token.trim().is_empty() {
        return Err(Error::Config(
            "conversation.termination_token must not be empty".to_string(),
        ));
    }
    if settings.collaboration.response_timeout_seconds == 0 {
        return Err(Error::Config(
            "collaboration.response_timeout_seconds must be > 0".to_string(),
        ));
    }
    Ok(())
}

/// Chat-completion provider configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LlmConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
}

fn default_model() -> String {
    "gpt-4-turbo".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            api_key: None,
            model: default_model(),
        }
    }
}

/// Turn budgets for group conversations.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversationConfig {
    #[serde(default = "default_task_turns")]
    pub task_turns: usize,
    #[serde(default = "default_crisis_turns")]
    pub crisis_turns: usize,
    #[serde(default = "default_extended_turns")]
    pub extended_turns: usize,
    #[serde(default = "default_termination_token")]
    pub termination_token: String,
}

fn default_task_turns() -> usize {
    20
}

fn default_crisis_turns() -> usize {
    30
}

fn default_extended_turns() -> usize {
    50
}

fn default_termination_token() -> String {
    "TERMINATE".to_string()
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            task_turns: default_task_turns(),
            crisis_turns: default_crisis_turns(),
            extended_turns: default_extended_turns(),
            termination_token: default_termination_token(),
        }
    }
}

/// Request/response correlation configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CollaborationConfig {
    #[serde(default = "default_response_timeout")]
    pub response_timeout_seconds: u64,
    #[serde(default = "default_response_ttl")]
    pub response_ttl_seconds: u64,
}

fn default_response_timeout() -> u64 {
    30
}

fn default_response_ttl() -> u64 {
    60
}

impl Default for CollaborationConfig {
    fn default() -> Self {
        Self {
            response_timeout_seconds: default_response_timeout(),
            response_ttl_seconds: default_response_ttl(),
        }
    }
}

/// User profile retention configuration.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ProfileConfig {
    #[serde(default = "default_interest_limit")]
    pub interest_limit: usize,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_profile_ttl")]
    pub ttl_seconds: u64,
}

fn default_interest_limit() -> usize {
    20
}

fn default_history_limit() -> usize {
    100
}

fn default_profile_ttl() -> u64 {
    // 7 days
    86400 * 7
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            interest_limit: default_interest_limit(),
            history_limit: default_history_limit(),
            ttl_seconds: default_profile_ttl(),
        }
    }
}

/// Background loop cadences.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Monitoring {
    #[serde(default = "default_health_interval")]
    pub health_interval_seconds: u64,
    #[serde(default = "default_report_interval")]
    pub report_interval_seconds: u64,
    #[serde(default = "default_optimize_interval")]
    pub optimize_interval_seconds: u64,
}

fn default_health_interval() -> u64 {
    60
}

fn default_report_interval() -> u64 {
    86400
}

fn default_optimize_interval() -> u64 {
    21600
}

impl Default for Monitoring {
    fn default() -> Self {
        Self {
            health_interval_seconds: default_health_interval(),
            report_interval_seconds: default_report_interval(),
            optimize_interval_seconds: default_optimize_interval(),
        }
    }
}

/// ConnectSphere agent service settings.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Settings {
    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub thresholds: ModerationThresholds,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub collaboration: CollaborationConfig,

    #[serde(default)]
    pub profiles: ProfileConfig,

    #[serde(default)]
    pub monitoring: Monitoring,
}
