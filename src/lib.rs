//! ConnectSphere agent service library root.

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod infra;
pub mod logging;
pub mod moderation;
pub mod orchestrator;
pub mod parse;
pub mod personalization;
pub mod protocol;
pub mod system;

pub use agent::{AgentRuntime, HandlerFailure, MessageHandler};
pub use cli::Commands;
pub use config::{load_settings, load_settings_or_default, Settings};
pub use error::{Error, Result};
pub use moderation::{Action, ContentAnalysis, DecisionPolicy, ModerationAgent, ModerationThresholds};
pub use orchestrator::Orchestrator;
pub use personalization::{PersonalizationAgent, UserProfile};
pub use protocol::{AgentMessage, CollaborationHub};
pub use system::AgentSystem;
