//! CLI commands for the agent service using clap.

use anyhow::Result;
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};

use crate::config::load_settings_or_default;
use crate::system::AgentSystem;

/// ConnectSphere agents - moderation, personalization and orchestration.
#[derive(Parser)]
#[command(name = "connectsphere-agents")]
#[command(version = "0.1.0")]
#[command(about = "ConnectSphere platform agent service", long_about = None)]
pub struct Commands {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the agent service
    Start,

    /// Moderate a piece of text and print the analysis
    Moderate {
        /// Text to analyze
        text: String,

        /// Content id attached to the analysis
        #[arg(long, default_value = "cli")]
        id: String,
    },

    /// Generate the daily platform report
    Report,

    /// Run a coordinated crisis response
    Crisis {
        /// Crisis type (e.g. security_breach)
        kind: String,

        /// Crisis details as a JSON object
        #[arg(long)]
        details: Option<String>,
    },

    /// Show the active moderation thresholds
    Thresholds,
}

impl Commands {
    pub async fn run(self) -> Result<()> {
        let settings = load_settings_or_default();

        match self.command {
            Command::Start => {
                let system = AgentSystem::new(settings)?;
                system.run().await?;
            }

            Command::Moderate { text, id } => {
                let system = AgentSystem::new(settings)?;

                let mut content = Map::new();
                content.insert("id".to_string(), json!(id));
                content.insert("text".to_string(), json!(text));

                let analysis = system.moderator().analyze_content(&content).await;
                println!("{}", serde_json::to_string_pretty(&analysis)?);
            }

            Command::Report => {
                let system = AgentSystem::new(settings)?;
                let report = system.orchestrator().daily_report().await?;
                println!("{}", serde_json::to_string_pretty(&report)?);
            }

            Command::Crisis { kind, details } => {
                let system = AgentSystem::new(settings)?;

                let details: Map<String, Value> = match details {
                    Some(raw) => serde_json::from_str(&raw)?,
                    None => Map::new(),
                };

                let outcome = system.orchestrator().handle_crisis(&kind, &details).await?;
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }

            Command::Thresholds => {
                println!("{}", serde_json::to_string_pretty(&settings.thresholds)?);
            }
        }

        Ok(())
    }
}
