//! Round-based shared conversation among the specialist panel.
//!
//! State machine over a bounded transcript: each turn one speaker talks,
//! until the turn budget runs out or the termination token appears in a
//! message. The loop within one conversation is strictly sequential;
//! independent conversations share no mutable state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::infra::ChatCompletion;

use super::roster::{Panelist, ADMIN_BUCKET, ADMIN_NAME};

/// How the next speaker is picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerSelection {
    /// Content-relevance scoring against the latest message, with a stable
    /// round-robin tiebreak.
    Auto,
    /// Strict rotation; used for crisis mode so every role is heard.
    RoundRobin,
}

/// Conversation progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationState {
    Init,
    Turn(usize),
    Terminated { turns: usize },
}

/// One transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub speaker: String,
    pub bucket: String,
    pub content: String,
}

/// A bounded multi-party conversation.
pub struct GroupConversation {
    panel: Vec<Panelist>,
    completion: Arc<dyn ChatCompletion>,
    max_turns: usize,
    selection: SpeakerSelection,
    termination_token: String,
    messages: Vec<ChatMessage>,
    state: ConversationState,
    next_robin: usize,
}

impl GroupConversation {
    pub fn new(
        panel: Vec<Panelist>,
        completion: Arc<dyn ChatCompletion>,
        max_turns: usize,
        selection: SpeakerSelection,
        termination_token: String,
    ) -> Self {
        Self {
            panel,
            completion,
            max_turns,
            selection,
            termination_token,
            messages: Vec::new(),
            state: ConversationState::Init,
            next_robin: 0,
        }
    }

    pub fn state(&self) -> ConversationState {
        self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Turns spoken by panelists (the seed does not count).
    pub fn turns_taken(&self) -> usize {
        self.messages.len().saturating_sub(1)
    }

    /// Run the conversation from a seed message to termination.
    pub async fn run(&mut self, seed: &str) -> Result<&[ChatMessage]> {
        self.messages.push(ChatMessage {
            speaker: ADMIN_NAME.to_string(),
            bucket: ADMIN_BUCKET.to_string(),
            content: seed.to_string(),
        });

        for turn in 1..=self.max_turns {
            self.state = ConversationState::Turn(turn);

            let speaker = self.select_speaker();
            let panelist = self.panel[speaker];
            let prompt = self.render_prompt(&panelist);
            let text = self
                .completion
                .complete(panelist.system_message, &prompt)
                .await?;

            let terminated = text.contains(&self.termination_token);
            tracing::debug!(turn, speaker = panelist.name, terminated, "conversation turn");

            self.messages.push(ChatMessage {
                speaker: panelist.name.to_string(),
                bucket: panelist.bucket.to_string(),
                content: text,
            });

            if terminated {
                self.state = ConversationState::Terminated { turns: turn };
                return Ok(&self.messages);
            }
        }

        self.state = ConversationState::Terminated {
            turns: self.max_turns,
        };
        Ok(&self.messages)
    }

    fn select_speaker(&mut self) -> usize {
        match self.selection {
            SpeakerSelection::RoundRobin => self.advance_robin(),
            SpeakerSelection::Auto => {
                let last = match self.messages.last() {
                    Some(message) => message.content.to_lowercase(),
                    None => return self.advance_robin(),
                };
                let previous_speaker = self.messages.last().map(|m| m.speaker.clone());

                let mut best: Option<(usize, usize)> = None;
                for (idx, panelist) in self.panel.iter().enumerate() {
                    // Nobody answers themselves.
                    if self.panel.len() > 1
                        && previous_speaker.as_deref() == Some(panelist.name)
                    {
                        continue;
                    }
                    let score = panelist
                        .keywords
                        .iter()
                        .filter(|k| last.contains(*k))
                        .count();
                    if score > 0 && best.map_or(true, |(_, s)| score > s) {
                        best = Some((idx, score));
                    }
                }

                match best {
                    Some((idx, _)) => {
                        // Keep the rotation moving so ties stay fair.
                        self.next_robin = (idx + 1) % self.panel.len();
                        idx
                    }
                    None => self.advance_robin(),
                }
            }
        }
    }

    fn advance_robin(&mut self) -> usize {
        let idx = self.next_robin % self.panel.len();
        self.next_robin = self.next_robin.wrapping_add(1);
        idx
    }

    fn render_prompt(&self, panelist: &Panelist) -> String {
        let mut transcript = String::new();
        for message in &self.messages {
            transcript.push_str(&format!("{}: {}\n", message.speaker, message.content));
        }

        format!(
            "Conversation so far:\n{}\n\
             You are {}. Continue the discussion with your expert view. \
             When the group has reached a complete answer, include the word {}.",
            transcript, panelist.name, self.termination_token
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::llm::testing::ScriptedCompletion;
    use crate::orchestrator::roster;

    fn conversation(
        replies: Vec<&str>,
        max_turns: usize,
        selection: SpeakerSelection,
    ) -> GroupConversation {
        GroupConversation::new(
            roster::platform_panel(),
            Arc::new(ScriptedCompletion::new(replies)),
            max_turns,
            selection,
            "TERMINATE".to_string(),
        )
    }

    #[tokio::test]
    async fn test_round_robin_exhausts_turn_budget() {
        let mut conversation = conversation(vec!["keep talking"], 30, SpeakerSelection::RoundRobin);

        conversation.run("discuss the roadmap").await.unwrap();

        assert_eq!(conversation.turns_taken(), 30);
        assert_eq!(
            conversation.state(),
            ConversationState::Terminated { turns: 30 }
        );
    }

    #[tokio::test]
    async fn test_termination_token_ends_early() {
        let mut conversation = conversation(
            vec!["first thought", "second thought", "we are done TERMINATE"],
            30,
            SpeakerSelection::RoundRobin,
        );

        conversation.run("discuss the roadmap").await.unwrap();

        assert_eq!(conversation.turns_taken(), 3);
        assert_eq!(
            conversation.state(),
            ConversationState::Terminated { turns: 3 }
        );
    }

    #[tokio::test]
    async fn test_round_robin_cycles_all_roles() {
        let mut conversation = conversation(vec!["noted"], 5, SpeakerSelection::RoundRobin);

        conversation.run("hear from everyone").await.unwrap();

        let speakers: Vec<&str> = conversation.messages()[1..]
            .iter()
            .map(|m| m.speaker.as_str())
            .collect();
        assert_eq!(
            speakers,
            vec![
                "ContentStrategist",
                "UXSpecialist",
                "EconomicAnalyst",
                "GovernanceCoordinator",
                "SafetyOfficer"
            ]
        );
    }

    #[tokio::test]
    async fn test_auto_selection_follows_relevance() {
        let mut conversation = conversation(vec!["done TERMINATE"], 10, SpeakerSelection::Auto);

        conversation
            .run("we have a spam and abuse problem threatening user safety")
            .await
            .unwrap();

        assert_eq!(conversation.messages()[1].speaker, "SafetyOfficer");
    }

    #[tokio::test]
    async fn test_auto_selection_falls_back_to_rotation() {
        let mut conversation = conversation(vec!["done TERMINATE"], 10, SpeakerSelection::Auto);

        conversation.run("xyzzy").await.unwrap();

        assert_eq!(conversation.messages()[1].speaker, "ContentStrategist");
    }
}
