//! Moderation classifier boundary: toxicity, misinformation and NSFW
//! signals for a piece of text.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::parse::{self, RoleDefault};

use super::llm::ChatCompletion;

/// Score above which a text counts as toxic.
const TOXIC_CUTOFF: f64 = 0.7;
/// Score above which a claim needs human review.
const REVIEW_CUTOFF: f64 = 0.6;
/// Score above which a text counts as NSFW.
const NSFW_CUTOFF: f64 = 0.8;

#[derive(Debug, Clone, Copy, Default)]
pub struct ToxicitySignal {
    pub score: f64,
    pub toxic: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MisinformationSignal {
    pub score: f64,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NsfwSignal {
    pub score: f64,
    pub detected: bool,
}

/// Classifier suite boundary. Scores live in [0, 1].
#[async_trait]
pub trait ClassifierSuite: Send + Sync {
    async fn toxicity(&self, text: &str) -> Result<ToxicitySignal>;

    async fn misinformation(&self, text: &str) -> Result<MisinformationSignal>;

    async fn nsfw(&self, text: &str) -> Result<NsfwSignal>;
}

/// Classifier backed by the chat-completion provider.
///
/// The model is asked for a single score; its reply is decoded with the
/// lenient extractor. An unreadable reply zero-scores the signal rather than
/// erroring. A provider failure still propagates.
pub struct LlmClassifier {
    completion: Arc<dyn ChatCompletion>,
}

impl LlmClassifier {
    pub fn new(completion: Arc<dyn ChatCompletion>) -> Self {
        Self { completion }
    }

    async fn score(&self, system: &str, field: &str, text: &str) -> Result<f64> {
        let prompt = format!(
            "Rate the following text. Reply with a JSON object {{\"{}\": <number between 0 and 1>}}.\n\nText: {}",
            field, text
        );
        let reply = self.completion.complete(system, &prompt).await?;

        let record = parse::parse_or_default(&reply, RoleDefault::Empty);
        Ok(record
            .get(field)
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0)
            .clamp(0.0, 1.0))
    }
}

#[async_trait]
impl ClassifierSuite for LlmClassifier {
    async fn toxicity(&self, text: &str) -> Result<ToxicitySignal> {
        let score = self
            .score(
                "You detect toxicity, hate speech and harmful content.",
                "toxicity_score",
                text,
            )
            .await?;
        Ok(ToxicitySignal {
            score,
            toxic: score > TOXIC_CUTOFF,
        })
    }

    async fn misinformation(&self, text: &str) -> Result<MisinformationSignal> {
        let score = self
            .score(
                "You check claims for misinformation and verify facts.",
                "misinformation_score",
                text,
            )
            .await?;
        Ok(MisinformationSignal {
            score,
            needs_review: score > REVIEW_CUTOFF,
        })
    }

    async fn nsfw(&self, text: &str) -> Result<NsfwSignal> {
        let score = self
            .score(
                "You detect not-safe-for-work content in text.",
                "nsfw_score",
                text,
            )
            .await?;
        Ok(NsfwSignal {
            score,
            detected: score > NSFW_CUTOFF,
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::llm::testing::ScriptedCompletion;

    #[tokio::test]
    async fn test_llm_classifier_reads_score() {
        let completion = Arc::new(ScriptedCompletion::new(vec![
            r#"Sure. {"toxicity_score": 0.92}"#,
        ]));
        let suite = LlmClassifier::new(completion);

        let signal = suite.toxicity("some text").await.unwrap();
        assert!((signal.score - 0.92).abs() < 1e-9);
        assert!(signal.toxic);
    }

    #[tokio::test]
    async fn test_unreadable_reply_zero_scores() {
        let completion = Arc::new(ScriptedCompletion::new(vec!["I cannot rate this."]));
        let suite = LlmClassifier::new(completion);

        let signal = suite.nsfw("some text").await.unwrap();
        assert_eq!(signal.score, 0.0);
        assert!(!signal.detected);
    }
}
