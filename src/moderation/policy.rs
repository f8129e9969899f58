//! Fixed-threshold moderation decision policy.
//!
//! The policy is pure and total over its numeric domain. Thresholds are an
//! immutable snapshot: an update produces a new policy rather than mutating
//! a shared table, so concurrent decisions never observe a half-applied
//! change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Toxicity above this cutoff is flagged for review even when it stays
/// below the reject threshold.
const REVIEW_TOXICITY: f64 = 0.5;

/// Moderation signal cutoffs.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct ModerationThresholds {
    #[serde(default = "default_toxicity")]
    pub toxicity: f64,
    #[serde(default = "default_hate_speech")]
    pub hate_speech: f64,
    #[serde(default = "default_misinformation")]
    pub misinformation: f64,
    #[serde(default = "default_nsfw")]
    pub nsfw: f64,
}

fn default_toxicity() -> f64 {
    0.7
}

fn default_hate_speech() -> f64 {
    0.8
}

fn default_misinformation() -> f64 {
    0.6
}

fn default_nsfw() -> f64 {
    0.8
}

impl Default for ModerationThresholds {
    fn default() -> Self {
        Self {
            toxicity: default_toxicity(),
            hate_speech: default_hate_speech(),
            misinformation: default_misinformation(),
            nsfw: default_nsfw(),
        }
    }
}

impl ModerationThresholds {
    /// Merge a partial update. Unspecified keys keep their prior value.
    pub fn merged(&self, updates: &Map<String, Value>) -> Self {
        let pick = |key: &str, prior: f64| {
            updates
                .get(key)
                .and_then(|v| v.as_f64())
                .unwrap_or(prior)
        };

        Self {
            toxicity: pick("toxicity", self.toxicity),
            hate_speech: pick("hate_speech", self.hate_speech),
            misinformation: pick("misinformation", self.misinformation),
            nsfw: pick("nsfw", self.nsfw),
        }
    }
}

/// Moderation outcome for a piece of content.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Approve,
    Flag,
    Reject,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Approve => write!(f, "approve"),
            Action::Flag => write!(f, "flag"),
            Action::Reject => write!(f, "reject"),
        }
    }
}

/// Threshold classifier mapping moderation signals to an action.
#[derive(Clone, Debug)]
pub struct DecisionPolicy {
    thresholds: ModerationThresholds,
}

impl DecisionPolicy {
    pub fn new(thresholds: ModerationThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ModerationThresholds {
        &self.thresholds
    }

    /// New policy snapshot with a partial threshold update applied.
    pub fn with_updates(&self, updates: &Map<String, Value>) -> Self {
        Self {
            thresholds: self.thresholds.merged(updates),
        }
    }

    /// Decide the action for a set of signals, in priority order:
    /// reject, then flag, then approve.
    pub fn decide(
        &self,
        toxicity: f64,
        misinformation: f64,
        nsfw_detected: bool,
        needs_review: bool,
    ) -> Action {
        if toxicity > self.thresholds.toxicity
            || misinformation > self.thresholds.misinformation
            || nsfw_detected
        {
            Action::Reject
        } else if toxicity > REVIEW_TOXICITY || needs_review {
            Action::Flag
        } else {
            Action::Approve
        }
    }
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(ModerationThresholds::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_high_toxicity_always_rejects() {
        let policy = DecisionPolicy::default();

        for misinformation in [0.0, 0.3, 0.9] {
            for nsfw in [false, true] {
                assert_eq!(policy.decide(0.71, misinformation, nsfw, false), Action::Reject);
                assert_eq!(policy.decide(0.95, misinformation, nsfw, true), Action::Reject);
            }
        }
    }

    #[test]
    fn test_mid_toxicity_flags() {
        let policy = DecisionPolicy::default();

        assert_eq!(policy.decide(0.51, 0.0, false, false), Action::Flag);
        assert_eq!(policy.decide(0.7, 0.6, false, false), Action::Flag);
    }

    #[test]
    fn test_clean_content_approves() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.0, 0.0, false, false), Action::Approve);
    }

    #[test]
    fn test_needs_review_flags_low_toxicity() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.1, 0.2, false, true), Action::Flag);
    }

    #[test]
    fn test_misinformation_and_nsfw_reject() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.0, 0.61, false, false), Action::Reject);
        assert_eq!(policy.decide(0.0, 0.0, true, false), Action::Reject);
    }

    #[test]
    fn test_partial_update_keeps_other_thresholds() {
        let policy = DecisionPolicy::default();

        let mut updates = Map::new();
        updates.insert("toxicity".to_string(), json!(0.9));
        let updated = policy.with_updates(&updates);

        assert_eq!(updated.thresholds().toxicity, 0.9);
        assert_eq!(updated.thresholds().hate_speech, 0.8);
        assert_eq!(updated.thresholds().misinformation, 0.6);
        assert_eq!(updated.thresholds().nsfw, 0.8);

        // The original snapshot is untouched.
        assert_eq!(policy.thresholds().toxicity, 0.7);
    }

    #[test]
    fn test_updated_snapshot_changes_decisions() {
        let policy = DecisionPolicy::default();
        assert_eq!(policy.decide(0.75, 0.0, false, false), Action::Reject);

        let mut updates = Map::new();
        updates.insert("toxicity".to_string(), json!(0.9));
        let relaxed = policy.with_updates(&updates);

        assert_eq!(relaxed.decide(0.75, 0.0, false, false), Action::Flag);
    }
}
