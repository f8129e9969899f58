//! Content analysis record and the keyword heuristics feeding it.
//!
//! Sentiment and categorization are deliberately shallow keyword scans:
//! pattern matching over free text, not semantic understanding. Downstream
//! consumers depend on their exact matches.

use serde::{Deserialize, Serialize};

use super::policy::Action;

/// Moderation result for one piece of content. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub content_id: String,
    pub toxicity_score: f64,
    pub hate_speech_detected: bool,
    pub misinformation_score: f64,
    pub nsfw_detected: bool,
    pub sentiment: Sentiment,
    pub categories: Vec<String>,
    pub action: Action,
    pub reasoning: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

const POSITIVE_WORDS: [&str; 5] = ["good", "great", "excellent", "amazing", "wonderful"];
const NEGATIVE_WORDS: [&str; 5] = ["bad", "terrible", "awful", "horrible", "disgusting"];

/// Word-count sentiment heuristic.
pub fn sentiment_of(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lower.contains(*w)).count();

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

const CATEGORY_KEYWORDS: [(&str, &[&str]); 5] = [
    ("politics", &["election", "president", "government", "policy"]),
    ("technology", &["software", "computer", "internet", "machine learning"]),
    ("health", &["medical", "doctor", "health", "disease"]),
    ("sports", &["game", "player", "team", "score"]),
    ("entertainment", &["movie", "music", "show", "celebrity"]),
];

/// Keyword-table topic categorization, "general" when nothing matches.
pub fn categorize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    let categories: Vec<String> = CATEGORY_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(category, _)| category.to_string())
        .collect();

    if categories.is_empty() {
        vec!["general".to_string()]
    } else {
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment() {
        assert_eq!(
            sentiment_of("This is an amazing and wonderful post!"),
            Sentiment::Positive
        );
        assert_eq!(
            sentiment_of("This is terrible and awful content."),
            Sentiment::Negative
        );
        assert_eq!(sentiment_of("This is a post about something."), Sentiment::Neutral);
    }

    #[test]
    fn test_categorization() {
        assert!(categorize("Software development is changing the internet")
            .contains(&"technology".to_string()));
        assert!(categorize("The election results show government policy changes")
            .contains(&"politics".to_string()));
        assert_eq!(categorize("Hello world"), vec!["general".to_string()]);
    }

    #[test]
    fn test_multiple_categories() {
        let categories = categorize("The president attended the game");
        assert!(categories.contains(&"politics".to_string()));
        assert!(categories.contains(&"sports".to_string()));
    }
}
