//! Best-effort extraction of structured records from model output.
//!
//! The extractor takes the slice from the first `{` to the last `}` and
//! tries to decode it as a JSON object. It is deliberately not brace-balance
//! aware: text carrying several unrelated brace pairs yields the greedy
//! first-to-last slice, which usually fails to decode and lands on the
//! role-specific fallback. Known limitation, relied on downstream: do not
//! swap in a balanced parser without revisiting every call site.

use serde_json::{Map, Value};

/// Keywords that flip the moderation fallback to FLAGGED.
const FLAG_KEYWORDS: [&str; 3] = ["inappropriate", "harmful", "spam"];

/// Fallback record shape when no object can be extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDefault {
    /// FLAGGED/APPROVED status derived from the keyword scan.
    Moderation,
    /// Empty recommendation list.
    Personalization,
    /// Empty record.
    Empty,
}

/// Extract the greedy first-`{` to last-`}` slice as a JSON object.
pub fn extract_object(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&raw[start..=end]).ok()
}

/// Extract an object from model output, falling back to the role default.
pub fn parse_or_default(raw: &str, default: RoleDefault) -> Map<String, Value> {
    extract_object(raw).unwrap_or_else(|| default_record(raw, default))
}

fn default_record(raw: &str, default: RoleDefault) -> Map<String, Value> {
    let mut record = Map::new();
    match default {
        RoleDefault::Moderation => {
            let lower = raw.to_lowercase();
            let status = if FLAG_KEYWORDS.iter().any(|k| lower.contains(k)) {
                "FLAGGED"
            } else {
                "APPROVED"
            };
            record.insert("status".to_string(), Value::String(status.to_string()));
        }
        RoleDefault::Personalization => {
            record.insert("recommendations".to_string(), Value::Array(Vec::new()));
        }
        RoleDefault::Empty => {}
    }
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracts_embedded_object() {
        let record = parse_or_default(
            r#"prefix {"status":"APPROVED","score":90} suffix"#,
            RoleDefault::Empty,
        );

        assert_eq!(record.get("status"), Some(&json!("APPROVED")));
        assert_eq!(record.get("score"), Some(&json!(90)));
    }

    #[test]
    fn test_greedy_slice_on_multiple_objects() {
        // First-to-last slice: `{"a":1} noise {"b":2}` is not valid JSON, so
        // the extractor yields nothing and the fallback applies.
        assert!(extract_object(r#"{"a":1} noise {"b":2}"#).is_none());

        let record = parse_or_default(r#"{"a":1} noise {"b":2}"#, RoleDefault::Empty);
        assert!(record.is_empty());
    }

    #[test]
    fn test_moderation_default_flagged_on_keyword() {
        let record = parse_or_default("This post is clearly SPAM content", RoleDefault::Moderation);
        assert_eq!(record.get("status"), Some(&json!("FLAGGED")));

        let record = parse_or_default("Looks harmful to me", RoleDefault::Moderation);
        assert_eq!(record.get("status"), Some(&json!("FLAGGED")));
    }

    #[test]
    fn test_moderation_default_approved_otherwise() {
        let record = parse_or_default("Nothing wrong with this post", RoleDefault::Moderation);
        assert_eq!(record.get("status"), Some(&json!("APPROVED")));
    }

    #[test]
    fn test_personalization_default_is_empty_list() {
        let record = parse_or_default("no structure here", RoleDefault::Personalization);
        assert_eq!(record.get("recommendations"), Some(&json!([])));
    }

    #[test]
    fn test_reversed_braces_fall_back() {
        let record = parse_or_default("} backwards {", RoleDefault::Moderation);
        assert_eq!(record.get("status"), Some(&json!("APPROVED")));
    }
}
