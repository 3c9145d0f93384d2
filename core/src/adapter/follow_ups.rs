//! Follow-up question extraction (spec.md §4.4): the union of every
//! trailing sentence that ends in `?`, plus topical suggestions gated by
//! keywords in the response, truncated to three.

use crate::sanitizer::patterns;

const MAX_FOLLOW_UPS: usize = 3;

fn sentences_ending_in_question(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let bytes = text.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'?' => {
                let sentence = text[start..=i].trim();
                if !sentence.is_empty() {
                    out.push(sentence.to_string());
                }
                start = i + 1;
            }
            b'.' | b'!' => start = i + 1,
            _ => {}
        }
    }
    out
}

/// Extract up to [`MAX_FOLLOW_UPS`] follow-up questions from a remote
/// response: literal questions first, then topical suggestions gated by
/// keyword presence (spec.md §4.4).
pub fn extract_follow_ups(response: &str) -> Vec<String> {
    let mut follow_ups = sentences_ending_in_question(response);

    let lower = response.to_lowercase();
    if patterns::ASYNC_KEYWORDS.iter().any(|k| lower.contains(k)) {
        follow_ups.push(
            "Could this code path be reached concurrently from more than one caller?".to_string(),
        );
    }
    if patterns::DATA_KEYWORDS.iter().any(|k| lower.contains(k)) {
        follow_ups.push(
            "What data volume does this query typically run against in production?".to_string(),
        );
    }

    let mut seen = std::collections::HashSet::new();
    follow_ups.retain(|q| seen.insert(q.clone()));
    follow_ups.truncate(MAX_FOLLOW_UPS);
    follow_ups
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn extracts_literal_questions() {
        let response = "This looks like a race. Have you checked the lock ordering? Also, is the cache shared across threads?";
        let follow_ups = extract_follow_ups(response);
        assert_eq!(follow_ups.len(), 2);
        assert!(follow_ups[0].ends_with('?'));
    }

    #[test]
    fn adds_topical_suggestions_from_keywords() {
        let follow_ups = extract_follow_ups("This spawns an async task that races with the main loop.");
        assert!(follow_ups.iter().any(|q| q.contains("concurrently")));
    }

    #[test]
    fn caps_at_three() {
        let response = "One? Two? Three? Four? Five?";
        assert_eq!(extract_follow_ups(response).len(), 3);
    }
}
