//! §4.7's evidence extraction and confidence scoring: classify each line of
//! an exploration response as supporting, contradicting, or neutral, attach
//! a code reference and a word-strength confidence, then fold the set into
//! one overall confidence score.

use reasoning_protocol::CodeLocation;
use reasoning_protocol::Evidence;
use reasoning_protocol::EvidencePolarity;
use regex_lite::Regex;
use std::sync::LazyLock;

use crate::sanitizer::patterns;
use crate::session::now_epoch_secs;

#[allow(clippy::unwrap_used)]
static FILE_LINE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9_./\-]+\.[A-Za-z]{1,6}):(\d+)").unwrap());

fn classify_polarity(line: &str) -> EvidencePolarity {
    let lower = line.to_lowercase();
    let supports = patterns::SUPPORTING_KEYWORDS.iter().any(|k| lower.contains(k));
    let contradicts = patterns::CONTRADICTING_KEYWORDS.iter().any(|k| lower.contains(k));
    match (supports, contradicts) {
        (true, false) => EvidencePolarity::Supporting,
        (false, true) => EvidencePolarity::Contradicting,
        _ => EvidencePolarity::Neutral,
    }
}

/// Word-strength heuristic confidence (spec.md §4.7): certainly/definitely
/// imply high confidence, likely/probably moderate, possibly/might low,
/// otherwise a neutral 0.5.
fn word_strength(line: &str) -> f64 {
    let lower = line.to_lowercase();
    if lower.contains("certainly") || lower.contains("definitely") {
        0.85
    } else if lower.contains("likely") || lower.contains("probably") {
        0.6
    } else if lower.contains("possibly") || lower.contains("might") || lower.contains("maybe") {
        0.3
    } else {
        0.5
    }
}

fn code_reference(line: &str) -> Option<CodeLocation> {
    let caps = FILE_LINE_REF.captures(line)?;
    Some(CodeLocation {
        file: caps.get(1)?.as_str().to_string(),
        line: caps.get(2)?.as_str().parse().ok()?,
        column: None,
        function_name: None,
    })
}

/// Scan a response line by line, producing one [`Evidence`] entry per line
/// that carries a supporting or contradicting signal. Lines with neither
/// signal are skipped rather than recorded as neutral noise.
pub fn extract_evidence(response: &str) -> Vec<Evidence> {
    let now = now_epoch_secs();
    response
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            let polarity = classify_polarity(trimmed);
            if polarity == EvidencePolarity::Neutral {
                return None;
            }
            Some(Evidence {
                polarity,
                description: trimmed.to_string(),
                location: code_reference(trimmed),
                confidence: word_strength(trimmed),
                discovered_at_epoch_secs: now,
            })
        })
        .collect()
}

/// §4.7 step 2d: fold a result's evidence into one confidence scalar in
/// `[0, 1]`. Each item's weight is its own confidence; the signed sum is
/// rescaled linearly so all-supporting saturates at 1, all-contradicting at
/// 0, and a balanced mix centers on 0.5 (neutral items carry no weight).
pub fn overall_confidence(evidence: &[Evidence], produced_insights: bool) -> f64 {
    if evidence.is_empty() {
        return if produced_insights { 0.5 } else { 0.0 };
    }

    let mut signed_sum = 0.0;
    let mut total_weight = 0.0;
    for e in evidence {
        let sign = match e.polarity {
            EvidencePolarity::Supporting => 1.0,
            EvidencePolarity::Contradicting => -1.0,
            EvidencePolarity::Neutral => 0.0,
        };
        if sign != 0.0 {
            signed_sum += sign * e.confidence;
            total_weight += e.confidence;
        }
    }

    if total_weight <= f64::EPSILON {
        return 0.5;
    }
    ((total_weight + signed_sum) / (2.0 * total_weight)).clamp(0.0, 1.0)
}

/// Did the response match one of the fixed reproduction-success phrases
/// (spec.md §4.7)?
pub fn reproduction_succeeded(response: &str) -> bool {
    let lower = response.to_lowercase();
    patterns::REPRODUCTION_SUCCESS_PATTERNS
        .iter()
        .any(|p| lower.contains(p))
}

#[allow(clippy::unwrap_used)]
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(?:\d+[.)]|[-*])\s+(.+)$").unwrap());

/// Extract numbered or bulleted lines as discrete reproduction steps.
pub fn extract_steps(response: &str) -> Vec<String> {
    LIST_ITEM
        .captures_iter(response)
        .filter_map(|c| c.get(1).map(|m| m.as_str().trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn classifies_supporting_and_contradicting_lines() {
        let response = "This confirms the theory about the race.\nNo evidence of a deadlock here.\nJust a plain observation.";
        let evidence = extract_evidence(response);
        assert_eq!(evidence.len(), 2);
        assert_eq!(evidence[0].polarity, EvidencePolarity::Supporting);
        assert_eq!(evidence[1].polarity, EvidencePolarity::Contradicting);
    }

    #[test]
    fn attaches_code_reference_when_present() {
        let evidence = extract_evidence("Confirms the bug at src/worker.rs:42 directly.");
        assert_eq!(evidence[0].location.as_ref().unwrap().file, "src/worker.rs");
        assert_eq!(evidence[0].location.as_ref().unwrap().line, 42);
    }

    #[test]
    fn all_supporting_evidence_saturates_near_one() {
        let evidence = extract_evidence("This confirms it.\nThis also validates it.\nWe definitely found it.");
        let confidence = overall_confidence(&evidence, true);
        assert!(confidence > 0.9);
    }

    #[test]
    fn empty_evidence_with_insights_is_half_confidence() {
        assert_eq!(overall_confidence(&[], true), 0.5);
        assert_eq!(overall_confidence(&[], false), 0.0);
    }

    #[test]
    fn extracts_numbered_reproduction_steps() {
        let response = "Steps to reproduce:\n1. Start the service.\n2. Send two concurrent requests.\n3. Observe the crash.";
        assert!(reproduction_succeeded(response));
        let steps = extract_steps(response);
        assert_eq!(steps.len(), 3);
        assert!(steps[1].contains("concurrent"));
    }
}
