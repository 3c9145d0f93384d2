//! §4.7 step 1: parsing the remote's free-text numbered list of candidate
//! theories into typed [`Hypothesis`] values.

use reasoning_protocol::Hypothesis;
use reasoning_protocol::HypothesisCategory;
use reasoning_protocol::HypothesisId;
use regex_lite::Regex;
use std::sync::LazyLock;

#[allow(clippy::unwrap_used)]
static NUMBERED_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(\d+)[.)]\s+").unwrap());

fn category_from_text(text: &str) -> HypothesisCategory {
    let lower = text.to_lowercase();
    if lower.contains("security") || lower.contains("vulnerab") || lower.contains("inject") {
        HypothesisCategory::Security
    } else if lower.contains("perf") || lower.contains("latency") || lower.contains("slow") {
        HypothesisCategory::Performance
    } else if lower.contains("integration") || lower.contains("downstream") || lower.contains("upstream")
    {
        HypothesisCategory::Integration
    } else if lower.contains("architect") || lower.contains("design") || lower.contains("coupling") {
        HypothesisCategory::Architecture
    } else {
        HypothesisCategory::Bug
    }
}

fn priority_from_text(text: &str) -> f64 {
    #[allow(clippy::unwrap_used)]
    static EXPLICIT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?i)priority\s*[:=]?\s*(0?\.\d+|1(?:\.0)?)").unwrap());
    if let Some(caps) = EXPLICIT.captures(text) {
        if let Some(m) = caps.get(1) {
            if let Ok(v) = m.as_str().parse::<f64>() {
                return v.clamp(0.0, 1.0);
            }
        }
    }
    let lower = text.to_lowercase();
    if lower.contains("high priority") || lower.contains("critical") {
        0.9
    } else if lower.contains("medium priority") || lower.contains("likely") {
        0.6
    } else if lower.contains("low priority") || lower.contains("unlikely") {
        0.2
    } else {
        0.5
    }
}

fn extract_field(block: &str, label: &str) -> Option<String> {
    #[allow(clippy::unwrap_used)]
    static WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
    for line in block.lines() {
        let lower = line.to_lowercase();
        let needle = format!("{label}:");
        if let Some(idx) = lower.find(&needle) {
            let value = line[idx + needle.len()..].trim();
            if !value.is_empty() {
                return Some(WS.replace_all(value, " ").to_string());
            }
        }
    }
    None
}

fn first_nonempty_line(block: &str) -> &str {
    block.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or(block.trim())
}

/// Split the remote's numbered-list response into hypotheses, truncated to
/// `max_hypotheses` (spec.md §4.7 step 1). Accepts `1.` and `1)` markers.
pub fn parse_hypotheses(text: &str, max_hypotheses: usize) -> Vec<Hypothesis> {
    let starts: Vec<usize> = NUMBERED_BLOCK
        .find_iter(text)
        .map(|m| m.start())
        .collect();

    if starts.is_empty() {
        return Vec::new();
    }

    let mut hypotheses = Vec::new();
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = &text[start..end];
        let header_end = NUMBERED_BLOCK.find(block).map(|m| m.end()).unwrap_or(0);
        let body = &block[header_end..];

        let theory = extract_field(body, "theory")
            .unwrap_or_else(|| first_nonempty_line(body).to_string());
        let test_approach =
            extract_field(body, "approach").unwrap_or_else(|| "Inspect the relevant code paths directly.".to_string());
        let category = extract_field(body, "category")
            .map(|c| category_from_text(&c))
            .unwrap_or_else(|| category_from_text(body));
        let prior_priority = priority_from_text(body);

        hypotheses.push(Hypothesis {
            id: HypothesisId::new(),
            theory,
            test_approach,
            category,
            prior_priority,
        });

        if hypotheses.len() >= max_hypotheses {
            break;
        }
    }
    hypotheses
}
