//! Injection signatures and evidence keyword tables, kept in one place per
//! spec.md §9's design note ("keep the exact keyword lists in one table so
//! they can be tuned and tested as data; do not inline them across the
//! scheduler").

use regex_lite::Regex;
use regex_lite::RegexBuilder;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
pub(crate) fn ci(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("static injection pattern must compile")
}

/// Prompt-injection signatures (spec.md §4.2).
pub static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        ci(r"\b(ignore|forget|disregard)\b[^.]{0,40}\bprevious\s+instructions\b"),
        ci(r"\byou\s+are\s+now\b"),
        ci(r"\[\s*(system|assistant)\s*\]"),
        ci(r"\bbypass\s+safety\b"),
        ci(r"\bact\s+as\s+(a|an|my)?\b"),
    ]
});

/// Words whose presence in an exploration response suggests supporting
/// evidence (spec.md §4.7).
pub const SUPPORTING_KEYWORDS: &[&str] = &[
    "confirm",
    "validate",
    "support",
    "consistent with",
    "aligns with",
    "indicates",
    "found",
    "discovered",
    "identified",
    "observed",
];

/// Words whose presence suggests contradicting evidence (spec.md §4.7).
pub const CONTRADICTING_KEYWORDS: &[&str] = &[
    "contradict",
    "disprove",
    "inconsistent",
    "rules out",
    "unlikely",
    "no evidence",
    "not found",
    "absence of",
];

/// Pattern-level insight keywords gating cross-pollination (spec.md §4.7).
pub const SYSTEMIC_PATTERN_KEYWORDS: &[&str] = &["pattern", "common", "related", "system-wide"];

/// Words whose presence triggers a topical follow-up suggestion (spec.md
/// §4.4's follow-up extraction).
pub const ASYNC_KEYWORDS: &[&str] = &["async", "concurrent", "concurrency", "race"];
pub const DATA_KEYWORDS: &[&str] = &["database", "query", "queries"];

/// Phrases that count as a successful reproduction response (spec.md §4.7).
pub const REPRODUCTION_SUCCESS_PATTERNS: &[&str] = &[
    "steps to reproduce",
    "reproduction steps",
    "to reproduce",
    "you can reproduce",
];
