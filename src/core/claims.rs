//! Rule-based claim extraction.
//!
//! Deterministic and explainable: no external calls, no model. Sentences
//! are split on whitespace following `.`, `!`, or `?`, then scored against
//! a small set of claim-shaped patterns.

use std::sync::LazyLock;

use regex::Regex;

use super::sanitize::sanitize_untrusted_text;

/// Default cap on extracted claims per report
pub const DEFAULT_MAX_CLAIMS: usize = 6;

/// Fragments shorter than this are never claims
const MIN_FRAGMENT_CHARS: usize = 12;

/// Length cap applied before extraction
const MAX_INPUT_CHARS: usize = 12_000;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("static regex"));

static REPORTING_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(according to|reports?|said|claims|confirmed|denied)\b")
        .expect("static regex")
});

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\b|\b\d+%|\b\d+\b").expect("static regex"));

static COPULA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(is|are|was|were|will|has|have|had)\b").expect("static regex")
});

/// Split text into sentence-like fragments.
///
/// A boundary is whitespace following `.`, `!`, or `?`; the punctuation
/// stays with the preceding fragment.
fn split_fragments(text: &str) -> Vec<&str> {
    let mut fragments = Vec::new();
    let mut start = 0;

    for m in SENTENCE_BOUNDARY.find_iter(text) {
        // Keep the terminator (always one byte) with the fragment.
        let end = m.start() + 1;
        let fragment = text[start..end].trim();
        if !fragment.is_empty() {
            fragments.push(fragment);
        }
        start = m.end();
    }

    let tail = text[start..].trim();
    if !tail.is_empty() {
        fragments.push(tail);
    }

    fragments
}

/// True if a fragment looks like a checkable factual claim
fn is_claim_candidate(fragment: &str) -> bool {
    REPORTING_VERB.is_match(fragment) || NUMERIC.is_match(fragment) || COPULA.is_match(fragment)
}

/// Extract up to `max_claims` claim strings from raw text.
///
/// Fragments are deduplicated case-insensitively up front, preserving
/// first-seen order, so both the matched claims and the fallback are
/// unique. When no fragment matches a claim pattern, the first fragments
/// are used as-is; text shorter than the minimum fragment length yields an
/// empty list.
pub fn extract_claims(text: &str, max_claims: usize) -> Vec<String> {
    let text = sanitize_untrusted_text(text, MAX_INPUT_CHARS);

    let mut seen: Vec<String> = Vec::new();
    let mut fragments: Vec<&str> = Vec::new();
    for fragment in split_fragments(&text) {
        if fragment.chars().count() < MIN_FRAGMENT_CHARS {
            continue;
        }
        let key = fragment.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        fragments.push(fragment);
    }

    let claims: Vec<String> = fragments
        .iter()
        .filter(|f| is_claim_candidate(f))
        .take(max_claims)
        .map(|f| (*f).to_string())
        .collect();

    if claims.is_empty() {
        // Fallback: first raw fragments, still subject to the length floor.
        return fragments
            .into_iter()
            .take(max_claims)
            .map(str::to_string)
            .collect();
    }

    claims
}
