//! Neutralization of untrusted text before it reaches the pipeline
//! or an oracle prompt.
//!
//! Strips non-printable characters, redacts PII-like substrings, and caps
//! length. Also exposes an advisory prompt-injection detector; detection
//! never blocks processing.

use std::sync::LazyLock;

use regex::Regex;

/// Replacement token for redacted substrings
pub const REDACTION_TOKEN: &str = "[REDACTED]";

/// Marker appended when text is truncated to the length cap
pub const TRUNCATION_MARKER: &str = "\n[TRUNCATED]";

static SSN_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("static regex"));

static PHONE_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\+?\d[\d\s\-]{7,}\b").expect("static regex"));

static EMAIL_LIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[\w.%-]+@[\w.-]+\.[A-Za-z]{2,}\b").expect("static regex"));

static INJECTION_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)ignore\s+all\s+previous\s+instructions",
        r"(?i)system\s+prompt",
        r"(?i)you\s+are\s+chatgpt",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("static regex"))
    .collect()
});

/// Remove non-printable characters, keeping newline and tab
pub fn strip_control_chars(text: &str) -> String {
    text.chars()
        .filter(|&ch| ch == '\n' || ch == '\t' || !ch.is_control())
        .collect()
}

/// Lightweight redaction for common PII-like patterns. Not exhaustive.
pub fn redact_pii_like(text: &str) -> String {
    let text = SSN_LIKE.replace_all(text, REDACTION_TOKEN);
    let text = PHONE_LIKE.replace_all(&text, REDACTION_TOKEN);
    let text = EMAIL_LIKE.replace_all(&text, REDACTION_TOKEN);
    text.into_owned()
}

/// Full sanitization pass: strip, redact, trim, truncate.
///
/// Always returns a string, possibly empty. `max_len` is in characters;
/// truncated output gets the truncation marker appended.
pub fn sanitize_untrusted_text(text: &str, max_len: usize) -> String {
    let text = strip_control_chars(text);
    let text = redact_pii_like(&text);
    let text = text.trim();

    if text.chars().count() > max_len {
        let mut truncated: String = text.chars().take(max_len).collect();
        truncated.push_str(TRUNCATION_MARKER);
        truncated
    } else {
        text.to_string()
    }
}

/// Advisory check against a small fixed set of known jailbreak phrasings.
///
/// Callers may surface this but it does not block processing.
pub fn looks_like_prompt_injection(text: &str) -> bool {
    INJECTION_PATTERNS.iter().any(|p| p.is_match(text))
}
