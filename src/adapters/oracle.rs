//! Reasoning oracle client: prompt contract and response parsing.
//!
//! The oracle only ever sees the evidence we hand it, enumerated with
//! 1-based indices, and must answer in strict JSON. The client tolerates
//! code fences, surrounding prose, and outright garbage; every deviation
//! degrades to an Unclear verdict with no rationale and no citations.
//! Oracle-side problems are never fatal to a claim or a report.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::warn;

use crate::config::Config;
use crate::core::sanitize::sanitize_untrusted_text;
use crate::domain::{ClaimStatus, ReasonerEvidence};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// The external reasoning model behind a narrow seam
#[async_trait]
pub trait Oracle: Send + Sync {
    /// False when credentials are missing; the client then skips the call
    fn is_configured(&self) -> bool;

    /// Send a prompt, return the raw text response
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Parsed oracle verdict for one claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OracleVerdict {
    pub status: ClaimStatus,
    pub rationale: String,
    /// 1-based evidence indices, already filtered and deduplicated
    pub citations: Vec<usize>,
}

impl OracleVerdict {
    /// The degraded verdict used for every oracle-side problem
    pub fn unclear() -> Self {
        Self {
            status: ClaimStatus::Unclear,
            rationale: String::new(),
            citations: Vec::new(),
        }
    }
}

/// What happened during an assessment, for the audit trail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleDiagnostic {
    /// Oracle was called and its output parsed
    Called { evidence_count: usize },

    /// Oracle unconfigured; no call attempted
    Skipped,

    /// Oracle answered but not with a JSON object; Unclear fallback used
    Malformed,

    /// Transport failure; Unclear fallback used
    Failed { error: String },
}

/// Client owning the prompt contract and response validation
pub struct OracleClient {
    oracle: Arc<dyn Oracle>,
}

impl OracleClient {
    pub fn new(oracle: Arc<dyn Oracle>) -> Self {
        Self { oracle }
    }

    /// Rate one claim against its evidence. Infallible by construction.
    pub async fn assess(
        &self,
        claim: &str,
        evidence: &[ReasonerEvidence],
    ) -> (OracleVerdict, OracleDiagnostic) {
        if !self.oracle.is_configured() {
            return (OracleVerdict::unclear(), OracleDiagnostic::Skipped);
        }

        let prompt = build_reasoning_prompt(claim, evidence);

        match self.oracle.generate(&prompt).await {
            Ok(text) => match parse_oracle_response(&text, evidence.len()) {
                Some(verdict) => {
                    (verdict, OracleDiagnostic::Called { evidence_count: evidence.len() })
                }
                None => {
                    warn!("Oracle response was not a JSON object, degrading to Unclear");
                    (OracleVerdict::unclear(), OracleDiagnostic::Malformed)
                }
            },
            Err(e) => {
                warn!(error = %e, "Oracle call failed, degrading to Unclear");
                (OracleVerdict::unclear(), OracleDiagnostic::Failed { error: e.to_string() })
            }
        }
    }
}

/// Build the evidence-constrained prompt.
///
/// Reasoning must only use the supplied evidence; no invented sources.
pub fn build_reasoning_prompt(claim: &str, evidence: &[ReasonerEvidence]) -> String {
    let mut evidence_lines = String::new();
    for (idx, ev) in evidence.iter().enumerate() {
        evidence_lines.push_str(&format!(
            "[{}] URL: {}\nPublisher: {}\nDate: {}\nSnippet: {}\n\n",
            idx + 1,
            ev.url.as_deref().unwrap_or("None"),
            ev.publisher.as_deref().unwrap_or("None"),
            ev.published_date.as_deref().unwrap_or("None"),
            sanitize_untrusted_text(ev.snippet.as_deref().unwrap_or(""), 800),
        ));
    }

    format!(
        "You are a fact-checking assistant.\n\
         Non-negotiable rules:\n\
         - Use ONLY the evidence snippets provided below.\n\
         - Do NOT invent new sources, URLs, quotes, or facts.\n\
         - If evidence is insufficient or conflicting, set status=Unclear and explain what is missing.\n\
         - Cite evidence ONLY by its bracketed number (e.g., [1], [3]).\n\n\
         Output STRICT JSON (no markdown, no code fences) with keys:\n\
         - status: one of Supported | Contradicted | Unclear\n\
         - rationale: 3-8 sentences explaining why, explicitly referencing evidence numbers\n\
         - citations: array of integers referencing the evidence items you relied on most\n\n\
         Claim: {}\n\n\
         Evidence:\n{}",
        sanitize_untrusted_text(claim, 600),
        evidence_lines,
    )
}

/// Pull a JSON object out of an oracle response that may be fenced or
/// surrounded by prose.
pub fn extract_json_object(text: &str) -> &str {
    let t = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if t.starts_with('{') && t.ends_with('}') {
        return t;
    }

    // Best effort: grab the first {...} block.
    if let (Some(start), Some(end)) = (t.find('{'), t.rfind('}')) {
        if start < end {
            return &t[start..=end];
        }
    }

    t
}

/// Parse and validate an oracle response.
///
/// Returns None when the response is not a JSON object; the caller
/// degrades that to the Unclear fallback and records it as such. A parsed
/// object with an unknown status keeps its rationale and citations but the
/// status falls back to Unclear; citations outside [1, evidence_count] are
/// dropped and duplicates removed. Rationale is never fabricated.
pub fn parse_oracle_response(text: &str, evidence_count: usize) -> Option<OracleVerdict> {
    let raw = extract_json_object(text);

    let value = serde_json::from_str::<serde_json::Value>(raw).ok()?;
    if !value.is_object() {
        return None;
    }

    let status = match value.get("status").and_then(|s| s.as_str()).map(str::trim) {
        Some("Supported") => ClaimStatus::Supported,
        Some("Contradicted") => ClaimStatus::Contradicted,
        _ => ClaimStatus::Unclear,
    };

    let rationale = value
        .get("rationale")
        .and_then(|r| r.as_str())
        .unwrap_or("")
        .trim()
        .to_string();

    let mut citations: Vec<usize> = Vec::new();
    if let Some(items) = value.get("citations").and_then(|c| c.as_array()) {
        for item in items {
            let Some(i) = item.as_u64().map(|i| i as usize) else {
                continue;
            };
            if i >= 1 && i <= evidence_count && !citations.contains(&i) {
                citations.push(i);
            }
        }
    }

    Some(OracleVerdict { status, rationale, citations })
}

/// Gemini REST oracle (Google AI Studio style endpoint)
pub struct GeminiOracle {
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl GeminiOracle {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.oracle_timeout_seconds))
            .build()
            .context("Failed to build HTTP client for the oracle")?;

        Ok(Self {
            api_key: config.gemini_api_key.clone(),
            model: config.gemini_model.clone(),
            client,
        })
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Oracle is not configured")?;

        let url = format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.model);

        let payload = serde_json::json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": {
                "temperature": 0.1,
                "maxOutputTokens": 900,
                "responseMimeType": "application/json",
            },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .context("Oracle request failed")?
            .error_for_status()
            .context("Oracle returned an error status")?;

        let data: serde_json::Value = response
            .json()
            .await
            .context("Failed to parse oracle response body")?;

        let text = data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .unwrap_or("")
            .to_string();

        Ok(text)
    }
}
