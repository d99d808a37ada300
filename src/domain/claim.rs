//! Claims and the reasoning snapshot.
//!
//! The reasoning snapshot records the exact evidence list the oracle was
//! shown and the citation indices it relied on, so verdicts can be audited
//! after the fact. Snapshots carry a schema version and are validated on
//! both write and decode.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::evidence::Credibility;

/// Current snapshot schema version
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Per-claim oracle outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    Supported,
    Contradicted,
    Unclear,
}

/// A single factual assertion extracted from the input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: Uuid,

    /// Report this claim belongs to
    pub report_id: Uuid,

    /// The assertion text
    pub claim_text: String,

    /// Oracle verdict for this claim
    pub status: ClaimStatus,

    /// Confidence 0-100
    pub confidence: u8,

    /// Oracle rationale; never fabricated, None when the oracle gave none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,

    /// Evidence + citations the oracle was shown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<ReasoningSnapshot>,
}

impl Claim {
    /// Create a fresh claim in the Unclear/0 state, before the oracle runs
    pub fn new(report_id: Uuid, claim_text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id,
            claim_text: claim_text.into(),
            status: ClaimStatus::Unclear,
            confidence: 0,
            rationale: None,
            reasoning: None,
        }
    }
}

/// One evidence line as shown to the reasoning oracle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerEvidence {
    pub url: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub snippet: Option<String>,
    pub credibility: Credibility,
}

/// Versioned snapshot of oracle inputs and the citations it returned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningSnapshot {
    /// Schema version for forward compatibility
    pub schema_version: u32,

    /// The evidence list shown to the oracle, in prompt order
    pub evidence: Vec<ReasonerEvidence>,

    /// 1-based indices into `evidence`, unique and bounds-checked
    pub citations: Vec<usize>,
}

impl ReasoningSnapshot {
    /// Build a snapshot, filtering citations to valid unique 1-based indices
    pub fn new(evidence: Vec<ReasonerEvidence>, citations: Vec<usize>) -> Self {
        let count = evidence.len();
        let mut filtered = Vec::new();
        for c in citations {
            if c >= 1 && c <= count && !filtered.contains(&c) {
                filtered.push(c);
            }
        }
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            evidence,
            citations: filtered,
        }
    }

    /// Resolve citations against the snapshot's own evidence list.
    ///
    /// Valid snapshots make this total: every stored citation is a valid
    /// 1-based index.
    pub fn cited_evidence(&self) -> Vec<&ReasonerEvidence> {
        self.citations
            .iter()
            .filter_map(|&c| self.evidence.get(c - 1))
            .collect()
    }

    /// Decode a stored snapshot, distinguishing malformed from absent.
    pub fn from_json(raw: &str) -> Result<Self, SnapshotError> {
        let snapshot: ReasoningSnapshot = serde_json::from_str(raw)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Validate version and citation invariants
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.schema_version));
        }

        let mut seen = Vec::new();
        for &c in &self.citations {
            if c < 1 || c > self.evidence.len() {
                return Err(SnapshotError::CitationOutOfRange {
                    index: c,
                    evidence_count: self.evidence.len(),
                });
            }
            if seen.contains(&c) {
                return Err(SnapshotError::DuplicateCitation(c));
            }
            seen.push(c);
        }

        Ok(())
    }
}

/// Decode/validation errors for stored snapshots (distinct from "absent")
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Malformed snapshot JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unsupported snapshot schema version: {0}")]
    UnsupportedVersion(u32),

    #[error("Citation {index} out of range for {evidence_count} evidence items")]
    CitationOutOfRange { index: usize, evidence_count: usize },

    #[error("Duplicate citation index: {0}")]
    DuplicateCitation(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evidence(n: usize) -> Vec<ReasonerEvidence> {
        (0..n)
            .map(|i| ReasonerEvidence {
                url: Some(format!("https://example.com/{i}")),
                publisher: Some("example.com".to_string()),
                published_date: None,
                snippet: Some(format!("snippet {i}")),
                credibility: Credibility::Neutral,
            })
            .collect()
    }

    #[test]
    fn test_citations_filtered_on_write() {
        let snapshot = ReasoningSnapshot::new(evidence(3), vec![0, 1, 2, 2, 9, 3]);
        assert_eq!(snapshot.citations, vec![1, 2, 3]);
        assert!(snapshot.validate().is_ok());
    }

    #[test]
    fn test_cited_evidence_never_out_of_range() {
        let snapshot = ReasoningSnapshot::new(evidence(2), vec![2, 1, 5]);
        let cited = snapshot.cited_evidence();
        assert_eq!(cited.len(), 2);
        assert_eq!(cited[0].url.as_deref(), Some("https://example.com/1"));
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        let raw = r#"{"schema_version":1,"evidence":[],"citations":[1]}"#;
        let err = ReasoningSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, SnapshotError::CitationOutOfRange { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let raw = r#"{"schema_version":7,"evidence":[],"citations":[]}"#;
        let err = ReasoningSnapshot::from_json(raw).unwrap_err();
        assert!(matches!(err, SnapshotError::UnsupportedVersion(7)));
    }

    #[test]
    fn test_decode_malformed_is_typed() {
        let err = ReasoningSnapshot::from_json("not json").unwrap_err();
        assert!(matches!(err, SnapshotError::Malformed(_)));
    }

    #[test]
    fn test_roundtrip() {
        let snapshot = ReasoningSnapshot::new(evidence(2), vec![1]);
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed = ReasoningSnapshot::from_json(&json).unwrap();
        assert_eq!(parsed.citations, vec![1]);
        assert_eq!(parsed.evidence.len(), 2);
    }
}
