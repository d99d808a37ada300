//! Evidence items, credibility tiers, and the origin trace.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Deterministic domain-based credibility tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credibility {
    Trusted,
    Neutral,
    Unknown,
    #[serde(rename = "Low credibility")]
    Low,
}

impl std::fmt::Display for Credibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trusted => write!(f, "Trusted"),
            Self::Neutral => write!(f, "Neutral"),
            Self::Unknown => write!(f, "Unknown"),
            Self::Low => write!(f, "Low credibility"),
        }
    }
}

/// Kind of evidence unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceKind {
    /// A web/news search result attached to a claim
    WebExtract,

    /// An image-search result (not passed to the reasoning oracle)
    ImageMatch,
}

/// One row per evidence unit returned by a source. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// Unique identifier
    pub id: Uuid,

    /// Report this evidence belongs to
    pub report_id: Uuid,

    /// Claim it supports; None for report-level image matches
    pub claim_id: Option<Uuid>,

    /// Evidence kind
    pub kind: EvidenceKind,

    /// Source URL
    pub url: String,

    /// Publisher / display host
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,

    /// Publication date as returned by the source (unparsed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,

    /// Pure function of url/publisher
    pub credibility: Credibility,
}

/// A dated sighting in the provenance timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Parsed publication date (ISO 8601 date)
    pub date: NaiveDate,

    /// Publisher name, used as sort tiebreak
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Source URL (entries without one are never stored)
    pub url: String,

    /// Context snippet, capped at 240 chars
    pub context: String,
}

/// Provenance trace, one per report, written once at finalize time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginTrace {
    pub report_id: Uuid,

    /// URL of the earliest dated sighting
    pub likely_origin_url: Option<String>,

    /// Date of the earliest dated sighting (ISO date string)
    pub earliest_appearance: Option<String>,

    /// Sorted ascending by (date, source), capped at 30 entries
    pub timeline: Vec<TimelineEntry>,
}
