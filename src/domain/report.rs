//! Report record and its closed status/verdict sets.
//!
//! A Report is the unit of work for the whole pipeline. Its status is
//! monotonic: `queued → running → {complete, failed}`, with no transition
//! out of a terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of user-submitted input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Text,
    Image,
    Audio,
}

/// Lifecycle state of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    /// Created, waiting for a worker
    Queued,

    /// Pipeline is processing it
    Running,

    /// Terminal: all claims processed, verdict written
    Complete,

    /// Terminal: unhandled error, message captured
    Failed,
}

impl ReportStatus {
    /// Terminal states admit no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Report-level outcome aggregated from per-claim statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    True,
    False,
    Mixed,
    Unverifiable,
}

/// A verification report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Unique identifier
    pub id: Uuid,

    /// What kind of input was submitted
    pub input_type: InputType,

    /// Raw text input (text reports)
    pub input_text: Option<String>,

    /// Path to the stored upload (image/audio reports)
    pub storage_path: Option<String>,

    /// Current lifecycle state
    pub status: ReportStatus,

    /// Overall verdict (written at finalize)
    pub verdict: Option<Verdict>,

    /// Overall confidence 0-100 (written at finalize)
    pub confidence: Option<u8>,

    /// AI-generation likelihood; always None in this build
    pub ai_likelihood: Option<u8>,

    /// One fixed sentence per verdict category
    pub explanation: Option<String>,

    /// Error message if the report failed
    pub error_message: Option<String>,

    /// When the report was created
    pub created_at: DateTime<Utc>,

    /// Last state change
    pub updated_at: DateTime<Utc>,
}

impl Report {
    /// Create a new queued report
    pub fn new(input_type: InputType, input_text: Option<String>, storage_path: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            input_type,
            input_text,
            storage_path,
            status: ReportStatus::Queued,
            verdict: None,
            confidence: None,
            ai_likelihood: None,
            explanation: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a text report
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::new(InputType::Text, Some(text.into()), None)
    }
}
