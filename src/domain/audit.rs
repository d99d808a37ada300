//! Append-only audit events.
//!
//! The audit log is the sole mechanism for exposing degraded-mode
//! limitations to the end user. Events are never mutated or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Types of audit events recorded during report processing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// Report submitted to the work queue
    Enqueue,

    /// Queue submission failed; fell back to inline execution
    EnqueueFailed,

    /// Claim extraction finished
    ClaimsExtracted,

    /// A search query was issued to an evidence source
    Search,

    /// A cached evidence response was reused
    CacheHit,

    /// An unconfigured evidence source was skipped
    SourceSkipped,

    /// An evidence source failed at the transport layer
    SourceFailed,

    /// The reasoning oracle was called
    OracleCall,

    /// The oracle is unconfigured and was skipped
    OracleSkipped,

    /// The oracle call failed or returned malformed output
    OracleFailed,

    /// Input-to-text extraction (OCR/transcription) succeeded
    InputExtracted,

    /// Input-to-text extraction failed or produced nothing
    InputExtractFailed,

    /// User-visible limitation notices for this report
    Limitations,

    /// Report reached the complete state
    Complete,

    /// Report reached the failed state
    Failed,
}

/// One audit event, ordered by creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique identifier
    pub id: Uuid,

    /// Report this event belongs to
    pub report_id: Uuid,

    /// Event type
    pub event_type: AuditKind,

    /// Structured payload
    pub details: serde_json::Value,

    /// When this event occurred
    pub created_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Create a new event with the current timestamp
    pub fn new(report_id: Uuid, event_type: AuditKind, details: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            report_id,
            event_type,
            details,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = AuditEvent::new(
            Uuid::new_v4(),
            AuditKind::Limitations,
            serde_json::json!({ "items": ["OCR unavailable"] }),
        );

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"limitations\""));

        let parsed: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.event_type, AuditKind::Limitations);
        assert_eq!(parsed.details["items"][0], "OCR unavailable");
    }
}
