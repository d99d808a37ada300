//! Domain types for the truecheck pipeline.
//!
//! This module contains the core data structures:
//! - Report: the unit of work and its state machine fields
//! - Claim: extracted assertions with reasoning snapshots
//! - Evidence: search results, credibility tiers, origin trace
//! - Audit: append-only processing trail

pub mod audit;
pub mod claim;
pub mod evidence;
pub mod report;

// Re-export commonly used types
pub use audit::{AuditEvent, AuditKind};
pub use claim::{
    Claim, ClaimStatus, ReasonerEvidence, ReasoningSnapshot, SnapshotError,
    SNAPSHOT_SCHEMA_VERSION,
};
pub use evidence::{Credibility, EvidenceItem, EvidenceKind, OriginTrace, TimelineEntry};
pub use report::{InputType, Report, ReportStatus, Verdict};
