//! truecheck - evidence-backed claim verification
//!
//! Takes a piece of text (or an image/audio upload reduced to text),
//! extracts checkable claims, gathers evidence from external search
//! indexes, asks a reasoning oracle to rate each claim against that
//! evidence, and aggregates the results into a report with a verdict,
//! confidence, provenance timeline, and a full audit trail.
//!
//! # Architecture
//!
//! Persistence is append-only: claims, evidence, cache entries, audit
//! events, and the work queue are JSONL files whose state is derived by
//! replay. External collaborators sit behind traits and fail soft; a
//! broken search index or oracle degrades a report, it never fails one.
//!
//! # Modules
//!
//! - `adapters`: external collaborators (search indexes, oracle, extraction)
//! - `core`: claim extraction, scoring, gathering, orchestration
//! - `domain`: data structures (Report, Claim, EvidenceItem, AuditEvent)
//! - `store`: per-report persistence and the search cache
//! - `dispatch`: work queue and dispatcher seam
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Submit text for verification
//! echo "The election was held in 2022." | truecheck submit
//!
//! # Check report status
//! truecheck status <report-id>
//!
//! # Print the assembled report
//! truecheck report <report-id>
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod dispatch;
pub mod domain;
pub mod store;

// Re-export main types at crate root for convenience
pub use config::Config;
pub use core::Orchestrator;
pub use dispatch::{Dispatcher, InlineDispatcher, QueueDispatcher, WorkQueue};
pub use domain::{
    AuditEvent, AuditKind, Claim, ClaimStatus, Credibility, EvidenceItem, EvidenceKind, InputType,
    OriginTrace, Report, ReportStatus, Verdict,
};
pub use store::{ReportStore, ReportView, SearchCache};
