//! Core verification logic.
//!
//! This module contains:
//! - Claims: rule-based claim extraction
//! - Credibility: deterministic domain-tier labeling
//! - Scoring: per-claim confidence computation
//! - Gather: cached, audited evidence collection
//! - Origin: provenance timeline tracing
//! - Orchestrator: the report pipeline state machine

pub mod claims;
pub mod credibility;
pub mod dates;
pub mod gather;
pub mod orchestrator;
pub mod origin;
pub mod sanitize;
pub mod scoring;

// Re-export commonly used types
pub use claims::{extract_claims, DEFAULT_MAX_CLAIMS};
pub use credibility::label_credibility;
pub use gather::{cache_key, ClaimEvidence, EvidenceGatherer};
pub use orchestrator::{LiveSources, Orchestrator, SourceProvider};
pub use origin::OriginTracer;
pub use sanitize::sanitize_untrusted_text;
pub use scoring::{compute_claim_confidence, EvidenceSignal, EMPTY_SIGNALS_BASELINE};
