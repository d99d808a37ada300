//! Adapter interfaces for external collaborators.
//!
//! Everything that leaves the process goes through a trait defined here:
//! evidence search indexes, the reasoning oracle, and input-to-text
//! extraction. All of them fail soft; the pipeline treats a broken
//! collaborator as an empty one.

pub mod extract;
pub mod gdelt;
pub mod google_cse;
pub mod oracle;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use extract::{CommandExtractor, ExtractedText, InputExtractor, UnavailableExtractor};
pub use gdelt::GdeltNews;
pub use google_cse::GoogleCse;
pub use oracle::{GeminiOracle, Oracle, OracleClient, OracleDiagnostic, OracleVerdict};

/// One result returned by an evidence source.
///
/// Also the cache payload shape: responses are cached as `Vec<SearchResult>`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    pub url: Option<String>,
    pub title: Option<String>,
    pub snippet: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
    pub thumbnail_url: Option<String>,
}

/// An external search index queried per claim
#[async_trait]
pub trait EvidenceSource: Send + Sync {
    /// Source name; also used as the cache kind
    fn name(&self) -> &str;

    /// False when credentials are missing; such sources are skipped
    fn is_configured(&self) -> bool;

    /// Issue a query. Transport errors surface here; the caller degrades
    /// them to an empty result list.
    async fn search(&self, query: &str, count: usize) -> Result<Vec<SearchResult>>;
}
