//! Evidence gathering: fan a claim out to the configured sources,
//! consulting the cache first and degrading soft on any source failure.
//!
//! Every source outcome is audited: a skipped unconfigured source, a
//! cache hit, a live search, and a transport failure each leave a row
//! in the report's audit trail. Gathered items are persisted as they
//! arrive; the caller only sees the in-memory view it needs for
//! assessment and scoring.

use std::collections::HashSet;

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::adapters::{EvidenceSource, SearchResult};
use crate::config::Config;
use crate::domain::{AuditKind, Claim, EvidenceItem, EvidenceKind, ReasonerEvidence};
use crate::store::{ReportStore, SearchCache};

use super::credibility::label_credibility;
use super::origin::OriginTracer;
use super::scoring::EvidenceSignal;

/// Everything assessment needs for one claim
pub struct ClaimEvidence {
    /// Web/news evidence, in gathering order, fed to the oracle
    pub reasoner_evidence: Vec<ReasonerEvidence>,

    /// Scoring signals, one per web/news item
    pub signals: Vec<EvidenceSignal>,

    /// Distinct (publisher, url) pairs among the web/news items
    pub corroboration_count: usize,
}

/// Gathers and persists evidence for one report
pub struct EvidenceGatherer<'a> {
    store: &'a ReportStore,
    cache: &'a SearchCache,
    sources: Vec<Box<dyn EvidenceSource>>,
    image_source: Option<Box<dyn EvidenceSource>>,
    origin: OriginTracer,
    result_count: usize,
    max_image_per_claim: usize,
    image_budget: usize,
}

impl<'a> EvidenceGatherer<'a> {
    pub fn new(
        config: &Config,
        store: &'a ReportStore,
        cache: &'a SearchCache,
        sources: Vec<Box<dyn EvidenceSource>>,
        image_source: Option<Box<dyn EvidenceSource>>,
    ) -> Self {
        Self {
            store,
            cache,
            sources,
            image_source,
            origin: OriginTracer::new(),
            result_count: config.search_result_count,
            max_image_per_claim: config.max_image_matches_per_claim,
            image_budget: config.max_image_matches_total,
        }
    }

    /// Query every text source for a claim and persist what comes back
    pub async fn gather_for_claim(&mut self, claim: &Claim) -> Result<ClaimEvidence> {
        let mut reasoner_evidence = Vec::new();
        let mut signals = Vec::new();
        let mut corroboration: HashSet<(Option<String>, String)> = HashSet::new();

        for i in 0..self.sources.len() {
            let results = self
                .fetch_text_source(claim.report_id, i, &claim.claim_text)
                .await?;

            for result in results {
                let Some(url) = result.url.clone().filter(|u| !u.is_empty()) else {
                    continue;
                };

                let credibility =
                    label_credibility(Some(url.as_str()), result.publisher.as_deref());

                self.origin.record(
                    Some(&url),
                    result.publisher.as_deref(),
                    result.published_date.as_deref(),
                    result.snippet.as_deref().or(result.title.as_deref()),
                );

                let item = EvidenceItem {
                    id: Uuid::new_v4(),
                    report_id: claim.report_id,
                    claim_id: Some(claim.id),
                    kind: EvidenceKind::WebExtract,
                    url: url.clone(),
                    publisher: result.publisher.clone(),
                    published_date: result.published_date.clone(),
                    title: result.title.clone(),
                    snippet: result.snippet.clone(),
                    thumbnail_url: result.thumbnail_url.clone(),
                    credibility,
                };
                self.store.append_evidence(&item).await?;

                reasoner_evidence.push(ReasonerEvidence {
                    url: Some(url.clone()),
                    publisher: result.publisher.clone(),
                    published_date: result.published_date.clone(),
                    snippet: result.snippet.clone(),
                    credibility,
                });
                signals.push(EvidenceSignal {
                    credibility,
                    published_date: result.published_date.clone(),
                });
                corroboration.insert((result.publisher.clone(), url));
            }
        }

        if let Some(claim_images) = self
            .gather_images(claim.report_id, Some(claim.id), &claim.claim_text)
            .await?
        {
            debug!(claim_id = %claim.id, count = claim_images, "Stored image matches");
        }

        Ok(ClaimEvidence {
            reasoner_evidence,
            signals,
            corroboration_count: corroboration.len(),
        })
    }

    /// Image search attached to the report itself rather than a claim.
    /// Used for image-input reports where the query is the extracted text.
    pub async fn gather_report_images(&mut self, report_id: Uuid, query: &str) -> Result<usize> {
        Ok(self.gather_images(report_id, None, query).await?.unwrap_or(0))
    }

    /// Consume the accumulated provenance candidates
    pub fn into_origin(self) -> OriginTracer {
        self.origin
    }

    /// True when any text source wired for this run lacks credentials.
    /// Drives the "not configured" limitation on zero-evidence reports.
    pub fn has_unconfigured_text_source(&self) -> bool {
        self.sources.iter().any(|s| !s.is_configured())
    }

    async fn fetch_text_source(
        &self,
        report_id: Uuid,
        index: usize,
        query: &str,
    ) -> Result<Vec<SearchResult>> {
        let source = &self.sources[index];
        self.fetch(report_id, source.as_ref(), query, self.result_count)
            .await
    }

    /// Returns None when no image source is wired up, Some(count) otherwise
    async fn gather_images(
        &mut self,
        report_id: Uuid,
        claim_id: Option<Uuid>,
        query: &str,
    ) -> Result<Option<usize>> {
        let Some(source) = self.image_source.take() else {
            return Ok(None);
        };

        let quota = self.max_image_per_claim.min(self.image_budget);
        let mut stored = 0;

        if quota > 0 {
            let results = self.fetch(report_id, source.as_ref(), query, quota).await?;

            for result in results.into_iter().take(quota) {
                let Some(url) = result.url.clone().filter(|u| !u.is_empty()) else {
                    continue;
                };

                let item = EvidenceItem {
                    id: Uuid::new_v4(),
                    report_id,
                    claim_id,
                    kind: EvidenceKind::ImageMatch,
                    url: url.clone(),
                    publisher: result.publisher.clone(),
                    published_date: None,
                    title: result.title.clone(),
                    snippet: None,
                    thumbnail_url: result.thumbnail_url.clone(),
                    credibility: label_credibility(
                        Some(url.as_str()),
                        result.publisher.as_deref(),
                    ),
                };
                self.store.append_evidence(&item).await?;
                stored += 1;
            }

            self.image_budget = self.image_budget.saturating_sub(stored);
        }

        self.image_source = Some(source);
        Ok(Some(stored))
    }

    /// One cached, audited call to a source. Unconfigured sources and
    /// transport failures both degrade to an empty result list.
    async fn fetch(
        &self,
        report_id: Uuid,
        source: &dyn EvidenceSource,
        query: &str,
        count: usize,
    ) -> Result<Vec<SearchResult>> {
        if !source.is_configured() {
            self.store
                .append_audit(
                    report_id,
                    AuditKind::SourceSkipped,
                    serde_json::json!({"source": source.name(), "reason": "not configured"}),
                )
                .await?;
            return Ok(Vec::new());
        }

        let key = cache_key(source.name(), query, count);

        if let Some(payload) = self.cache.get(source.name(), &key).await? {
            if let Ok(results) = serde_json::from_value::<Vec<SearchResult>>(payload) {
                self.store
                    .append_audit(
                        report_id,
                        AuditKind::CacheHit,
                        serde_json::json!({"source": source.name(), "results": results.len()}),
                    )
                    .await?;
                return Ok(results);
            }
        }

        match source.search(query, count).await {
            Ok(results) => {
                // Empty responses are cached too; a source with nothing to
                // say should not be re-queried within the TTL.
                self.cache
                    .put(source.name(), &key, serde_json::to_value(&results)?)
                    .await?;
                self.store
                    .append_audit(
                        report_id,
                        AuditKind::Search,
                        serde_json::json!({"source": source.name(), "results": results.len()}),
                    )
                    .await?;
                Ok(results)
            }
            Err(e) => {
                warn!(source = source.name(), error = %e, "Evidence source failed");
                self.store
                    .append_audit(
                        report_id,
                        AuditKind::SourceFailed,
                        serde_json::json!({"source": source.name(), "error": e.to_string()}),
                    )
                    .await?;
                Ok(Vec::new())
            }
        }
    }
}

/// Cache key: hash of kind, normalized query, and requested count.
/// Queries differing only in case or whitespace share an entry.
pub fn cache_key(kind: &str, query: &str, count: usize) -> String {
    let normalized = query
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let mut hasher = Sha256::new();
    hasher.update(format!("{kind}|{normalized}|{count}").as_bytes());
    hex::encode(hasher.finalize())
}
