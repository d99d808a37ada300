//! Read-side report assembly.
//!
//! Joins the stored report, claims, evidence, origin trace, and audit
//! limitations into the single view handed to callers. Citations come
//! from the claim's own reasoning snapshot when one exists; claims
//! without a snapshot fall back to their first few web extracts.

use anyhow::Result;
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::domain::{
    ClaimStatus, Credibility, EvidenceItem, EvidenceKind, OriginTrace, Report, TimelineEntry,
};

use super::ReportStore;

/// Citations shown per claim from its reasoning snapshot
const MAX_SNAPSHOT_CITATIONS: usize = 5;

/// Fallback citations per claim when no snapshot exists
const MAX_FALLBACK_CITATIONS: usize = 3;

/// One resolved citation on a claim
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    pub credibility: Credibility,
}

/// One claim row in the assembled view
#[derive(Debug, Clone, Serialize)]
pub struct ClaimView {
    pub claim_text: String,
    pub status: ClaimStatus,
    pub confidence: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub citations: Vec<Citation>,
}

/// Evidence partitioned for display
#[derive(Debug, Clone, Serialize)]
pub struct EvidenceGallery {
    pub web_extracts: Vec<EvidenceItem>,
    pub image_matches: Vec<EvidenceItem>,
    pub trusted_sources: Vec<EvidenceItem>,
}

/// Provenance section of the view
#[derive(Debug, Clone, Serialize)]
pub struct OriginView {
    pub most_likely_origin_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_appearance: Option<String>,
    pub timeline: Vec<TimelineEntry>,
}

/// The full assembled report
#[derive(Debug, Clone, Serialize)]
pub struct ReportView {
    #[serde(flatten)]
    pub report: Report,
    pub key_claims: Vec<ClaimView>,
    pub evidence: EvidenceGallery,
    pub origin_tracing: OriginView,
    pub limitations: Vec<String>,
}

impl ReportStore {
    /// Assemble the full view for one report, or None if it is unknown
    pub async fn assemble_view(
        &self,
        config: &Config,
        report_id: Uuid,
    ) -> Result<Option<ReportView>> {
        let Some(report) = self.load_report(report_id).await? else {
            return Ok(None);
        };

        let claims = self.list_claims(report_id).await?;
        let evidence = self.list_evidence(report_id).await?;
        let origin = self.load_origin(report_id).await?;
        let limitations = self.limitations(report_id).await?;

        let key_claims = claims
            .into_iter()
            .map(|claim| {
                let citations = match &claim.reasoning {
                    Some(snapshot) => snapshot
                        .cited_evidence()
                        .into_iter()
                        .take(MAX_SNAPSHOT_CITATIONS)
                        .map(|ev| Citation {
                            url: ev.url.clone().unwrap_or_default(),
                            publisher: ev.publisher.clone(),
                            date: ev.published_date.clone(),
                            snippet: ev.snippet.clone(),
                            credibility: ev.credibility,
                        })
                        .collect(),
                    None => evidence
                        .iter()
                        .filter(|e| {
                            e.kind == EvidenceKind::WebExtract && e.claim_id == Some(claim.id)
                        })
                        .take(MAX_FALLBACK_CITATIONS)
                        .map(|e| Citation {
                            url: e.url.clone(),
                            publisher: e.publisher.clone(),
                            date: e.published_date.clone(),
                            snippet: e.snippet.clone(),
                            credibility: e.credibility,
                        })
                        .collect(),
                };

                ClaimView {
                    claim_text: claim.claim_text,
                    status: claim.status,
                    confidence: claim.confidence,
                    rationale: claim.rationale,
                    citations,
                }
            })
            .collect();

        let gallery = EvidenceGallery {
            web_extracts: evidence
                .iter()
                .filter(|e| e.kind == EvidenceKind::WebExtract)
                .cloned()
                .collect(),
            image_matches: evidence
                .iter()
                .filter(|e| e.kind == EvidenceKind::ImageMatch)
                .take(config.max_image_matches_total)
                .cloned()
                .collect(),
            trusted_sources: evidence
                .iter()
                .filter(|e| e.credibility == Credibility::Trusted)
                .cloned()
                .collect(),
        };

        let origin_tracing = match origin {
            Some(OriginTrace {
                likely_origin_url,
                earliest_appearance,
                timeline,
                ..
            }) => OriginView {
                most_likely_origin_urls: likely_origin_url.into_iter().collect(),
                earliest_appearance,
                timeline,
            },
            None => OriginView {
                most_likely_origin_urls: Vec::new(),
                earliest_appearance: None,
                timeline: Vec::new(),
            },
        };

        Ok(Some(ReportView {
            report,
            key_claims,
            evidence: gallery,
            origin_tracing,
            limitations,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Claim, ReasonerEvidence, ReasoningSnapshot, Report};
    use tempfile::TempDir;

    fn web_item(report_id: Uuid, claim_id: Option<Uuid>, url: &str) -> EvidenceItem {
        EvidenceItem {
            id: Uuid::new_v4(),
            report_id,
            claim_id,
            kind: EvidenceKind::WebExtract,
            url: url.to_string(),
            publisher: Some("example.com".to_string()),
            published_date: None,
            title: None,
            snippet: Some("snippet".to_string()),
            thumbnail_url: None,
            credibility: Credibility::Neutral,
        }
    }

    #[tokio::test]
    async fn test_snapshot_citations_preferred() {
        let temp = TempDir::new().unwrap();
        let store = ReportStore::new(temp.path().join("reports"));

        let report = Report::from_text("text");
        store.save_report(&report).await.unwrap();

        let evidence = vec![ReasonerEvidence {
            url: Some("https://cited.example.com".to_string()),
            publisher: None,
            published_date: None,
            snippet: None,
            credibility: Credibility::Trusted,
        }];

        let mut claim = Claim::new(report.id, "a claim");
        claim.reasoning = Some(ReasoningSnapshot::new(evidence, vec![1]));
        store.append_claim(&claim).await.unwrap();

        // Uncited stored evidence should not leak into the citations.
        store
            .append_evidence(&web_item(report.id, Some(claim.id), "https://other.example.com"))
            .await
            .unwrap();

        let view = store
            .assemble_view(&Config::default(), report.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.key_claims.len(), 1);
        assert_eq!(view.key_claims[0].citations.len(), 1);
        assert_eq!(view.key_claims[0].citations[0].url, "https://cited.example.com");
    }

    #[tokio::test]
    async fn test_fallback_citations_from_web_extracts() {
        let temp = TempDir::new().unwrap();
        let store = ReportStore::new(temp.path().join("reports"));

        let report = Report::from_text("text");
        store.save_report(&report).await.unwrap();

        let claim = Claim::new(report.id, "a claim");
        store.append_claim(&claim).await.unwrap();

        for i in 0..5 {
            store
                .append_evidence(&web_item(
                    report.id,
                    Some(claim.id),
                    &format!("https://example.com/{i}"),
                ))
                .await
                .unwrap();
        }

        let view = store
            .assemble_view(&Config::default(), report.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.key_claims[0].citations.len(), 3);
        assert_eq!(view.evidence.web_extracts.len(), 5);
    }

    #[tokio::test]
    async fn test_trusted_partition_and_empty_origin() {
        let temp = TempDir::new().unwrap();
        let store = ReportStore::new(temp.path().join("reports"));

        let report = Report::from_text("text");
        store.save_report(&report).await.unwrap();

        let mut trusted = web_item(report.id, None, "https://reuters.com/a");
        trusted.credibility = Credibility::Trusted;
        store.append_evidence(&trusted).await.unwrap();
        store
            .append_evidence(&web_item(report.id, None, "https://blog.example.com/b"))
            .await
            .unwrap();

        let view = store
            .assemble_view(&Config::default(), report.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(view.evidence.trusted_sources.len(), 1);
        assert!(view.origin_tracing.most_likely_origin_urls.is_empty());
        assert!(view.origin_tracing.earliest_appearance.is_none());
    }

    #[tokio::test]
    async fn test_unknown_report_is_none() {
        let temp = TempDir::new().unwrap();
        let store = ReportStore::new(temp.path().join("reports"));
        let view = store
            .assemble_view(&Config::default(), Uuid::new_v4())
            .await
            .unwrap();
        assert!(view.is_none());
    }
}
