//! Report pipeline orchestration.
//!
//! Drives one report through its whole lifecycle:
//! `queued → running → {complete, failed}`. Claims, evidence, and audit
//! rows are appended as the run progresses, but the report record itself
//! is only rewritten at two points: the transition to running, and the
//! single finalize at the end. Everything in between lives in an
//! in-memory context.
//!
//! Collaborator failures degrade: a broken source or oracle leaves
//! Unclear claims behind, never a failed report. Only unexpected errors
//! (storage, serialization) fail the report, and those are captured in
//! `error_message` plus a `failed` audit event.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::adapters::{
    extract, EvidenceSource, GdeltNews, GeminiOracle, GoogleCse, Oracle, OracleClient,
    OracleDiagnostic,
};
use crate::config::Config;
use crate::domain::{
    AuditKind, Claim, ClaimStatus, InputType, ReasoningSnapshot, Report, ReportStatus, Verdict,
};
use crate::store::{ReportStore, SearchCache};

use super::claims::{extract_claims, DEFAULT_MAX_CLAIMS};
use super::gather::EvidenceGatherer;
use super::scoring::compute_claim_confidence;

/// Builds the evidence sources for a pipeline run.
///
/// Boxed sources are consumed per run, so the orchestrator asks for a
/// fresh set each time. Tests substitute stub sources here.
pub trait SourceProvider: Send + Sync {
    fn text_sources(&self) -> Result<Vec<Box<dyn EvidenceSource>>>;
    fn image_source(&self) -> Result<Option<Box<dyn EvidenceSource>>>;
}

/// Production sources: Google CSE web + GDELT for text, Google CSE images
pub struct LiveSources {
    config: Arc<Config>,
}

impl LiveSources {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl SourceProvider for LiveSources {
    fn text_sources(&self) -> Result<Vec<Box<dyn EvidenceSource>>> {
        Ok(vec![
            Box::new(GoogleCse::web(&self.config)?),
            Box::new(GdeltNews::new(&self.config)?),
        ])
    }

    fn image_source(&self) -> Result<Option<Box<dyn EvidenceSource>>> {
        Ok(Some(Box::new(GoogleCse::images(&self.config)?)))
    }
}

/// Runs reports through the verification pipeline
pub struct Orchestrator {
    config: Arc<Config>,
    store: Arc<ReportStore>,
    cache: Arc<SearchCache>,
    oracle: OracleClient,
    sources: Arc<dyn SourceProvider>,
}

/// Accumulated state for one run, committed in a single finalize
struct PipelineContext {
    report: Report,
    text: String,
    claims: Vec<Claim>,
    limitations: Vec<String>,
    web_evidence_total: usize,
    /// Observed from the sources wired into this run, not the config:
    /// injected sources may be configured even when the config is bare.
    text_source_unconfigured: bool,
}

impl Orchestrator {
    pub fn new(
        config: Arc<Config>,
        store: Arc<ReportStore>,
        cache: Arc<SearchCache>,
        oracle: Arc<dyn Oracle>,
        sources: Arc<dyn SourceProvider>,
    ) -> Self {
        Self {
            config,
            store,
            cache,
            oracle: OracleClient::new(oracle),
            sources,
        }
    }

    /// Orchestrator wired to the real external services
    pub fn live(
        config: Arc<Config>,
        store: Arc<ReportStore>,
        cache: Arc<SearchCache>,
    ) -> Result<Self> {
        let oracle: Arc<dyn Oracle> = Arc::new(GeminiOracle::new(&config)?);
        let sources = Arc::new(LiveSources::new(config.clone()));
        Ok(Self::new(config, store, cache, oracle, sources))
    }

    /// Process one report to a terminal state.
    ///
    /// Pipeline errors are captured on the report; only failures to record
    /// the failure itself surface to the caller.
    pub async fn process_report(&self, report_id: Uuid) -> Result<()> {
        match self.run_pipeline(report_id).await {
            Ok(()) => Ok(()),
            Err(e) => {
                error!(report_id = %report_id, error = %e, "Pipeline failed");
                self.mark_failed(report_id, &e).await
            }
        }
    }

    async fn run_pipeline(&self, report_id: Uuid) -> Result<()> {
        let Some(mut report) = self.store.load_report(report_id).await? else {
            anyhow::bail!("Unknown report: {report_id}");
        };
        if report.status.is_terminal() {
            debug!(report_id = %report_id, status = ?report.status, "Report already terminal, skipping");
            return Ok(());
        }

        report.status = ReportStatus::Running;
        report.updated_at = chrono::Utc::now();
        self.store.save_report(&report).await?;

        let mut ctx = PipelineContext {
            text: String::new(),
            claims: Vec::new(),
            limitations: Vec::new(),
            web_evidence_total: 0,
            text_source_unconfigured: false,
            report,
        };

        self.resolve_input_text(&mut ctx).await?;
        self.run_claims(&mut ctx).await?;
        self.finalize(ctx).await
    }

    /// Turn the submitted input into the text the pipeline works on
    async fn resolve_input_text(&self, ctx: &mut PipelineContext) -> Result<()> {
        let report = &ctx.report;

        if report.input_type == InputType::Text {
            ctx.text = report.input_text.clone().unwrap_or_default();
            return Ok(());
        }

        let extractor = extract::for_input(&self.config, report.input_type);
        let path = std::path::PathBuf::from(report.storage_path.clone().unwrap_or_default());
        let extracted = extractor.extract(&path).await;

        if extracted.ok {
            self.store
                .append_audit(
                    report.id,
                    AuditKind::InputExtracted,
                    serde_json::json!({"chars": extracted.text.chars().count()}),
                )
                .await?;
            ctx.text = extracted.text;
        } else {
            self.store
                .append_audit(report.id, AuditKind::InputExtractFailed, serde_json::json!({}))
                .await?;
            ctx.limitations.push(match report.input_type {
                InputType::Image => "OCR unavailable or no text detected in image.".to_string(),
                _ => "Transcription unavailable or no speech detected in audio.".to_string(),
            });
        }

        Ok(())
    }

    /// Extract claims, then gather evidence and assess each one
    async fn run_claims(&self, ctx: &mut PipelineContext) -> Result<()> {
        let report_id = ctx.report.id;
        let claim_texts = extract_claims(&ctx.text, DEFAULT_MAX_CLAIMS);

        self.store
            .append_audit(
                report_id,
                AuditKind::ClaimsExtracted,
                serde_json::json!({"count": claim_texts.len()}),
            )
            .await?;

        let mut gatherer = EvidenceGatherer::new(
            &self.config,
            &self.store,
            &self.cache,
            self.sources.text_sources()?,
            self.sources.image_source()?,
        );
        ctx.text_source_unconfigured = gatherer.has_unconfigured_text_source();

        for claim_text in claim_texts {
            let mut claim = Claim::new(report_id, claim_text);
            // Persist first so evidence rows can reference the claim id.
            self.store.append_claim(&claim).await?;

            let evidence = gatherer.gather_for_claim(&claim).await?;
            ctx.web_evidence_total += evidence.reasoner_evidence.len();

            let (verdict, diagnostic) = self
                .oracle
                .assess(&claim.claim_text, &evidence.reasoner_evidence)
                .await;
            self.audit_oracle(report_id, &diagnostic).await?;

            let has_conflict = verdict.status == ClaimStatus::Contradicted;
            claim.status = verdict.status;
            claim.confidence = compute_claim_confidence(
                &evidence.signals,
                evidence.corroboration_count,
                has_conflict,
            );
            claim.rationale = Some(verdict.rationale).filter(|r| !r.is_empty());
            claim.reasoning = Some(ReasoningSnapshot::new(
                evidence.reasoner_evidence,
                verdict.citations,
            ));
            self.store.append_claim(&claim).await?;

            ctx.claims.push(claim);
        }

        // Image inputs get one extra image pass tied to the report itself.
        if ctx.report.input_type == InputType::Image && !ctx.text.trim().is_empty() {
            let query = ctx
                .claims
                .first()
                .map(|c| c.claim_text.clone())
                .unwrap_or_else(|| ctx.text.clone());
            gatherer.gather_report_images(report_id, &query).await?;
        }

        let origin = gatherer.into_origin().finalize(report_id);
        self.store.write_origin(&origin).await?;

        Ok(())
    }

    async fn audit_oracle(&self, report_id: Uuid, diagnostic: &OracleDiagnostic) -> Result<()> {
        let (kind, details) = match diagnostic {
            OracleDiagnostic::Called { evidence_count } => (
                AuditKind::OracleCall,
                serde_json::json!({"evidence_count": evidence_count}),
            ),
            OracleDiagnostic::Skipped => (
                AuditKind::OracleSkipped,
                serde_json::json!({"reason": "not configured"}),
            ),
            OracleDiagnostic::Malformed => (
                AuditKind::OracleFailed,
                serde_json::json!({"error": "response was not a JSON object"}),
            ),
            OracleDiagnostic::Failed { error } => {
                (AuditKind::OracleFailed, serde_json::json!({"error": error}))
            }
        };
        self.store.append_audit(report_id, kind, details).await
    }

    /// Aggregate the verdict, record limitations, and commit the report
    async fn finalize(&self, mut ctx: PipelineContext) -> Result<()> {
        let report_id = ctx.report.id;

        if ctx.web_evidence_total == 0 {
            if !ctx.text_source_unconfigured {
                ctx.limitations
                    .push("No web evidence retrieved for the extracted claims.".to_string());
            } else {
                let mut msg =
                    "No web evidence retrieved because Google Custom Search is not configured."
                        .to_string();
                let missing = self.config.google_missing_vars();
                if !missing.is_empty() {
                    msg.push_str(&format!(" Missing: {}.", missing.join(", ")));
                }
                msg.push_str(" Set these in the environment or .truecheck/config.yaml.");
                ctx.limitations.push(msg);
            }
            ctx.limitations.push(
                "If results look incomplete, provide more context or a clearer quote fragment."
                    .to_string(),
            );
        }

        let (verdict, confidence, explanation) = aggregate_verdict(&ctx.claims);

        match ctx.report.input_type {
            InputType::Image => ctx.limitations.push(
                "AI-image detection is not enabled in this build, so AI likelihood cannot be determined."
                    .to_string(),
            ),
            InputType::Audio => ctx.limitations.push(
                "AI-voice detection is not enabled in this build, so AI likelihood cannot be determined."
                    .to_string(),
            ),
            InputType::Text => {}
        }

        if !ctx.limitations.is_empty() {
            self.store
                .append_audit(
                    report_id,
                    AuditKind::Limitations,
                    serde_json::json!({"items": ctx.limitations}),
                )
                .await?;
        }

        ctx.report.status = ReportStatus::Complete;
        ctx.report.verdict = Some(verdict);
        ctx.report.confidence = Some(confidence);
        ctx.report.explanation = Some(explanation.to_string());
        ctx.report.ai_likelihood = None;
        ctx.report.updated_at = chrono::Utc::now();
        self.store.save_report(&ctx.report).await?;

        self.store
            .append_audit(
                report_id,
                AuditKind::Complete,
                serde_json::json!({"verdict": verdict, "confidence": confidence}),
            )
            .await?;

        info!(report_id = %report_id, verdict = ?verdict, confidence, "Report complete");
        Ok(())
    }

    async fn mark_failed(&self, report_id: Uuid, error: &anyhow::Error) -> Result<()> {
        if let Some(mut report) = self
            .store
            .load_report(report_id)
            .await
            .context("Failed to load report while recording failure")?
        {
            report.status = ReportStatus::Failed;
            report.error_message = Some(error.to_string());
            report.updated_at = chrono::Utc::now();
            self.store.save_report(&report).await?;
        }

        self.store
            .append_audit(
                report_id,
                AuditKind::Failed,
                serde_json::json!({"error": error.to_string()}),
            )
            .await?;

        Ok(())
    }
}

/// Verdict aggregation over per-claim statuses.
///
/// Overall confidence is the rounded mean of claim confidences; a report
/// with no claims gets the fixed Unverifiable/20 outcome.
fn aggregate_verdict(claims: &[Claim]) -> (Verdict, u8, &'static str) {
    if claims.is_empty() {
        return (
            Verdict::Unverifiable,
            20,
            "No checkable claims were extracted from the input.",
        );
    }

    let supported = claims
        .iter()
        .filter(|c| c.status == ClaimStatus::Supported)
        .count();
    let contradicted = claims
        .iter()
        .filter(|c| c.status == ClaimStatus::Contradicted)
        .count();

    let mean = (claims.iter().map(|c| c.confidence as f64).sum::<f64>() / claims.len() as f64)
        .round() as u8;

    if contradicted > 0 && supported > 0 {
        (
            Verdict::Mixed,
            mean,
            "Some claims are supported while others are contradicted by the retrieved evidence.",
        )
    } else if contradicted > 0 {
        (
            Verdict::False,
            mean,
            "Key claims are contradicted by retrieved evidence from listed sources.",
        )
    } else if supported > 0 {
        (
            Verdict::True,
            mean,
            "Key claims are supported by retrieved evidence from listed sources.",
        )
    } else {
        (
            Verdict::Unverifiable,
            mean,
            "Evidence was insufficient or unclear to verify the extracted claims.",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_with(status: ClaimStatus, confidence: u8) -> Claim {
        let mut claim = Claim::new(Uuid::new_v4(), "text");
        claim.status = status;
        claim.confidence = confidence;
        claim
    }

    #[test]
    fn test_zero_claims_verdict() {
        let (verdict, confidence, explanation) = aggregate_verdict(&[]);
        assert_eq!(verdict, Verdict::Unverifiable);
        assert_eq!(confidence, 20);
        assert_eq!(explanation, "No checkable claims were extracted from the input.");
    }

    #[test]
    fn test_mixed_verdict_and_mean_confidence() {
        let claims = vec![
            claim_with(ClaimStatus::Supported, 80),
            claim_with(ClaimStatus::Contradicted, 70),
        ];
        let (verdict, confidence, _) = aggregate_verdict(&claims);
        assert_eq!(verdict, Verdict::Mixed);
        assert_eq!(confidence, 75);
    }

    #[test]
    fn test_false_verdict() {
        let claims = vec![
            claim_with(ClaimStatus::Contradicted, 60),
            claim_with(ClaimStatus::Unclear, 25),
        ];
        let (verdict, confidence, _) = aggregate_verdict(&claims);
        assert_eq!(verdict, Verdict::False);
        assert_eq!(confidence, 43);
    }

    #[test]
    fn test_true_verdict() {
        let claims = vec![claim_with(ClaimStatus::Supported, 90)];
        let (verdict, confidence, _) = aggregate_verdict(&claims);
        assert_eq!(verdict, Verdict::True);
        assert_eq!(confidence, 90);
    }

    #[test]
    fn test_all_unclear_is_unverifiable() {
        let claims = vec![
            claim_with(ClaimStatus::Unclear, 25),
            claim_with(ClaimStatus::Unclear, 25),
        ];
        let (verdict, confidence, _) = aggregate_verdict(&claims);
        assert_eq!(verdict, Verdict::Unverifiable);
        assert_eq!(confidence, 25);
    }
}
