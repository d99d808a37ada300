//! End-to-end pipeline tests with stubbed external collaborators.

use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;
use uuid::Uuid;

use truecheck::adapters::{EvidenceSource, Oracle, SearchResult};
use truecheck::core::{Orchestrator, SourceProvider};
use truecheck::domain::{
    AuditKind, ClaimStatus, InputType, Report, ReportStatus, Verdict,
};
use truecheck::{Config, ReportStore, SearchCache};

#[derive(Clone)]
struct StubSource {
    name: &'static str,
    configured: bool,
    results: Vec<SearchResult>,
    fail: bool,
}

#[async_trait]
impl EvidenceSource for StubSource {
    fn name(&self) -> &str {
        self.name
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn search(&self, _query: &str, _count: usize) -> Result<Vec<SearchResult>> {
        if self.fail {
            anyhow::bail!("transport error");
        }
        Ok(self.results.clone())
    }
}

struct StubProvider {
    web: StubSource,
    image: Option<StubSource>,
}

impl SourceProvider for StubProvider {
    fn text_sources(&self) -> Result<Vec<Box<dyn EvidenceSource>>> {
        Ok(vec![Box::new(self.web.clone())])
    }

    fn image_source(&self) -> Result<Option<Box<dyn EvidenceSource>>> {
        Ok(self.image.clone().map(|s| Box::new(s) as Box<dyn EvidenceSource>))
    }
}

/// Oracle that pops a canned response per call; unconfigured when empty
struct ScriptedOracle {
    responses: Mutex<Vec<String>>,
    configured: bool,
}

impl ScriptedOracle {
    fn unconfigured() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            configured: false,
        }
    }

    fn with_responses(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().rev().map(str::to_string).collect()),
            configured: true,
        }
    }
}

#[async_trait]
impl Oracle for ScriptedOracle {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        let mut responses = self.responses.lock().unwrap();
        responses.pop().ok_or_else(|| anyhow::anyhow!("no scripted response left"))
    }
}

struct Harness {
    store: Arc<ReportStore>,
    orchestrator: Orchestrator,
    _temp: TempDir,
}

fn harness(web: StubSource, oracle: ScriptedOracle) -> Harness {
    let temp = TempDir::new().unwrap();
    let config = Arc::new(Config {
        home: temp.path().to_path_buf(),
        use_queue: false,
        ..Config::default()
    });

    let store = Arc::new(ReportStore::new(config.reports_dir()));
    let cache = Arc::new(SearchCache::new(
        config.cache_path(),
        config.search_cache_ttl_seconds,
    ));
    let provider = Arc::new(StubProvider { web, image: None });
    let orchestrator = Orchestrator::new(config, store.clone(), cache, Arc::new(oracle), provider);

    Harness {
        store,
        orchestrator,
        _temp: temp,
    }
}

fn unconfigured_web() -> StubSource {
    StubSource {
        name: "web",
        configured: false,
        results: Vec::new(),
        fail: false,
    }
}

fn web_with(results: Vec<SearchResult>) -> StubSource {
    StubSource {
        name: "web",
        configured: true,
        results,
        fail: false,
    }
}

fn result(url: &str, publisher: &str) -> SearchResult {
    SearchResult {
        url: Some(url.to_string()),
        publisher: Some(publisher.to_string()),
        snippet: Some("a relevant snippet".to_string()),
        published_date: Some("2024-03-15".to_string()),
        ..Default::default()
    }
}

const TWO_CLAIM_TEXT: &str =
    "The president said the economy grew by 5% last year. The new policy was signed in 2023.";

#[tokio::test]
async fn unconfigured_everything_still_completes() {
    let h = harness(unconfigured_web(), ScriptedOracle::unconfigured());

    let report = Report::from_text(TWO_CLAIM_TEXT);
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();

    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Complete);
    assert_eq!(done.verdict, Some(Verdict::Unverifiable));
    assert!(done.ai_likelihood.is_none());

    // Every claim is Unclear at the empty-evidence baseline.
    let claims = h.store.list_claims(report.id).await.unwrap();
    assert_eq!(claims.len(), 2);
    for claim in &claims {
        assert_eq!(claim.status, ClaimStatus::Unclear);
        assert_eq!(claim.confidence, 25);
        assert!(claim.rationale.is_none());
    }
    assert_eq!(done.confidence, Some(25));

    let limitations = h.store.limitations(report.id).await.unwrap();
    assert!(limitations
        .iter()
        .any(|l| l.contains("Google Custom Search is not configured")));
    assert!(limitations
        .iter()
        .any(|l| l.contains("provide more context or a clearer quote fragment")));

    let audit = h.store.list_audit(report.id).await.unwrap();
    assert!(audit.iter().any(|e| e.event_type == AuditKind::SourceSkipped));
    assert!(audit.iter().any(|e| e.event_type == AuditKind::OracleSkipped));
    assert!(audit.iter().any(|e| e.event_type == AuditKind::Limitations));
    assert_eq!(audit.last().unwrap().event_type, AuditKind::Complete);
}

#[tokio::test]
async fn zero_claims_gets_fixed_outcome() {
    let h = harness(unconfigured_web(), ScriptedOracle::unconfigured());

    let report = Report::from_text("Hi.");
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();

    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Complete);
    assert_eq!(done.verdict, Some(Verdict::Unverifiable));
    assert_eq!(done.confidence, Some(20));
    assert_eq!(
        done.explanation.as_deref(),
        Some("No checkable claims were extracted from the input.")
    );
    assert!(h.store.list_claims(report.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn mixed_verdict_from_disagreeing_claims() {
    let oracle = ScriptedOracle::with_responses(vec![
        r#"{"status": "Supported", "rationale": "Evidence [1] confirms the figure.", "citations": [1]}"#,
        r#"{"status": "Contradicted", "rationale": "Evidence [1] reports the opposite.", "citations": [1]}"#,
    ]);
    let h = harness(
        web_with(vec![result("https://reuters.com/a", "reuters.com")]),
        oracle,
    );

    let report = Report::from_text(TWO_CLAIM_TEXT);
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();

    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Complete);
    assert_eq!(done.verdict, Some(Verdict::Mixed));
    assert_eq!(
        done.explanation.as_deref(),
        Some("Some claims are supported while others are contradicted by the retrieved evidence.")
    );

    let claims = h.store.list_claims(report.id).await.unwrap();
    assert_eq!(claims[0].status, ClaimStatus::Supported);
    assert_eq!(claims[1].status, ClaimStatus::Contradicted);
    // The contradicted claim pays the conflict penalty.
    assert!(claims[1].confidence < claims[0].confidence);

    // Citations are preserved in the claim's reasoning snapshot.
    let snapshot = claims[0].reasoning.as_ref().unwrap();
    assert_eq!(snapshot.citations, vec![1]);
    assert_eq!(snapshot.cited_evidence().len(), 1);
}

#[tokio::test]
async fn fenced_oracle_output_is_parsed() {
    let oracle = ScriptedOracle::with_responses(vec![
        "```json\n{\"status\": \"Supported\", \"rationale\": \"Backed by [1].\", \"citations\": [1]}\n```",
    ]);
    let h = harness(
        web_with(vec![result("https://reuters.com/a", "reuters.com")]),
        oracle,
    );

    let report = Report::from_text("The election was held in 2022.");
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();

    let claims = h.store.list_claims(report.id).await.unwrap();
    assert_eq!(claims.len(), 1);
    assert_eq!(claims[0].status, ClaimStatus::Supported);
    assert_eq!(claims[0].rationale.as_deref(), Some("Backed by [1]."));

    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.verdict, Some(Verdict::True));
}

#[tokio::test]
async fn garbage_oracle_output_degrades_to_unclear() {
    let oracle = ScriptedOracle::with_responses(vec!["the model rambled instead of answering"]);
    let h = harness(
        web_with(vec![result("https://reuters.com/a", "reuters.com")]),
        oracle,
    );

    let report = Report::from_text("The election was held in 2022.");
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();

    let claims = h.store.list_claims(report.id).await.unwrap();
    assert_eq!(claims[0].status, ClaimStatus::Unclear);
    assert!(claims[0].rationale.is_none());

    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Complete);
    assert_eq!(done.verdict, Some(Verdict::Unverifiable));

    // The degraded assessment is visible in the audit trail, unlike a
    // genuine Unclear verdict.
    let audit = h.store.list_audit(report.id).await.unwrap();
    let failure = audit
        .iter()
        .find(|e| e.event_type == AuditKind::OracleFailed)
        .unwrap();
    assert_eq!(
        failure.details["error"].as_str(),
        Some("response was not a JSON object")
    );
}

#[tokio::test]
async fn failing_source_never_fails_the_report() {
    let web = StubSource {
        name: "web",
        configured: true,
        results: Vec::new(),
        fail: true,
    };
    let h = harness(web, ScriptedOracle::unconfigured());

    let report = Report::from_text("The election was held in 2022.");
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();

    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Complete);

    let audit = h.store.list_audit(report.id).await.unwrap();
    assert!(audit.iter().any(|e| e.event_type == AuditKind::SourceFailed));

    // Configured-but-failing sources report the generic no-evidence limitation.
    let limitations = h.store.limitations(report.id).await.unwrap();
    assert!(!limitations
        .iter()
        .any(|l| l.contains("Google Custom Search is not configured")));
    assert!(limitations
        .iter()
        .any(|l| l == "No web evidence retrieved for the extracted claims."));
}

#[tokio::test]
async fn terminal_reports_are_not_reprocessed() {
    let h = harness(unconfigured_web(), ScriptedOracle::unconfigured());

    let report = Report::from_text(TWO_CLAIM_TEXT);
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();
    let first_claims = h.store.list_claims(report.id).await.unwrap();

    // At-least-once delivery can hand the same id over again.
    h.orchestrator.process_report(report.id).await.unwrap();
    let second_claims = h.store.list_claims(report.id).await.unwrap();

    assert_eq!(first_claims.len(), second_claims.len());
    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Complete);
}

#[tokio::test]
async fn unknown_report_is_marked_failed_in_audit() {
    let h = harness(unconfigured_web(), ScriptedOracle::unconfigured());

    let missing = Uuid::new_v4();
    h.orchestrator.process_report(missing).await.unwrap();

    // No report record exists, but the failure leaves an audit trace.
    let audit = h.store.list_audit(missing).await.unwrap();
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].event_type, AuditKind::Failed);
}

#[tokio::test]
async fn audio_report_without_transcriber_reports_limitations() {
    let h = harness(unconfigured_web(), ScriptedOracle::unconfigured());

    let report = Report::new(InputType::Audio, None, Some("/nonexistent.m4a".to_string()));
    h.store.save_report(&report).await.unwrap();
    h.orchestrator.process_report(report.id).await.unwrap();

    let done = h.store.load_report(report.id).await.unwrap().unwrap();
    assert_eq!(done.status, ReportStatus::Complete);
    assert_eq!(done.verdict, Some(Verdict::Unverifiable));
    assert_eq!(done.confidence, Some(20));

    let limitations = h.store.limitations(report.id).await.unwrap();
    assert!(limitations
        .iter()
        .any(|l| l.contains("Transcription unavailable")));
    assert!(limitations
        .iter()
        .any(|l| l.contains("AI-voice detection is not enabled")));

    let audit = h.store.list_audit(report.id).await.unwrap();
    assert!(audit
        .iter()
        .any(|e| e.event_type == AuditKind::InputExtractFailed));
}
