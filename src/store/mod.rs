//! Per-report persistence.
//!
//! Each report lives in its own directory under the reports root:
//!
//! ```text
//! reports/<report_id>/
//!   report.json     current report record, rewritten on change
//!   claims.jsonl    append-only; latest entry per claim id wins
//!   evidence.jsonl  append-only
//!   origin.json     origin trace, written at finalize
//!   audit.jsonl     append-only audit trail
//! ```
//!
//! Claim state is derived by replaying `claims.jsonl`: updates are new
//! appended rows, never in-place edits. Audit events read back in file
//! order, which matches creation order.

pub mod cache;
pub mod view;

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::{AuditEvent, AuditKind, Claim, EvidenceItem, OriginTrace, Report};

pub use cache::SearchCache;
pub use view::{Citation, ClaimView, EvidenceGallery, OriginView, ReportView};

/// Filesystem store for reports and everything hanging off them
pub struct ReportStore {
    reports_dir: PathBuf,
}

impl ReportStore {
    pub fn new(reports_dir: PathBuf) -> Self {
        Self { reports_dir }
    }

    fn report_dir(&self, report_id: Uuid) -> PathBuf {
        self.reports_dir.join(report_id.to_string())
    }

    /// Write the current report record, creating its directory if needed
    pub async fn save_report(&self, report: &Report) -> Result<()> {
        let dir = self.report_dir(report.id);
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create report dir: {}", dir.display()))?;

        let path = dir.join("report.json");
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        Ok(())
    }

    pub async fn load_report(&self, report_id: Uuid) -> Result<Option<Report>> {
        let path = self.report_dir(report_id).join("report.json");
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        let report = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report: {}", path.display()))?;

        Ok(Some(report))
    }

    /// All known report ids, unordered
    pub async fn list_reports(&self) -> Result<Vec<Uuid>> {
        if !self.reports_dir.exists() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.reports_dir)
            .await
            .with_context(|| format!("Failed to list reports: {}", self.reports_dir.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                if let Ok(id) = Uuid::parse_str(name) {
                    ids.push(id);
                }
            }
        }

        Ok(ids)
    }

    /// Append a claim row; also used for updates after assessment
    pub async fn append_claim(&self, claim: &Claim) -> Result<()> {
        let path = self.report_dir(claim.report_id).join("claims.jsonl");
        self.append_jsonl(&path, claim).await
    }

    /// Replay claims; the latest row per claim id wins, in first-seen order
    pub async fn list_claims(&self, report_id: Uuid) -> Result<Vec<Claim>> {
        let path = self.report_dir(report_id).join("claims.jsonl");
        let rows: Vec<Claim> = self.read_jsonl(&path).await?;

        let mut order: Vec<Uuid> = Vec::new();
        let mut latest: std::collections::HashMap<Uuid, Claim> = std::collections::HashMap::new();
        for claim in rows {
            if !latest.contains_key(&claim.id) {
                order.push(claim.id);
            }
            latest.insert(claim.id, claim);
        }

        Ok(order.into_iter().filter_map(|id| latest.remove(&id)).collect())
    }

    pub async fn append_evidence(&self, item: &EvidenceItem) -> Result<()> {
        let path = self.report_dir(item.report_id).join("evidence.jsonl");
        self.append_jsonl(&path, item).await
    }

    pub async fn list_evidence(&self, report_id: Uuid) -> Result<Vec<EvidenceItem>> {
        let path = self.report_dir(report_id).join("evidence.jsonl");
        self.read_jsonl(&path).await
    }

    pub async fn write_origin(&self, trace: &OriginTrace) -> Result<()> {
        let dir = self.report_dir(trace.report_id);
        tokio::fs::create_dir_all(&dir).await?;

        let path = dir.join("origin.json");
        let json = serde_json::to_string_pretty(trace).context("Failed to serialize origin trace")?;
        tokio::fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write origin trace: {}", path.display()))?;

        Ok(())
    }

    pub async fn load_origin(&self, report_id: Uuid) -> Result<Option<OriginTrace>> {
        let path = self.report_dir(report_id).join("origin.json");
        if !path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read_to_string(&path).await?;
        let trace = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse origin trace: {}", path.display()))?;

        Ok(Some(trace))
    }

    /// Record an audit event. Audit failures are surfaced to the caller,
    /// which decides whether they are fatal.
    pub async fn append_audit(
        &self,
        report_id: Uuid,
        kind: AuditKind,
        details: serde_json::Value,
    ) -> Result<()> {
        let event = AuditEvent::new(report_id, kind, details);
        let path = self.report_dir(report_id).join("audit.jsonl");
        self.append_jsonl(&path, &event).await
    }

    pub async fn list_audit(&self, report_id: Uuid) -> Result<Vec<AuditEvent>> {
        let path = self.report_dir(report_id).join("audit.jsonl");
        self.read_jsonl(&path).await
    }

    /// Limitation strings recorded for a report, flattened from audit events
    pub async fn limitations(&self, report_id: Uuid) -> Result<Vec<String>> {
        let events = self.list_audit(report_id).await?;
        let mut items = Vec::new();

        for event in events {
            if event.event_type != AuditKind::Limitations {
                continue;
            }
            if let Some(list) = event.details.get("items").and_then(|v| v.as_array()) {
                for item in list {
                    if let Some(text) = item.as_str() {
                        items.push(text.to_string());
                    }
                }
            }
        }

        Ok(items)
    }

    async fn append_jsonl<T: Serialize>(&self, path: &PathBuf, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .with_context(|| format!("Failed to open for append: {}", path.display()))?;

        let json = serde_json::to_string(value).context("Failed to serialize record")?;
        file.write_all(format!("{json}\n").as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    async fn read_jsonl<T: DeserializeOwned>(&self, path: &PathBuf) -> Result<Vec<T>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path)
            .await
            .with_context(|| format!("Failed to open: {}", path.display()))?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        let mut records = Vec::new();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse record in {}: {line}", path.display()))?;
            records.push(record);
        }

        Ok(records)
    }
}
