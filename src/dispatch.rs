//! Report dispatch: how a submitted report reaches the pipeline.
//!
//! Two implementations sit behind the `Dispatcher` seam: an inline
//! dispatcher that runs the pipeline before returning, and a queue
//! dispatcher that appends the report to a JSONL work queue for a
//! worker process. The queue follows the store pattern: append-only
//! events, state derived by replay.
//!
//! Delivery is at-least-once. Nothing stops the same report id from
//! being enqueued or picked up twice; the orchestrator tolerates that
//! by skipping reports already in a terminal state.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::Orchestrator;
use crate::domain::AuditKind;
use crate::store::ReportStore;

/// Errors that can occur with the work queue
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Queue item not found: {0}")]
    NotFound(Uuid),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid state transition: {from:?} → {to:?}")]
    InvalidTransition { from: WorkStatus, to: WorkStatus },
}

/// Processing state of a queued report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

/// An event in the queue log (append-only)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueEvent {
    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// The report being worked on
    pub report_id: Uuid,

    /// Type of queue event
    pub event_type: QueueEventType,

    /// Additional data (depends on event type)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Types of queue events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueEventType {
    Enqueued,
    ProcessingStarted,
    Completed,
    Failed,
}

/// A queue item with current state (derived from replaying events)
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub report_id: Uuid,
    pub status: WorkStatus,
    pub enqueued_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// JSONL-backed work queue
pub struct WorkQueue {
    queue_path: PathBuf,
}

impl WorkQueue {
    pub fn new(queue_path: PathBuf) -> Self {
        Self { queue_path }
    }

    async fn append_event(&self, event: &QueueEvent) -> Result<(), QueueError> {
        if let Some(parent) = self.queue_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.queue_path)
            .await?;

        let json = serde_json::to_string(event)?;
        file.write_all(format!("{json}\n").as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Replay all events to build current state
    pub async fn replay(&self) -> Result<HashMap<Uuid, WorkItem>, QueueError> {
        let mut items: HashMap<Uuid, WorkItem> = HashMap::new();

        if !self.queue_path.exists() {
            return Ok(items);
        }

        let file = File::open(&self.queue_path).await?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let event: QueueEvent = serde_json::from_str(&line)?;
            Self::apply_event(&mut items, event);
        }

        Ok(items)
    }

    fn apply_event(items: &mut HashMap<Uuid, WorkItem>, event: QueueEvent) {
        match event.event_type {
            QueueEventType::Enqueued => {
                // Re-enqueueing an id replaces its state; see module docs.
                items.insert(
                    event.report_id,
                    WorkItem {
                        report_id: event.report_id,
                        status: WorkStatus::Pending,
                        enqueued_at: event.timestamp,
                        started_at: None,
                        completed_at: None,
                        error: None,
                    },
                );
            }
            QueueEventType::ProcessingStarted => {
                if let Some(item) = items.get_mut(&event.report_id) {
                    item.status = WorkStatus::Processing;
                    item.started_at = Some(event.timestamp);
                }
            }
            QueueEventType::Completed => {
                if let Some(item) = items.get_mut(&event.report_id) {
                    item.status = WorkStatus::Done;
                    item.completed_at = Some(event.timestamp);
                }
            }
            QueueEventType::Failed => {
                if let Some(item) = items.get_mut(&event.report_id) {
                    item.status = WorkStatus::Failed;
                    item.completed_at = Some(event.timestamp);
                    if let Some(data) = event.data {
                        if let Some(error) = data.get("error").and_then(|e| e.as_str()) {
                            item.error = Some(error.to_string());
                        }
                    }
                }
            }
        }
    }

    pub async fn enqueue(&self, report_id: Uuid) -> Result<(), QueueError> {
        self.append_event(&QueueEvent {
            timestamp: Utc::now(),
            report_id,
            event_type: QueueEventType::Enqueued,
            data: None,
        })
        .await
    }

    /// All pending items, oldest first
    pub async fn pending(&self) -> Result<Vec<WorkItem>, QueueError> {
        let items = self.replay().await?;
        let mut pending: Vec<WorkItem> = items
            .into_values()
            .filter(|item| item.status == WorkStatus::Pending)
            .collect();

        pending.sort_by(|a, b| a.enqueued_at.cmp(&b.enqueued_at));
        Ok(pending)
    }

    pub async fn mark_processing(&self, report_id: Uuid) -> Result<(), QueueError> {
        let items = self.replay().await?;
        let item = items
            .get(&report_id)
            .ok_or(QueueError::NotFound(report_id))?;

        if item.status != WorkStatus::Pending {
            return Err(QueueError::InvalidTransition {
                from: item.status,
                to: WorkStatus::Processing,
            });
        }

        self.append_event(&QueueEvent {
            timestamp: Utc::now(),
            report_id,
            event_type: QueueEventType::ProcessingStarted,
            data: None,
        })
        .await
    }

    pub async fn mark_done(&self, report_id: Uuid) -> Result<(), QueueError> {
        self.append_event(&QueueEvent {
            timestamp: Utc::now(),
            report_id,
            event_type: QueueEventType::Completed,
            data: None,
        })
        .await
    }

    pub async fn mark_failed(&self, report_id: Uuid, error: &str) -> Result<(), QueueError> {
        self.append_event(&QueueEvent {
            timestamp: Utc::now(),
            report_id,
            event_type: QueueEventType::Failed,
            data: Some(serde_json::json!({ "error": error })),
        })
        .await
    }

    pub async fn get(&self, report_id: Uuid) -> Result<Option<WorkItem>, QueueError> {
        let items = self.replay().await?;
        Ok(items.get(&report_id).cloned())
    }
}

/// How a queued report reaches the pipeline
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Hand a queued report off for processing
    async fn dispatch(&self, report_id: Uuid) -> Result<()>;
}

/// Runs the pipeline before returning
pub struct InlineDispatcher {
    orchestrator: Arc<Orchestrator>,
}

impl InlineDispatcher {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl Dispatcher for InlineDispatcher {
    async fn dispatch(&self, report_id: Uuid) -> Result<()> {
        self.orchestrator.process_report(report_id).await
    }
}

/// Appends to the work queue; falls back to inline on enqueue failure
pub struct QueueDispatcher {
    queue: WorkQueue,
    store: Arc<ReportStore>,
    fallback: InlineDispatcher,
}

impl QueueDispatcher {
    pub fn new(queue: WorkQueue, store: Arc<ReportStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            queue,
            store,
            fallback: InlineDispatcher::new(orchestrator),
        }
    }
}

#[async_trait]
impl Dispatcher for QueueDispatcher {
    async fn dispatch(&self, report_id: Uuid) -> Result<()> {
        match self.queue.enqueue(report_id).await {
            Ok(()) => {
                self.store
                    .append_audit(report_id, AuditKind::Enqueue, serde_json::json!({}))
                    .await?;
                Ok(())
            }
            Err(e) => {
                warn!(report_id = %report_id, error = %e, "Enqueue failed, processing inline");
                self.store
                    .append_audit(
                        report_id,
                        AuditKind::EnqueueFailed,
                        serde_json::json!({"error": e.to_string()}),
                    )
                    .await?;
                self.fallback.dispatch(report_id).await
            }
        }
    }
}

/// Drain the queue once: process every pending item to completion
pub async fn drain_queue(queue: &WorkQueue, orchestrator: &Orchestrator) -> Result<usize> {
    let pending = queue.pending().await?;
    let count = pending.len();

    for item in pending {
        queue.mark_processing(item.report_id).await?;

        match orchestrator.process_report(item.report_id).await {
            Ok(()) => queue.mark_done(item.report_id).await?,
            Err(e) => {
                error!(report_id = %item.report_id, error = %e, "Worker failed on report");
                queue.mark_failed(item.report_id, &e.to_string()).await?;
            }
        }
    }

    Ok(count)
}

/// Worker loop: poll the queue forever
pub async fn run_worker(
    queue: WorkQueue,
    orchestrator: Arc<Orchestrator>,
    poll_interval: Duration,
) -> Result<()> {
    info!(queue = %queue.queue_path.display(), "Worker started");

    loop {
        let processed = drain_queue(&queue, &orchestrator).await?;
        if processed > 0 {
            info!(processed, "Worker drained queue");
        }
        tokio::time::sleep(poll_interval).await;
    }
}
