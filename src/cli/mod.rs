//! Command-line interface for truecheck.
//!
//! Provides commands for submitting inputs for verification, checking
//! report status, printing assembled reports and audit trails, running
//! the queue worker, and inspecting configuration.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::config::Config;
use crate::core::Orchestrator;
use crate::dispatch::{drain_queue, run_worker, Dispatcher, InlineDispatcher, QueueDispatcher, WorkQueue};
use crate::domain::{InputType, Report, ReportStatus};
use crate::store::{ReportStore, SearchCache};

/// truecheck - evidence-backed claim verification
#[derive(Parser, Debug)]
#[command(name = "truecheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit an input for verification
    Submit {
        /// Text to verify (reads from stdin if neither this nor --file is given)
        text: Option<String>,

        /// File to verify (image or audio upload)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Input type for --file submissions
        #[arg(short = 't', long, value_enum, default_value = "image")]
        input_type: FileInputType,

        /// Process inline even when the queue is enabled
        #[arg(long)]
        inline: bool,
    },

    /// Check the status of a report
    Status {
        /// Report ID (UUID)
        report_id: String,
    },

    /// Print the full assembled report as JSON
    Report {
        /// Report ID (UUID)
        report_id: String,
    },

    /// Print the audit trail of a report
    Audit {
        /// Report ID (UUID)
        report_id: String,
    },

    /// List known reports
    Reports,

    /// Run the queue worker
    Worker {
        /// Drain the queue once and exit
        #[arg(long)]
        once: bool,

        /// Poll interval in seconds
        #[arg(short, long, default_value = "2")]
        interval: u64,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Input type for file submissions
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FileInputType {
    Image,
    Audio,
}

impl From<FileInputType> for InputType {
    fn from(t: FileInputType) -> Self {
        match t {
            FileInputType::Image => InputType::Image,
            FileInputType::Audio => InputType::Audio,
        }
    }
}

/// Shared wiring for commands that run the pipeline
struct App {
    config: Arc<Config>,
    store: Arc<ReportStore>,
    orchestrator: Arc<Orchestrator>,
}

impl App {
    fn open() -> Result<Self> {
        let config = Arc::new(Config::load()?);
        let store = Arc::new(ReportStore::new(config.reports_dir()));
        let cache = Arc::new(SearchCache::new(
            config.cache_path(),
            config.search_cache_ttl_seconds,
        ));
        let orchestrator = Arc::new(Orchestrator::live(
            config.clone(),
            store.clone(),
            cache.clone(),
        )?);

        Ok(Self {
            config,
            store,
            orchestrator,
        })
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Submit {
                text,
                file,
                input_type,
                inline,
            } => submit(text, file, input_type, inline).await,
            Commands::Status { report_id } => show_status(&report_id).await,
            Commands::Report { report_id } => show_report(&report_id).await,
            Commands::Audit { report_id } => show_audit(&report_id).await,
            Commands::Reports => list_reports().await,
            Commands::Worker { once, interval } => worker(once, interval).await,
            Commands::Config => show_config(),
        }
    }
}

fn parse_report_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("Invalid report ID: {raw}"))
}

/// Submit text or a file and dispatch the resulting report
async fn submit(
    text: Option<String>,
    file: Option<PathBuf>,
    input_type: FileInputType,
    inline: bool,
) -> Result<()> {
    let app = App::open()?;

    let report = if let Some(path) = file {
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }

        // Copy the upload into managed storage so the worker can see it.
        let storage_dir = app.config.storage_dir();
        tokio::fs::create_dir_all(&storage_dir).await?;

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload".to_string());
        let stored = storage_dir.join(format!("{}-{}", Uuid::new_v4(), file_name));
        tokio::fs::copy(&path, &stored)
            .await
            .with_context(|| format!("Failed to store upload: {}", path.display()))?;

        Report::new(
            input_type.into(),
            None,
            Some(stored.to_string_lossy().to_string()),
        )
    } else {
        let input = match text {
            Some(t) => t,
            None => {
                let mut buffer = String::new();
                io::stdin()
                    .read_to_string(&mut buffer)
                    .context("Failed to read from stdin")?;
                buffer
            }
        };

        if input.trim().is_empty() {
            anyhow::bail!("Input is empty. Pass text, --file <path>, or pipe to stdin");
        }

        Report::from_text(input)
    };

    app.store.save_report(&report).await?;
    println!("{}", report.id);

    let dispatcher: Box<dyn Dispatcher> = if app.config.use_queue && !inline {
        Box::new(QueueDispatcher::new(
            WorkQueue::new(app.config.queue_path()),
            app.store.clone(),
            app.orchestrator.clone(),
        ))
    } else {
        Box::new(InlineDispatcher::new(app.orchestrator.clone()))
    };

    dispatcher.dispatch(report.id).await?;

    // Inline runs finish before we get here; show the outcome.
    if let Some(done) = app.store.load_report(report.id).await? {
        if done.status.is_terminal() {
            print_summary(&done);
        } else {
            eprintln!("[Report {} queued]", report.id);
        }
    }

    Ok(())
}

fn print_summary(report: &Report) {
    match report.status {
        ReportStatus::Complete => {
            eprintln!(
                "[Report {} complete: {:?} ({}%)]",
                report.id,
                report.verdict.unwrap_or(crate::domain::Verdict::Unverifiable),
                report.confidence.unwrap_or(0)
            );
            if let Some(explanation) = &report.explanation {
                eprintln!("  {explanation}");
            }
        }
        ReportStatus::Failed => {
            eprintln!(
                "[Report {} failed: {}]",
                report.id,
                report.error_message.as_deref().unwrap_or("unknown error")
            );
        }
        _ => eprintln!("[Report {} in state: {:?}]", report.id, report.status),
    }
}

/// Show the status of a report
async fn show_status(report_id: &str) -> Result<()> {
    let app = App::open()?;
    let report_id = parse_report_id(report_id)?;

    let Some(report) = app.store.load_report(report_id).await? else {
        anyhow::bail!("Report not found: {report_id}");
    };

    println!("Report ID: {}", report.id);
    println!("Input type: {:?}", report.input_type);
    println!("Status: {:?}", report.status);
    println!("Created: {}", report.created_at);
    println!("Updated: {}", report.updated_at);
    if let Some(verdict) = report.verdict {
        println!("Verdict: {verdict:?}");
    }
    if let Some(confidence) = report.confidence {
        println!("Confidence: {confidence}");
    }
    if let Some(explanation) = &report.explanation {
        println!("Explanation: {explanation}");
    }
    if let Some(error) = &report.error_message {
        println!("Error: {error}");
    }

    Ok(())
}

/// Print the fully assembled report as JSON
async fn show_report(report_id: &str) -> Result<()> {
    let app = App::open()?;
    let report_id = parse_report_id(report_id)?;

    let Some(view) = app.store.assemble_view(&app.config, report_id).await? else {
        anyhow::bail!("Report not found: {report_id}");
    };

    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Print the audit trail, oldest first
async fn show_audit(report_id: &str) -> Result<()> {
    let app = App::open()?;
    let report_id = parse_report_id(report_id)?;

    let events = app.store.list_audit(report_id).await?;
    if events.is_empty() {
        println!("No audit events for {report_id}");
        return Ok(());
    }

    for event in events {
        println!(
            "{}  {}  {}",
            event.created_at.format("%Y-%m-%d %H:%M:%S"),
            serde_json::to_string(&event.event_type)?.trim_matches('"'),
            event.details
        );
    }

    Ok(())
}

/// List known reports with their current status
async fn list_reports() -> Result<()> {
    let app = App::open()?;
    let ids = app.store.list_reports().await?;

    if ids.is_empty() {
        println!("No reports found");
        return Ok(());
    }

    let mut reports = Vec::new();
    for id in ids {
        if let Some(report) = app.store.load_report(id).await? {
            reports.push(report);
        }
    }
    reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    println!("{:<38} {:<10} {:<14} {:<20}", "REPORT ID", "STATUS", "VERDICT", "CREATED");
    println!("{}", "-".repeat(84));
    for report in reports {
        let verdict = report
            .verdict
            .map(|v| format!("{v:?}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<10} {:<14} {:<20}",
            report.id,
            format!("{:?}", report.status).to_lowercase(),
            verdict,
            report.created_at.format("%Y-%m-%d %H:%M:%S"),
        );
    }

    Ok(())
}

/// Run the queue worker, either once or as a polling loop
async fn worker(once: bool, interval: u64) -> Result<()> {
    let app = App::open()?;
    let queue = WorkQueue::new(app.config.queue_path());

    if once {
        let processed = drain_queue(&queue, &app.orchestrator).await?;
        println!("Processed {processed} report(s)");
        return Ok(());
    }

    run_worker(queue, app.orchestrator, Duration::from_secs(interval)).await
}

/// Show the resolved configuration (for debugging)
fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("truecheck configuration");
    println!();
    println!("Paths:");
    println!("  Home:    {}", config.home.display());
    println!("  Reports: {}", config.reports_dir().display());
    println!("  Queue:   {}", config.queue_path().display());
    println!("  Cache:   {}", config.cache_path().display());
    println!("  Storage: {}", config.storage_dir().display());
    println!();
    println!("Dispatch:");
    println!("  Use queue: {}", config.use_queue);
    println!();
    println!("Evidence sources:");
    println!(
        "  Google CSE: {}",
        if config.google_configured() {
            "configured".to_string()
        } else {
            format!("not configured (missing: {})", config.google_missing_vars().join(", "))
        }
    );
    println!("  GDELT: always available");
    println!("  Search result count: {}", config.search_result_count);
    println!("  Cache TTL: {}s", config.search_cache_ttl_seconds);
    println!(
        "  Image matches: {} per claim, {} total",
        config.max_image_matches_per_claim, config.max_image_matches_total
    );
    println!();
    println!("Reasoning oracle:");
    println!(
        "  Gemini: {} (model {})",
        if config.oracle_configured() { "configured" } else { "not configured" },
        config.gemini_model
    );
    println!();
    println!("Input extraction:");
    println!(
        "  OCR command: {}",
        config.ocr_command.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Transcribe command: {}",
        config.transcribe_command.as_deref().unwrap_or("(none)")
    );

    Ok(())
}
