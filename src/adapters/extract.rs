//! Input-to-text extraction for image and audio uploads.
//!
//! OCR and transcription run as external subprocesses (e.g. `tesseract`,
//! a whisper CLI). Extraction never fails a report: any problem yields
//! empty text with `ok = false`, which the orchestrator turns into a
//! user-visible limitation.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::warn;

use crate::config::Config;
use crate::domain::InputType;

/// Result of an extraction attempt
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    /// False when the extractor was unavailable or produced nothing
    pub ok: bool,
}

impl ExtractedText {
    fn unavailable() -> Self {
        Self { text: String::new(), ok: false }
    }
}

/// Turns a stored upload into raw text
#[async_trait]
pub trait InputExtractor: Send + Sync {
    async fn extract(&self, path: &Path) -> ExtractedText;
}

/// Extractor for when no command is configured
pub struct UnavailableExtractor;

#[async_trait]
impl InputExtractor for UnavailableExtractor {
    async fn extract(&self, _path: &Path) -> ExtractedText {
        ExtractedText::unavailable()
    }
}

/// Runs a configured external command with the input path as its single
/// argument and collects stdout.
pub struct CommandExtractor {
    command: String,
    timeout: Duration,
}

impl CommandExtractor {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self { command: command.into(), timeout }
    }

    async fn run(&self, path: &Path) -> anyhow::Result<String> {
        let child = Command::new(&self.command)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let output = timeout(self.timeout, child.wait_with_output()).await??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!(
                "Extractor '{}' exited with {}: {}",
                self.command,
                output.status.code().unwrap_or(-1),
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[async_trait]
impl InputExtractor for CommandExtractor {
    async fn extract(&self, path: &Path) -> ExtractedText {
        match self.run(path).await {
            Ok(text) => {
                let trimmed = text.trim().to_string();
                let ok = !trimmed.is_empty();
                ExtractedText { text: trimmed, ok }
            }
            Err(e) => {
                warn!(command = %self.command, error = %e, "Input extraction failed");
                ExtractedText::unavailable()
            }
        }
    }
}

/// Pick the extractor for an input type from configuration
pub fn for_input(config: &Config, input_type: InputType) -> Box<dyn InputExtractor> {
    let command = match input_type {
        InputType::Image => config.ocr_command.as_ref(),
        InputType::Audio => config.transcribe_command.as_ref(),
        InputType::Text => None,
    };

    match command {
        Some(cmd) => Box::new(CommandExtractor::new(
            cmd.clone(),
            Duration::from_secs(config.source_timeout_seconds),
        )),
        None => Box::new(UnavailableExtractor),
    }
}
