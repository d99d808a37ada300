//! Configuration for the truecheck pipeline.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (TRUECHECK_HOME, GOOGLE_CSE_API_KEY, ...)
//! 2. Config file (.truecheck/config.yaml, discovered upward from cwd)
//! 3. Defaults (~/.truecheck)
//!
//! The resolved `Config` is immutable and passed explicitly into the
//! orchestrator and each component constructor; there is no ambient
//! global lookup.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub use_queue: Option<bool>,
    #[serde(default)]
    pub google_cse_api_key: Option<String>,
    #[serde(default)]
    pub google_cse_engine_id: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub gemini_model: Option<String>,
    #[serde(default)]
    pub search_cache_ttl_seconds: Option<u64>,
    #[serde(default)]
    pub search_result_count: Option<usize>,
    #[serde(default)]
    pub max_image_matches_per_claim: Option<usize>,
    #[serde(default)]
    pub max_image_matches_total: Option<usize>,
    #[serde(default)]
    pub ocr_command: Option<String>,
    #[serde(default)]
    pub transcribe_command: Option<String>,
}

/// Resolved, immutable configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// State directory (reports, queue, cache, uploads)
    pub home: PathBuf,

    /// Whether to prefer the durable work queue over inline execution
    pub use_queue: bool,

    /// Google Custom Search credentials (None = unconfigured)
    pub google_cse_api_key: Option<String>,
    pub google_cse_engine_id: Option<String>,

    /// Reasoning oracle credentials (None = unconfigured)
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,

    /// Evidence cache TTL
    pub search_cache_ttl_seconds: u64,

    /// Results requested per source per claim
    pub search_result_count: usize,

    /// Image-match caps
    pub max_image_matches_per_claim: usize,
    pub max_image_matches_total: usize,

    /// Evidence source / oracle call timeouts
    pub source_timeout_seconds: u64,
    pub oracle_timeout_seconds: u64,

    /// External input-to-text commands; None = unavailable
    pub ocr_command: Option<String>,
    pub transcribe_command: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".truecheck");

        Self {
            home,
            use_queue: true,
            google_cse_api_key: None,
            google_cse_engine_id: None,
            gemini_api_key: None,
            gemini_model: "gemini-2.0-flash".to_string(),
            search_cache_ttl_seconds: 12 * 60 * 60,
            search_result_count: 6,
            max_image_matches_per_claim: 4,
            max_image_matches_total: 24,
            source_timeout_seconds: 20,
            oracle_timeout_seconds: 30,
            ocr_command: None,
            transcribe_command: None,
        }
    }
}

impl Config {
    /// Load configuration from file (if found) and environment
    pub fn load() -> Result<Self> {
        let file = match find_config_file() {
            Some(path) => load_config_file(&path)?,
            None => ConfigFile::default(),
        };
        Ok(Self::from_sources(file))
    }

    /// Merge a parsed config file with environment variables and defaults
    fn from_sources(file: ConfigFile) -> Self {
        let defaults = Self::default();

        let home = env_var("TRUECHECK_HOME")
            .map(PathBuf::from)
            .or_else(|| file.home.map(PathBuf::from))
            .unwrap_or(defaults.home);

        Self {
            home,
            use_queue: env_var("TRUECHECK_USE_QUEUE")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .or(file.use_queue)
                .unwrap_or(defaults.use_queue),
            google_cse_api_key: normalize_credential(
                env_var("GOOGLE_CSE_API_KEY").or(file.google_cse_api_key),
            ),
            google_cse_engine_id: normalize_credential(
                env_var("GOOGLE_CSE_ENGINE_ID").or(file.google_cse_engine_id),
            ),
            gemini_api_key: normalize_credential(
                env_var("GEMINI_API_KEY").or(file.gemini_api_key),
            ),
            gemini_model: env_var("GEMINI_MODEL")
                .or(file.gemini_model)
                .unwrap_or(defaults.gemini_model),
            search_cache_ttl_seconds: file
                .search_cache_ttl_seconds
                .unwrap_or(defaults.search_cache_ttl_seconds),
            search_result_count: file
                .search_result_count
                .unwrap_or(defaults.search_result_count),
            max_image_matches_per_claim: file
                .max_image_matches_per_claim
                .unwrap_or(defaults.max_image_matches_per_claim),
            max_image_matches_total: file
                .max_image_matches_total
                .unwrap_or(defaults.max_image_matches_total),
            source_timeout_seconds: defaults.source_timeout_seconds,
            oracle_timeout_seconds: defaults.oracle_timeout_seconds,
            ocr_command: env_var("TRUECHECK_OCR_COMMAND").or(file.ocr_command),
            transcribe_command: env_var("TRUECHECK_TRANSCRIBE_COMMAND").or(file.transcribe_command),
        }
    }

    /// Directory holding one subdirectory per report
    pub fn reports_dir(&self) -> PathBuf {
        self.home.join("reports")
    }

    /// Path to the durable work queue
    pub fn queue_path(&self) -> PathBuf {
        self.home.join("queue.jsonl")
    }

    /// Path to the evidence search cache
    pub fn cache_path(&self) -> PathBuf {
        self.home.join("cache.jsonl")
    }

    /// Directory for stored uploads
    pub fn storage_dir(&self) -> PathBuf {
        self.home.join("storage")
    }

    /// True when both Google CSE credentials are present
    pub fn google_configured(&self) -> bool {
        self.google_cse_api_key.is_some() && self.google_cse_engine_id.is_some()
    }

    /// Environment variables missing for Google CSE, for limitation messages
    pub fn google_missing_vars(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.google_cse_api_key.is_none() {
            missing.push("GOOGLE_CSE_API_KEY");
        }
        if self.google_cse_engine_id.is_none() {
            missing.push("GOOGLE_CSE_ENGINE_ID");
        }
        missing
    }

    /// True when the reasoning oracle has credentials
    pub fn oracle_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Treat blank and placeholder values as unconfigured so config checks are reliable
fn normalize_credential(value: Option<String>) -> Option<String> {
    let v = value?;
    let s = v.trim();
    if s.is_empty() || s == "." || s == "YOUR_KEY_HERE" || s == "YOUR_ENGINE_ID_HERE" {
        return None;
    }
    Some(s.to_string())
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".truecheck").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.use_queue);
        assert_eq!(config.search_cache_ttl_seconds, 43_200);
        assert_eq!(config.search_result_count, 6);
        assert_eq!(config.max_image_matches_per_claim, 4);
        assert!(!config.oracle_configured());
    }

    #[test]
    fn test_credential_normalization() {
        assert_eq!(normalize_credential(None), None);
        assert_eq!(normalize_credential(Some("  ".to_string())), None);
        assert_eq!(normalize_credential(Some(".".to_string())), None);
        assert_eq!(normalize_credential(Some("YOUR_KEY_HERE".to_string())), None);
        assert_eq!(
            normalize_credential(Some(" abc123 ".to_string())),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn test_missing_vars_listed() {
        let config = Config::default();
        let mut missing = config.google_missing_vars();
        missing.sort();
        assert_eq!(missing, vec!["GOOGLE_CSE_API_KEY", "GOOGLE_CSE_ENGINE_ID"]);

        let config = Config {
            google_cse_api_key: Some("key".to_string()),
            ..Config::default()
        };
        assert_eq!(config.google_missing_vars(), vec!["GOOGLE_CSE_ENGINE_ID"]);
    }

    #[test]
    fn test_config_file_parsing() {
        let file: ConfigFile = serde_yaml::from_str(
            r#"
use_queue: false
gemini_model: gemini-2.5-pro
search_result_count: 4
"#,
        )
        .unwrap();

        let config = Config::from_sources(file);
        assert!(!config.use_queue);
        assert_eq!(config.gemini_model, "gemini-2.5-pro");
        assert_eq!(config.search_result_count, 4);
    }

    #[test]
    fn test_paths_derived_from_home() {
        let config = Config {
            home: PathBuf::from("/tmp/tc"),
            ..Config::default()
        };
        assert_eq!(config.reports_dir(), PathBuf::from("/tmp/tc/reports"));
        assert_eq!(config.queue_path(), PathBuf::from("/tmp/tc/queue.jsonl"));
        assert_eq!(config.cache_path(), PathBuf::from("/tmp/tc/cache.jsonl"));
    }
}
