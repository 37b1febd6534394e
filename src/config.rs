//! Runtime configuration for the evaluation daemon.
//!
//! Priority (highest to lowest):
//!   1. CLI / env — passed as `Some(value)` from clap
//!   2. TOML file at `{data_dir}/config.toml`
//!   3. Built-in defaults
//!
//! Endpoint settings are immutable process-wide state: read once at startup,
//! shared by value, never re-negotiated per call.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::error;

const DEFAULT_BASE_URL: &str = "http://localhost:8000/v1";
const DEFAULT_API_KEY: &str = "EMPTY";
const DEFAULT_MODEL: &str = "Qwen/Qwen3-4B-Instruct-2507";
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
const DEFAULT_DATASET_PATH: &str = "dataset/data.csv";
const DEFAULT_RESULTS_DIR: &str = "dataset/results";

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// Base URL of the OpenAI-compatible endpoint (default: http://localhost:8000/v1).
    base_url: Option<String>,
    /// Credential sent as a bearer token. vLLM ignores it; "EMPTY" by default.
    api_key: Option<String>,
    /// Model identifier passed on every completion request.
    model: Option<String>,
    /// Sampling temperature (default: 0.7).
    temperature: Option<f64>,
    /// Per-request timeout in seconds (default: 300).
    request_timeout_secs: Option<u64>,
    /// Path to the dataset CSV (default: dataset/data.csv).
    dataset_path: Option<PathBuf>,
    /// Directory result CSVs are written to (default: dataset/results).
    results_dir: Option<PathBuf>,
    /// Log level filter string, e.g. "debug", "info,storyd=trace" (default: "info").
    log: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured).
    log_format: Option<String>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── EvalConfig ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct EvalConfig {
    /// Base URL of the OpenAI-compatible completion endpoint.
    pub base_url: String,
    /// Bearer credential for the endpoint.
    pub api_key: String,
    /// Model identifier used for every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Per-request timeout enforced by the HTTP client.
    pub request_timeout_secs: u64,
    /// Dataset CSV with `model` and `response` columns.
    pub dataset_path: PathBuf,
    /// Directory result CSVs are written to.
    pub results_dir: PathBuf,
    /// Log level filter string.
    pub log: String,
    /// Log output format: "pretty" | "json".
    pub log_format: String,
}

impl EvalConfig {
    /// Build config from CLI/env args + optional TOML file.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        data_dir: &Path,
        base_url: Option<String>,
        api_key: Option<String>,
        model: Option<String>,
        temperature: Option<f64>,
        dataset_path: Option<PathBuf>,
        results_dir: Option<PathBuf>,
        log: Option<String>,
        log_format: Option<String>,
    ) -> Self {
        // Load TOML as the lowest-priority override layer.
        let toml = load_toml(data_dir).unwrap_or_default();

        Self {
            base_url: base_url
                .or(toml.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key: api_key
                .or(toml.api_key)
                .unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            model: model
                .or(toml.model)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: temperature.or(toml.temperature).unwrap_or(DEFAULT_TEMPERATURE),
            request_timeout_secs: toml
                .request_timeout_secs
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            dataset_path: dataset_path
                .or(toml.dataset_path)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DATASET_PATH)),
            results_dir: results_dir
                .or(toml.results_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            log: log.or(toml.log).unwrap_or_else(|| "info".to_string()),
            log_format: log_format
                .or(toml.log_format)
                .unwrap_or_else(|| "pretty".to_string()),
        }
    }
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self::new(Path::new("."), None, None, None, None, None, None, None, None)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
