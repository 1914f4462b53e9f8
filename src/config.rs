/// Configuration module.
///
/// Handles loading, validating, and providing default configuration
/// values from a JSON file. A missing file yields defaults (and a
/// generated template for the default path); invalid JSON falls back to
/// defaults with a warning rather than refusing to start.
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_db_path() -> String {
    "./codevault.db".to_string()
}

fn default_collection() -> String {
    "codebase".to_string()
}

fn default_max_chunk_size() -> usize {
    1500
}

fn default_batch_size() -> usize {
    100
}

fn default_search_limit() -> usize {
    10
}

fn default_project_scan_cap() -> usize {
    100_000
}

fn default_exclude_patterns() -> Vec<String> {
    [
        ".git/**",
        "node_modules/**",
        "target/**",
        "__pycache__/**",
        ".venv/**",
        "dist/**",
        "build/**",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_local_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_local_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_hosted_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_hosted_dimensions() -> usize {
    1536
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Name of the single shared collection all projects index into.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Soft chunk bound in characters; a single longer line is never split.
    #[serde(default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Ceiling on records scanned when computing the project listing.
    #[serde(default = "default_project_scan_cap")]
    pub project_scan_cap: usize,

    /// Exclude patterns applied to every indexing run, in addition to
    /// any supplied per call.
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EmbeddingConfig {
    /// "local" (Ollama-compatible HTTP) or "hosted" (OpenAI-compatible API).
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_local_host")]
    pub local_host: String,

    #[serde(default = "default_local_model")]
    pub local_model: String,

    #[serde(default = "default_hosted_model")]
    pub hosted_model: String,

    #[serde(default = "default_hosted_dimensions")]
    pub hosted_dimensions: usize,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            collection: default_collection(),
            max_chunk_size: default_max_chunk_size(),
            batch_size: default_batch_size(),
            search_limit: default_search_limit(),
            project_scan_cap: default_project_scan_cap(),
            exclude_patterns: default_exclude_patterns(),
            embedding: EmbeddingConfig::default(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            local_host: default_local_host(),
            local_model: default_local_model(),
            hosted_model: default_hosted_model(),
            hosted_dimensions: default_hosted_dimensions(),
        }
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and
    /// generates a template file for the default path.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.max_chunk_size > 0, "max_chunk_size must be positive");
        anyhow::ensure!(self.batch_size > 0, "batch_size must be positive");
        anyhow::ensure!(self.search_limit > 0, "search_limit must be positive");
        anyhow::ensure!(
            self.project_scan_cap > 0,
            "project_scan_cap must be positive"
        );
        anyhow::ensure!(!self.collection.is_empty(), "collection must not be empty");
        anyhow::ensure!(
            matches!(self.embedding.provider.as_str(), "local" | "hosted"),
            "embedding.provider must be \"local\" or \"hosted\", got {:?}",
            self.embedding.provider
        );
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────────
