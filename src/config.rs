//! TOML configuration.
//!
//! Only `[db]` is required; every other section falls back to defaults.
//! [`load_config`] parses and validates, so the rest of the program can
//! assume sane chunking parameters and a known summarizer provider.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use codescribe_core::chunk::{ChunkingConfig, Chunker};
use codescribe_core::filter::FilterConfig;
use codescribe_core::reconcile::FingerprintScope;
use codescribe_core::synthesize::SynthesisConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub synthesis: SynthesisSection,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct SynthesisSection {
    #[serde(flatten)]
    pub synthesis: SynthesisConfig,
    #[serde(default)]
    pub fingerprint_scope: FingerprintScope,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SummarizerConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// Base URL; each provider has its own default.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl SummarizerConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_timeout_secs() -> u64 {
    120
}
fn default_max_tokens() -> u32 {
    800
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// Chunker built from `[chunking]`. Parameters were validated at load.
    pub fn chunker(&self) -> Result<Chunker> {
        Ok(Chunker::from_config(&self.chunking)?)
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    parse_config(&content)
}

/// Parse and validate a configuration document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if let Err(e) = Chunker::from_config(&config.chunking) {
        anyhow::bail!("{}", e);
    }

    if config.synthesis.synthesis.min_content_chars == 0 {
        anyhow::bail!("synthesis.min_content_chars must be > 0");
    }

    match config.summarizer.provider.as_str() {
        "disabled" | "openai" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown summarizer provider: '{}'. Must be disabled, openai, or ollama.",
            other
        ),
    }

    if config.summarizer.is_enabled() {
        if config.summarizer.model.is_none() {
            anyhow::bail!(
                "summarizer.model must be specified when provider is '{}'",
                config.summarizer.provider
            );
        }
        if config.summarizer.timeout_secs == 0 {
            anyhow::bail!("summarizer.timeout_secs must be > 0");
        }
    }

    Ok(config)
}
