//! Language-model summarizer providers.
//!
//! Implements the core [`Summarizer`] trait:
//! - **[`DisabledSummarizer`]**: every call fails as unavailable; used when no
//!   provider is configured. Small files still get their placeholder.
//! - **[`OpenAiSummarizer`]**: `POST {url}/v1/chat/completions`.
//! - **[`OllamaSummarizer`]**: `POST {url}/api/generate` with `stream: false`.
//!
//! Use [`create_summarizer`] to build the configured provider once at
//! start-up and share it by `Arc`.
//!
//! # Failure classes
//!
//! Calls are never retried. Each failure is classified for the pipeline:
//! - connection refused, HTTP 401/403/404 → [`SummarizeError::Unavailable`]
//!   (the whole file is abandoned)
//! - timeout, HTTP 429, 5xx, other 4xx, malformed body → [`SummarizeError::Request`]
//!   (only this chunk's fragment is lost)
//! - successful call with blank text → [`SummarizeError::Empty`]

use anyhow::{bail, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Duration;

use codescribe_core::error::SummarizeError;
use codescribe_core::summarize::Summarizer;

use crate::config::SummarizerConfig;

const SYSTEM_PROMPT: &str = "You are a senior engineer writing reference documentation. \
Describe what the given source code does, its public functions and types, \
and anything a maintainer must know. Answer in concise Markdown without a top-level heading.";

const OPENAI_DEFAULT_URL: &str = "https://api.openai.com";
const OLLAMA_DEFAULT_URL: &str = "http://localhost:11434";

/// Summarizer used when `summarizer.provider = "disabled"`.
pub struct DisabledSummarizer;

#[async_trait]
impl Summarizer for DisabledSummarizer {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn summarize(&self, _prompt: &str) -> Result<String, SummarizeError> {
        Err(SummarizeError::Unavailable(
            "summarizer provider is disabled".to_string(),
        ))
    }
}

/// Summarizer backed by the OpenAI chat completions API.
///
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    model: String,
    url: String,
    api_key: String,
    max_tokens: u32,
}

impl OpenAiSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("summarizer.model required for OpenAI provider"))?;

        let api_key = match std::env::var("OPENAI_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => bail!("OPENAI_API_KEY environment variable not set"),
        };

        Ok(Self {
            client: http_client(config)?,
            model,
            url: base_url(config, OPENAI_DEFAULT_URL),
            api_key,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": prompt },
            ],
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let json = read_json(response, "OpenAI").await?;
        parse_openai_response(&json)
    }
}

/// Summarizer backed by a local Ollama instance.
pub struct OllamaSummarizer {
    client: reqwest::Client,
    model: String,
    url: String,
    max_tokens: u32,
}

impl OllamaSummarizer {
    pub fn new(config: &SummarizerConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("summarizer.model required for Ollama provider"))?;

        Ok(Self {
            client: http_client(config)?,
            model,
            url: base_url(config, OLLAMA_DEFAULT_URL),
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl Summarizer for OllamaSummarizer {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError> {
        let body = serde_json::json!({
            "model": self.model,
            "system": SYSTEM_PROMPT,
            "prompt": prompt,
            "stream": false,
            "options": { "num_predict": self.max_tokens },
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.url))
            .json(&body)
            .send()
            .await
            .map_err(classify_transport)?;

        let json = read_json(response, "Ollama").await?;
        parse_ollama_response(&json)
    }
}

fn http_client(config: &SummarizerConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

fn base_url(config: &SummarizerConfig, default: &str) -> String {
    config
        .url
        .as_deref()
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

async fn read_json(
    response: reqwest::Response,
    provider: &str,
) -> Result<serde_json::Value, SummarizeError> {
    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        return Err(classify_status(
            status,
            &format!("{} API error {}: {}", provider, status, body_text),
        ));
    }
    response
        .json()
        .await
        .map_err(|e| SummarizeError::Request(format!("{} response unreadable: {}", provider, e)))
}

fn classify_transport(e: reqwest::Error) -> SummarizeError {
    if e.is_connect() {
        SummarizeError::Unavailable(e.to_string())
    } else {
        SummarizeError::Request(e.to_string())
    }
}

fn classify_status(status: StatusCode, message: &str) -> SummarizeError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
            SummarizeError::Unavailable(message.to_string())
        }
        _ => SummarizeError::Request(message.to_string()),
    }
}

fn non_empty(text: Option<&str>) -> Result<String, SummarizeError> {
    match text.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(SummarizeError::Empty),
    }
}

/// Extract `choices[0].message.content`.
fn parse_openai_response(json: &serde_json::Value) -> Result<String, SummarizeError> {
    let choices = json
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or_else(|| {
            SummarizeError::Request("Invalid OpenAI response: missing choices array".to_string())
        })?;
    non_empty(
        choices
            .first()
            .and_then(|c| c.pointer("/message/content"))
            .and_then(|c| c.as_str()),
    )
}

/// Extract the `response` field of a non-streaming generate call.
fn parse_ollama_response(json: &serde_json::Value) -> Result<String, SummarizeError> {
    let response = json.get("response").ok_or_else(|| {
        SummarizeError::Request("Invalid Ollama response: missing response field".to_string())
    })?;
    non_empty(response.as_str())
}

/// Build the configured summarizer.
///
/// # Errors
///
/// Unknown provider names, or a provider missing its model or API key.
pub fn create_summarizer(config: &SummarizerConfig) -> Result<Arc<dyn Summarizer>> {
    match config.provider.as_str() {
        "disabled" => Ok(Arc::new(DisabledSummarizer)),
        "openai" => Ok(Arc::new(OpenAiSummarizer::new(config)?)),
        "ollama" => Ok(Arc::new(OllamaSummarizer::new(config)?)),
        other => bail!("Unknown summarizer provider: {}", other),
    }
}
