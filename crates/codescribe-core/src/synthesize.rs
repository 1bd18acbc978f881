//! Per-file documentation synthesis.
//!
//! A file's content is chunked, each chunk is sent to the [`Summarizer`]
//! in index order, and the returned fragments are stitched under a
//! top-level heading:
//!
//! ```text
//! # Documentation for src/util.py
//!
//! ## Part 1
//! ...
//! ## Part 2
//! ...
//! ```
//!
//! Files shorter than the minimum length get [`SMALL_FILE_PLACEHOLDER`]
//! without any summarizer call. A chunk whose summarizer call fails is left
//! out; part numbers keep following chunk indices, so a gap shows where a
//! fragment went missing. Only [`SummarizeError::Unavailable`] aborts the
//! file.
//!
//! [`SummarizeError::Unavailable`]: crate::error::SummarizeError::Unavailable

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::chunk::Chunker;
use crate::error::{Result, ScribeError};
use crate::summarize::{chunk_prompt, Summarizer};

pub const MIN_CONTENT_CHARS: usize = 30;

pub const SMALL_FILE_PLACEHOLDER: &str =
    "This file is too small to generate meaningful documentation.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynthesisConfig {
    /// Content shorter than this (in characters) is not summarized.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
}

fn default_min_content_chars() -> usize {
    MIN_CONTENT_CHARS
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            min_content_chars: MIN_CONTENT_CHARS,
        }
    }
}

pub struct Synthesizer {
    chunker: Chunker,
    summarizer: Arc<dyn Summarizer>,
    min_content_chars: usize,
}

impl Synthesizer {
    pub fn new(chunker: Chunker, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            chunker,
            summarizer,
            min_content_chars: MIN_CONTENT_CHARS,
        }
    }

    pub fn with_config(mut self, config: &SynthesisConfig) -> Self {
        self.min_content_chars = config.min_content_chars;
        self
    }

    pub fn chunker(&self) -> &Chunker {
        &self.chunker
    }

    pub fn is_too_small(&self, content: &str) -> bool {
        content.chars().count() < self.min_content_chars
    }

    /// Document one file.
    ///
    /// # Errors
    ///
    /// [`ScribeError::Summarizer`] when the summarizer reports itself
    /// unavailable. Per-chunk failures are absorbed.
    pub async fn synthesize(&self, path: &str, content: Option<&str>) -> Result<String> {
        match content {
            Some(content) if !self.is_too_small(content) => {
                let chunks = self.chunker.split(content);
                self.synthesize_chunks(path, content, &chunks).await
            }
            _ => Ok(SMALL_FILE_PLACEHOLDER.to_string()),
        }
    }

    /// Document one file whose chunks were already computed by the caller.
    pub async fn synthesize_chunks(
        &self,
        path: &str,
        content: &str,
        chunks: &[String],
    ) -> Result<String> {
        if self.is_too_small(content) {
            return Ok(SMALL_FILE_PLACEHOLDER.to_string());
        }

        let total = chunks.len();
        let mut document = format!("# Documentation for {}\n", path);

        for (index, chunk) in chunks.iter().enumerate() {
            let prompt = chunk_prompt(path, index, total, chunk);
            match self.summarizer.summarize(&prompt).await {
                Ok(fragment) if !fragment.trim().is_empty() => {
                    document.push_str(&format!("\n## Part {}\n\n{}\n", index + 1, fragment.trim()));
                }
                Ok(_) => {
                    debug!(path, part = index + 1, "summarizer returned empty fragment");
                }
                Err(e) if e.is_fatal() => {
                    return Err(ScribeError::Summarizer {
                        path: path.to_string(),
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(path, part = index + 1, error = %e, "fragment omitted");
                }
            }
        }

        Ok(document)
    }
}
