//! Error types for the documentation pipeline.
//!
//! [`ScribeError`] covers failures of a whole unit of work (a file, a batch).
//! [`SummarizeError`] covers a single summarizer call and decides whether the
//! failure is contained to one chunk or takes the whole file down.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScribeError>;

#[derive(Debug, Error)]
pub enum ScribeError {
    /// The repository id (or name) has no matching record.
    #[error("repository not found: {0}")]
    NotFound(String),

    #[error("invalid chunking parameters: chunk_size={chunk_size}, overlap={overlap} (need chunk_size > overlap and chunk_size > 0)")]
    InvalidChunking { chunk_size: usize, overlap: usize },

    /// An `added`/`modified` change arrived without content.
    #[error("change for {0} has no content")]
    MissingContent(String),

    #[error("summarizer failed for {path}: {source}")]
    Summarizer {
        path: String,
        #[source]
        source: SummarizeError,
    },

    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

/// Outcome of a single failed summarizer call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SummarizeError {
    /// The call succeeded but produced no usable text.
    #[error("summarizer returned no usable text")]
    Empty,

    /// Transient or per-request failure (rate limit, 5xx, timeout, bad body).
    #[error("summarizer request failed: {0}")]
    Request(String),

    /// The summarizer cannot serve any request right now.
    #[error("summarizer unavailable: {0}")]
    Unavailable(String),
}

impl SummarizeError {
    /// Whether this failure should abort synthesis of the whole file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SummarizeError::Unavailable(_))
    }
}
