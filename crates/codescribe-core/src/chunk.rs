//! Recursive boundary-preferring text chunker.
//!
//! Splits source text into overlapping chunks bounded by `chunk_size`
//! characters. Boundaries land on the most natural break available,
//! trying separators from coarse to fine:
//!
//! | Level | Separator | Meaning |
//! |-------|-----------|---------|
//! | 0 | `\n\n` | paragraph / blank line |
//! | 1 | `\n` | line |
//! | 2–4 | `. ` `! ` `? ` | sentence end |
//! | 5 | ` ` | word |
//! | 6 | (none) | raw character |
//!
//! # Algorithm
//!
//! 1. Pick the coarsest separator present in the text and split after
//!    each occurrence, so the separator stays on the end of the piece it
//!    closes (a sentence keeps its `.`).
//! 2. Pieces shorter than `chunk_size` are buffered; oversized pieces are
//!    split recursively with the remaining, finer separators.
//! 3. Buffered pieces are merged greedily into chunks. When a chunk is
//!    emitted, pieces are dropped from the front of the window until at
//!    most `overlap` characters remain, so the tail of chunk *i* is
//!    repeated at the head of chunk *i+1*.
//!
//! Chunks are trimmed of surrounding whitespace only. Lengths are measured
//! in Unicode scalar values, never bytes, so a chunk never splits a
//! multi-byte character.
//!
//! # Example
//!
//! ```rust
//! use codescribe_core::chunk::Chunker;
//!
//! let chunker = Chunker::new(2000, 200).unwrap();
//! let chunks = chunker.split("fn main() {}\n");
//! assert_eq!(chunks, vec!["fn main() {}\n".to_string()]);
//! ```

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScribeError};

pub const DEFAULT_CHUNK_SIZE: usize = 2000;
pub const DEFAULT_OVERLAP: usize = 200;

/// Separators in order of preference. The trailing empty separator means
/// "split into characters".
const SEPARATORS: &[&str] = &["\n\n", "\n", ". ", "! ", "? ", " ", ""];

/// Chunk size and overlap, both in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_overlap")]
    pub overlap: usize,
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_overlap() -> usize {
    DEFAULT_OVERLAP
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// A contiguous slice of a file's text and its position in the file's
/// chunk sequence. Never persisted; only its hash is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: usize,
    pub text: String,
}

/// Deterministic recursive splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl Chunker {
    /// Create a chunker.
    ///
    /// # Errors
    ///
    /// Returns [`ScribeError::InvalidChunking`] unless
    /// `chunk_size > overlap` and `chunk_size > 0`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(ScribeError::InvalidChunking {
                chunk_size,
                overlap,
            });
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunk strings.
    ///
    /// - Empty text yields no chunks.
    /// - Text of at most `chunk_size` characters yields itself, untouched.
    /// - The same `(text, chunk_size, overlap)` always yields the same
    ///   sequence.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }
        self.split_recursive(text, SEPARATORS)
    }

    /// Split `text` and attach chunk indices.
    pub fn chunks(&self, text: &str) -> Vec<Chunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk { index, text })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (position, separator) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(**sep))
            .map(|(i, sep)| (i, *sep))
            .unwrap_or((separators.len(), ""));
        let finer = separators.get(position + 1..).unwrap_or(&[]);

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in split_on(text, separator) {
            if char_len(piece) < self.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending));
                pending.clear();
            }

            if finer.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, finer));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending));
        }

        chunks
    }

    /// Greedily merge small pieces into chunks, carrying up to `overlap`
    /// characters of trailing pieces into the next chunk.
    fn merge(&self, pieces: &[&str]) -> Vec<String> {
        let mut merged = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size && !window.is_empty() {
                push_joined(&mut merged, &window);

                while total > self.overlap || (total > 0 && total + len > self.chunk_size) {
                    let Some((_, front_len)) = window.pop_front() else {
                        break;
                    };
                    total = total.saturating_sub(front_len);
                }
            }

            total += len;
            window.push_back((piece, len));
        }

        push_joined(&mut merged, &window);
        merged
    }
}

/// Split `text` with the default configuration (2000 / 200).
pub fn split_text(text: &str) -> Vec<String> {
    Chunker::default().split(text)
}

fn split_on<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        text.char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect()
    } else {
        text.split_inclusive(separator).collect()
    }
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<(&str, usize)>) {
    if window.is_empty() {
        return;
    }
    let joined: String = window.iter().map(|(piece, _)| *piece).collect();
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
