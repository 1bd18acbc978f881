//! Summarizer abstraction.
//!
//! The summarizer turns a prompt into prose documentation. It is slow,
//! rate-limited, and fallible; the pipeline calls it once per chunk,
//! strictly in sequence, and never retries.
//!
//! Implementations are constructed once at process start and shared by
//! reference with the pipeline.

use async_trait::async_trait;

use crate::error::SummarizeError;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Produce documentation text for `prompt`.
    ///
    /// Return [`SummarizeError::Unavailable`] when no further call can
    /// succeed (the whole file is abandoned); any other error only drops the
    /// current chunk's fragment.
    async fn summarize(&self, prompt: &str) -> Result<String, SummarizeError>;
}

/// Build the prompt for chunk `index` (zero-based) of `total` in `path`.
pub fn chunk_prompt(path: &str, index: usize, total: usize, chunk: &str) -> String {
    format!(
        "You are documenting the source file `{path}`.\n\
         This is part {part} of {total}.\n\
         Explain what this code does: its purpose, the main functions, classes \
         and data structures, their inputs and outputs, and any notable behaviour. \
         Answer in concise Markdown without repeating the code.\n\n\
         ```\n{chunk}\n```",
        path = path,
        part = index + 1,
        total = total,
        chunk = chunk,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_mentions_path_position_and_text() {
        let prompt = chunk_prompt("src/util.py", 1, 3, "def add(a, b):\n    return a + b");
        assert!(prompt.contains("src/util.py"));
        assert!(prompt.contains("part 2 of 3"));
        assert!(prompt.contains("return a + b"));
    }
}
