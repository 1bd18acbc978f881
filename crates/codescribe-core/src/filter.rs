//! Source-file selection for full generation.
//!
//! A path is documented when its extension is on the allow-list and it does
//! not contain any ignored substring (build output, dependencies, VCS
//! metadata). Both lists are plain configuration.

use serde::{Deserialize, Serialize};

pub const DEFAULT_EXTENSIONS: &[&str] = &[
    ".py", ".js", ".ts", ".jsx", ".tsx", ".java", ".go", ".c", ".cpp", ".h", ".hpp",
];

pub const DEFAULT_IGNORE: &[&str] = &[
    "node_modules",
    ".git",
    ".next",
    "build",
    "dist",
    "coverage",
    "__pycache__",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Recognized extensions, including the leading dot.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Substrings that exclude a path wherever they occur.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect()
}

fn default_ignore() -> Vec<String> {
    DEFAULT_IGNORE.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            ignore: default_ignore(),
        }
    }
}

impl FilterConfig {
    /// Whether `path` is ignored by substring match.
    pub fn is_ignored(&self, path: &str) -> bool {
        self.ignore.iter().any(|pattern| path.contains(pattern.as_str()))
    }

    /// Whether `path` ends in a recognized extension (case-insensitive).
    pub fn has_source_extension(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let Some(dot) = file_name.rfind('.') else {
            return false;
        };
        let ext = file_name[dot..].to_ascii_lowercase();
        self.extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(&ext))
    }

    /// Whether `path` should be documented.
    pub fn accepts(&self, path: &str) -> bool {
        self.has_source_extension(path) && !self.is_ignored(path)
    }
}
