//! Derive a change set from two content-store snapshots.
//!
//! Pure data comparison: no I/O, no store handle. Files are matched by
//! path and compared by content SHA-256.

use std::collections::BTreeMap;

use crate::models::{FileChange, SourceFile};

/// Changes that turn `previous` into `current`, ordered by path.
///
/// Unchanged files (same path, same `sha`) produce nothing.
pub fn diff_snapshot(previous: &[SourceFile], current: &[SourceFile]) -> Vec<FileChange> {
    let before: BTreeMap<&str, &SourceFile> =
        previous.iter().map(|f| (f.path.as_str(), f)).collect();
    let after: BTreeMap<&str, &SourceFile> = current.iter().map(|f| (f.path.as_str(), f)).collect();

    let mut paths: Vec<&str> = before.keys().chain(after.keys()).copied().collect();
    paths.sort_unstable();
    paths.dedup();

    paths
        .into_iter()
        .filter_map(|path| match (before.get(path), after.get(path)) {
            (Some(_), None) => Some(FileChange::removed(path)),
            (None, Some(new)) => Some(FileChange::added(path, new.content.clone())),
            (Some(old), Some(new)) if old.sha != new.sha => {
                Some(FileChange::modified(path, new.content.clone()))
            }
            _ => None,
        })
        .collect()
}

/// The snapshot to record once a batch derived from `previous` and
/// `current` has committed.
///
/// Paths in `skipped` keep their `previous` entry (or stay absent) so the
/// next diff reports them again. Ordered by path.
pub fn settled_snapshot(
    previous: &[SourceFile],
    current: &[SourceFile],
    skipped: &[String],
) -> Vec<SourceFile> {
    let mut settled: BTreeMap<&str, &SourceFile> =
        current.iter().map(|f| (f.path.as_str(), f)).collect();
    for path in skipped {
        settled.remove(path.as_str());
    }
    for file in previous {
        if skipped.iter().any(|p| *p == file.path) {
            settled.insert(file.path.as_str(), file);
        }
    }
    settled.into_values().cloned().collect()
}
