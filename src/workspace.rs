use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_SCAN_LIMIT: usize = 1000;

const SKIPPED_DIRS: &[&str] = &["target", "node_modules", "dist", "out"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceFile {
    pub name: String,
    pub path: String,
    pub relative_path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Walk `root` depth-first in name order, stopping after `limit` entries.
///
/// Hidden entries and build-output directories are skipped. Entries that
/// can't be read are logged and left out; only a missing root is an error.
pub fn scan(root: impl AsRef<Path>, limit: usize) -> anyhow::Result<Vec<WorkspaceFile>> {
    let root = root.as_ref();
    let meta = std::fs::metadata(root)
        .with_context(|| format!("failed to scan workspace: {}", root.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("workspace root is not a directory: {}", root.display());
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_skipped(e));

    let mut out = Vec::new();
    for entry in walker {
        if out.len() >= limit {
            break;
        }
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable workspace entry");
                continue;
            }
        };

        let kind = if entry.file_type().is_dir() {
            EntryKind::Directory
        } else if entry.file_type().is_file() {
            EntryKind::File
        } else {
            continue;
        };

        let path = entry.path();
        let relative_path = path
            .strip_prefix(root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        out.push(WorkspaceFile {
            name: entry.file_name().to_string_lossy().to_string(),
            path: path.display().to_string(),
            relative_path,
            kind,
        });
    }

    tracing::debug!(root = %root.display(), entries = out.len(), "scanned workspace");
    Ok(out)
}

fn is_skipped(entry: &DirEntry) -> bool {
    // The root itself may live under a hidden dir (e.g. a temp dir).
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || (entry.file_type().is_dir() && SKIPPED_DIRS.contains(&name.as_ref()))
}

/// Names of the files (not directories), in scan order.
pub fn file_names(entries: &[WorkspaceFile]) -> Vec<String> {
    entries
        .iter()
        .filter(|e| e.kind == EntryKind::File)
        .map(|e| e.name.clone())
        .collect()
}
